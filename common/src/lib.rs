//! Fragment Analysis Common Library
//!
//! CLIとデスクトップアプリで共有される型・表データ・集計ロジック

pub mod types;
pub mod layout;
pub mod error;
pub mod table;
pub mod decomposer;
pub mod aggregator;
pub mod export;

pub use types::{Category, CategoryFragmentStats, ColumnSelection, FragmentAnalysis, FragmentKey, FragmentStat, Row};
pub use error::{Error, Result};
pub use table::DataTable;
pub use decomposer::{Decomposition, FragmentRenderer, MoleculeDecomposer, TableDecomposer};
pub use aggregator::{aggregate, aggregate_decomposed, partition_by_category, percentage};

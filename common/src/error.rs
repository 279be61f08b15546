//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Decomposer error: {0}")]
    Decomposer(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

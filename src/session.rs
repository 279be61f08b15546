//! 解析セッション
//!
//! 1ユーザー・1アップロードの状態（読み込んだ表、選択列、集計結果、選択カテゴリ）を
//! 明示的なフィールドとして保持する。
//! 読み込み・解析で起きたエラーはここで受け止めて1つのメッセージにまとめ、
//! 中途半端な結果は残さない。セッションはそのまま再試行に使える。

use crate::error::{FragmentError, Result};
use crate::loader;
use fragment_analysis_common::{
    aggregate, Category, CategoryFragmentStats, ColumnSelection, DataTable, FragmentAnalysis,
    MoleculeDecomposer,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 表と列選択から集計を実行
pub fn run_analysis<D>(
    table: &DataTable,
    selection: &ColumnSelection,
    decomposer: &D,
) -> Result<FragmentAnalysis>
where
    D: MoleculeDecomposer + ?Sized,
{
    let rows = table.select_rows(selection)?;
    if rows.is_empty() {
        return Err(FragmentError::EmptyTable(format!(
            "{} / {}",
            selection.structure, selection.category
        )));
    }

    let mut analysis = aggregate(&rows, decomposer)?;
    analysis.selection = selection.clone();

    for category in &analysis.categories {
        debug!(
            category = %category.category,
            rows = category.total_rows,
            valid = category.valid_molecules,
            excluded = category.excluded_rows,
            fragments = category.stats.len(),
            "category aggregated"
        );
    }
    info!(
        categories = analysis.categories.len(),
        rows = analysis.total_rows(),
        excluded = analysis.excluded_rows(),
        "analysis complete"
    );

    Ok(analysis)
}

#[derive(Debug, Default)]
pub struct Session {
    source: Option<PathBuf>,
    table: Option<DataTable>,
    selection: Option<ColumnSelection>,
    analysis: Option<FragmentAnalysis>,
    selected_category: Option<Category>,
    error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルを読み込む。失敗時は表を破棄してエラーメッセージを残す
    pub fn load_file(&mut self, path: &Path, sheet: Option<&str>) -> bool {
        match loader::load_table(path, sheet) {
            Ok(table) => {
                self.set_table(table, Some(path.to_path_buf()));
                true
            }
            Err(e) => {
                self.source = None;
                self.table = None;
                self.reset_results();
                self.error = Some(e.to_string());
                false
            }
        }
    }

    /// 読み込み済みの表を設定（列選択は引き継ぐ）
    pub fn set_table(&mut self, table: DataTable, source: Option<PathBuf>) {
        self.table = Some(table);
        self.source = source;
        self.reset_results();
        self.error = None;
    }

    pub fn select_columns(&mut self, selection: ColumnSelection) {
        if self.selection.as_ref() != Some(&selection) {
            self.reset_results();
        }
        self.selection = Some(selection);
    }

    /// 現在の表・列選択で解析
    pub fn analyze<D>(&mut self, decomposer: &D) -> bool
    where
        D: MoleculeDecomposer + ?Sized,
    {
        self.reset_results();
        match self.try_analyze(decomposer) {
            Ok(analysis) => {
                self.selected_category = analysis.categories.first().map(|c| c.category.clone());
                self.analysis = Some(analysis);
                self.error = None;
                true
            }
            Err(e) => {
                self.error = Some(e.to_string());
                false
            }
        }
    }

    fn try_analyze<D>(&self, decomposer: &D) -> Result<FragmentAnalysis>
    where
        D: MoleculeDecomposer + ?Sized,
    {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| FragmentError::TableLoad("ファイルが読み込まれていません".into()))?;
        let selection = self
            .selection
            .as_ref()
            .ok_or_else(|| FragmentError::ColumnNotFound("列が選択されていません".into()))?;
        run_analysis(table, selection, decomposer)
    }

    pub fn select_category(&mut self, category: &Category) -> bool {
        let known = self
            .analysis
            .as_ref()
            .is_some_and(|a| a.get(category).is_some());
        if known {
            self.selected_category = Some(category.clone());
            self.error = None;
        } else {
            self.error = Some(FragmentError::CategoryNotFound(category.label().to_string()).to_string());
        }
        known
    }

    /// 選択中カテゴリの集計結果
    pub fn current_stats(&self) -> Option<&CategoryFragmentStats> {
        let category = self.selected_category.as_ref()?;
        self.analysis.as_ref()?.get(category)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn table(&self) -> Option<&DataTable> {
        self.table.as_ref()
    }

    pub fn selection(&self) -> Option<&ColumnSelection> {
        self.selection.as_ref()
    }

    pub fn analysis(&self) -> Option<&FragmentAnalysis> {
        self.analysis.as_ref()
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.selected_category.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn reset_results(&mut self) {
        self.analysis = None;
        self.selected_category = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragment_analysis_common::TableDecomposer;

    fn decomposer() -> TableDecomposer {
        TableDecomposer::new()
            .with("CCO", &["[1*]C", "[2*]O"])
            .with("CCN", &["[1*]C"])
    }

    fn table(csv: &str) -> DataTable {
        DataTable::from_csv_str(csv).unwrap()
    }

    #[test]
    fn test_analyze_and_select_category() {
        let mut session = Session::new();
        session.set_table(table("smiles,label\nCCO,a\nCCN,b\nxx,a\n"), None);
        session.select_columns(ColumnSelection::new("smiles", "label"));

        assert!(session.analyze(&decomposer()));
        assert!(session.error_message().is_none());

        // 先頭カテゴリが選ばれる
        assert_eq!(session.selected_category().unwrap().as_str(), "a");
        let stats = session.current_stats().unwrap();
        assert_eq!(stats.valid_molecules, 1);
        assert_eq!(stats.excluded_rows, 1);

        assert!(session.select_category(&Category::new("b")));
        assert_eq!(session.current_stats().unwrap().stats.len(), 1);
    }

    #[test]
    fn test_unknown_category_sets_error() {
        let mut session = Session::new();
        session.set_table(table("smiles,label\nCCO,a\n"), None);
        session.select_columns(ColumnSelection::new("smiles", "label"));
        session.analyze(&decomposer());

        assert!(!session.select_category(&Category::new("zzz")));
        assert!(session.error_message().unwrap().contains("zzz"));
        // 既存の選択は維持
        assert_eq!(session.selected_category().unwrap().as_str(), "a");
    }

    #[test]
    fn test_missing_column_after_reload() {
        let mut session = Session::new();
        session.set_table(table("smiles,label\nCCO,a\n"), None);
        session.select_columns(ColumnSelection::new("smiles", "label"));
        assert!(session.analyze(&decomposer()));

        // 列名が変わったファイルを読み込み直す
        session.set_table(table("SMILES,label\nCCO,a\n"), None);
        assert!(!session.analyze(&decomposer()));
        assert!(session.analysis().is_none());
        assert!(session.current_stats().is_none());
        assert!(session.error_message().unwrap().contains("smiles"));
    }

    #[test]
    fn test_analyze_without_table() {
        let mut session = Session::new();
        assert!(!session.analyze(&decomposer()));
        assert!(session.error_message().is_some());
    }

    #[test]
    fn test_empty_table_is_error() {
        let mut session = Session::new();
        session.set_table(table("smiles,label\n"), None);
        session.select_columns(ColumnSelection::new("smiles", "label"));
        assert!(!session.analyze(&decomposer()));
        assert!(session.analysis().is_none());
    }

    #[test]
    fn test_load_missing_file_keeps_session_usable() {
        let mut session = Session::new();
        assert!(!session.load_file(Path::new("/nonexistent/input.csv"), None));
        assert!(session.error_message().is_some());
        assert!(session.table().is_none());

        session.set_table(table("smiles,label\nCCO,a\n"), None);
        assert!(session.error_message().is_none());
        session.select_columns(ColumnSelection::new("smiles", "label"));
        assert!(session.analyze(&decomposer()));
    }

    #[test]
    fn test_changing_columns_clears_results() {
        let mut session = Session::new();
        session.set_table(table("smiles,label,other\nCCO,a,x\n"), None);
        session.select_columns(ColumnSelection::new("smiles", "label"));
        session.analyze(&decomposer());
        assert!(session.analysis().is_some());

        session.select_columns(ColumnSelection::new("smiles", "other"));
        assert!(session.analysis().is_none());
    }

    #[test]
    fn test_run_analysis_records_selection() {
        let t = table("smiles,label\nCCO,a\n");
        let selection = ColumnSelection::new("smiles", "label");
        let analysis = run_analysis(&t, &selection, &decomposer()).unwrap();
        assert_eq!(analysis.selection, selection);
    }
}

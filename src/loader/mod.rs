mod sheet;

use crate::error::{FragmentError, Result};
use fragment_analysis_common::DataTable;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// 入力ファイルの形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

const CSV_EXTENSIONS: &[&str] = &["csv"];
const TSV_EXTENSIONS: &[&str] = &["tsv", "tab", "txt"];
const SHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

impl TableFormat {
    /// 拡張子から形式を判定（大文字小文字は無視）
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        if CSV_EXTENSIONS.contains(&ext.as_str()) {
            Some(TableFormat::Csv)
        } else if TSV_EXTENSIONS.contains(&ext.as_str()) {
            Some(TableFormat::Tsv)
        } else if SHEET_EXTENSIONS.contains(&ext.as_str()) {
            Some(TableFormat::Spreadsheet)
        } else {
            None
        }
    }
}

/// 表ファイルを読み込む
///
/// `sheet` はスプレッドシートのみ有効（省略時は先頭シート）。
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<DataTable> {
    if !path.exists() {
        return Err(FragmentError::FileNotFound(path.display().to_string()));
    }

    let format = TableFormat::from_path(path)
        .ok_or_else(|| FragmentError::UnsupportedFormat(path.display().to_string()))?;

    let table = match format {
        TableFormat::Csv => load_delimited(path, b',')?,
        TableFormat::Tsv => load_delimited(path, b'\t')?,
        TableFormat::Spreadsheet => sheet::load_spreadsheet(path, sheet)?,
    };

    debug!(
        path = %path.display(),
        columns = table.headers().len(),
        rows = table.len(),
        "table loaded"
    );

    Ok(table)
}

fn load_delimited(path: &Path, delimiter: u8) -> Result<DataTable> {
    let file = File::open(path)?;
    let table = DataTable::from_delimited(BufReader::new(file), delimiter)?;
    Ok(table)
}

/// スプレッドシートのシート名一覧
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Spreadsheet) => sheet::sheet_names(path),
        _ => Ok(Vec::new()),
    }
}

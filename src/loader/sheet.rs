use crate::error::{FragmentError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use fragment_analysis_common::DataTable;
use std::path::Path;

pub fn load_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<DataTable> {
    let mut workbook = open_workbook_auto(path)?;

    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| FragmentError::TableLoad("シートがありません".into()))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| FragmentError::TableLoad(format!("シート '{}' を読めません: {}", name, e)))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(cell_to_string).collect())
        .unwrap_or_default();

    let records: Vec<Vec<String>> = rows
        .map(|cells| cells.iter().map(cell_to_string).collect())
        .collect();

    Ok(DataTable::from_records(header, records)?)
}

pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path)?;
    Ok(workbook.sheet_names())
}

/// セル値を文字列へ（整数値の浮動小数は小数点なしで表示）
pub(crate) fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

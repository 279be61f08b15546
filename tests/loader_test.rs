//! CSV/TSV/Excel読み込みの統合テスト

use fragment_analysis::error::FragmentError;
use fragment_analysis::loader::{self, TableFormat};
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tempfile::tempdir;

fn write_xlsx(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("molecules").unwrap();
    sheet.write_string(0, 0, "smiles").unwrap();
    sheet.write_string(0, 1, "class").unwrap();
    sheet.write_string(1, 0, "CCO").unwrap();
    sheet.write_number(1, 1, 1.0).unwrap();
    sheet.write_string(2, 0, "c1ccccc1").unwrap();
    sheet.write_number(2, 1, 2.5).unwrap();

    let other = workbook.add_worksheet();
    other.set_name("notes").unwrap();
    other.write_string(0, 0, "a").unwrap();
    other.write_string(0, 1, "b").unwrap();

    workbook.save(path).unwrap();
}

/// 同じ内容のCSVとExcelは同じ表になる
#[test]
fn test_csv_and_xlsx_load_identically() {
    let dir = tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("data.csv");
    let xlsx_path = dir.path().join("data.xlsx");

    std::fs::write(&csv_path, "smiles,class\nCCO,1\nc1ccccc1,2.5\n").unwrap();
    write_xlsx(&xlsx_path);

    let from_csv = loader::load_table(&csv_path, None).unwrap();
    let from_xlsx = loader::load_table(&xlsx_path, None).unwrap();

    assert_eq!(from_csv.headers(), from_xlsx.headers());
    assert_eq!(from_csv.rows(), from_xlsx.rows());
}

/// シート名の一覧と指定シートの読み込み
#[test]
fn test_sheet_selection() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("book.xlsx");
    write_xlsx(&path);

    assert_eq!(loader::sheet_names(&path).unwrap(), vec!["molecules", "notes"]);

    let notes = loader::load_table(&path, Some("notes")).unwrap();
    assert_eq!(notes.headers(), &["a".to_string(), "b".to_string()]);
    assert!(notes.is_empty());

    assert!(loader::load_table(&path, Some("missing")).is_err());
}

/// タブ区切り
#[test]
fn test_tsv_load() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("data.tsv");
    std::fs::write(&path, "smiles\tclass\nCC,O\ta\n").unwrap();

    assert_eq!(TableFormat::from_path(&path), Some(TableFormat::Tsv));
    let table = loader::load_table(&path, None).unwrap();
    assert_eq!(table.rows()[0], vec!["CC,O".to_string(), "a".to_string()]);
}

/// 存在しないファイル・未対応形式
#[test]
fn test_load_errors() {
    let err = loader::load_table(Path::new("/nonexistent/data.csv"), None).unwrap_err();
    assert!(matches!(err, FragmentError::FileNotFound(_)));

    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("data.parquet");
    std::fs::write(&path, "x").unwrap();
    let err = loader::load_table(&path, None).unwrap_err();
    assert!(matches!(err, FragmentError::UnsupportedFormat(_)));
}

/// 1列しかない表は読み込みエラー
#[test]
fn test_single_column_rejected() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("one.csv");
    std::fs::write(&path, "smiles\nCCO\n").unwrap();

    let err = loader::load_table(&path, None).unwrap_err();
    assert!(matches!(err, FragmentError::TableLoad(_)));
}

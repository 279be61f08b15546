//! 読み込みから集計までの統合テスト
//!
//! 実RDKitの代わりに固定表の分解器を使う。

use fragment_analysis::error::FragmentError;
use fragment_analysis::loader;
use fragment_analysis::session::{run_analysis, Session};
use fragment_analysis_common::{Category, ColumnSelection, TableDecomposer};
use tempfile::tempdir;

fn decomposer() -> TableDecomposer {
    TableDecomposer::new()
        .with("CC(=O)Oc1ccccc1C(=O)O", &["[1*]C(C)=O", "[3*]O[3*]", "[16*]c1ccccc1[16*]"])
        .with("CC(=O)Nc1ccc(O)cc1", &["[1*]C(C)=O", "[5*]N[5*]", "[16*]c1ccc(O)cc1"])
        .with("c1ccccc1", &["c1ccccc1"])
}

fn write_csv(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("molecules.csv");
    std::fs::write(&path, content).expect("CSV書き込み失敗");
    (dir, path)
}

/// 有効2件・無効1件（カテゴリ X / Y）
#[test]
fn test_two_valid_one_invalid() {
    let (_dir, path) = write_csv(
        "smiles,activity\n\
         CC(=O)Oc1ccccc1C(=O)O,X\n\
         CC(=O)Nc1ccc(O)cc1,X\n\
         not_a_molecule,Y\n",
    );
    let table = loader::load_table(&path, None).unwrap();
    let analysis = run_analysis(&table, &ColumnSelection::new("smiles", "activity"), &decomposer()).unwrap();

    assert_eq!(analysis.category_list(), vec![&Category::new("X"), &Category::new("Y")]);

    let x = analysis.find("X").unwrap();
    assert_eq!(x.valid_molecules, 2);
    assert_eq!(x.stats[0].fragment.as_str(), "[1*]C(C)=O");
    assert_eq!(x.stats[0].frequency, 2);
    assert!((x.stats[0].percentage - 100.0).abs() < 1e-9);
    for stat in &x.stats[1..] {
        assert_eq!(stat.frequency, 1);
        assert!((stat.percentage - 50.0).abs() < 1e-9);
    }

    let y = analysis.find("Y").unwrap();
    assert!(y.stats.is_empty());
    assert_eq!(y.total_rows, 1);
    assert_eq!(y.excluded_rows, 1);
}

/// カテゴリ全件が無効でも例外にならない
#[test]
fn test_all_invalid_category() {
    let (_dir, path) = write_csv("smiles,group\n???,A\n,A\nc1ccccc1,B\n");
    let table = loader::load_table(&path, None).unwrap();
    let analysis = run_analysis(&table, &ColumnSelection::new("smiles", "group"), &decomposer()).unwrap();

    let a = analysis.find("A").unwrap();
    assert!(a.is_empty());
    assert_eq!(a.valid_molecules, 0);
    assert_eq!(a.excluded_rows, 2);

    let b = analysis.find("B").unwrap();
    assert_eq!(b.len(), 1);
    assert!((b.stats[0].percentage - 100.0).abs() < 1e-9);
}

/// 列名が変わったファイルを再読み込みするとエラーになり、結果は残らない
#[test]
fn test_reload_without_selected_column() {
    let dir = tempdir().expect("Failed to create temp dir");
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    std::fs::write(&first, "smiles,activity\nc1ccccc1,X\n").unwrap();
    std::fs::write(&second, "structure,activity\nc1ccccc1,X\n").unwrap();

    let mut session = Session::new();
    assert!(session.load_file(&first, None));
    session.select_columns(ColumnSelection::new("smiles", "activity"));
    assert!(session.analyze(&decomposer()));
    assert!(session.current_stats().is_some());

    assert!(session.load_file(&second, None));
    assert!(!session.analyze(&decomposer()));
    assert!(session.analysis().is_none());
    assert!(session.current_stats().is_none());
    let message = session.error_message().unwrap();
    assert!(message.contains("smiles"), "message: {}", message);
}

/// 頻度は降順、割合は有効分子数に対する百分率
#[test]
fn test_ordering_and_percentages() {
    let (_dir, path) = write_csv(
        "smiles,activity\n\
         c1ccccc1,X\n\
         CC(=O)Nc1ccc(O)cc1,X\n\
         CC(=O)Oc1ccccc1C(=O)O,X\n\
         bogus,X\n\
         c1ccccc1,X\n",
    );
    let table = loader::load_table(&path, None).unwrap();
    let analysis = run_analysis(&table, &ColumnSelection::new("smiles", "activity"), &decomposer()).unwrap();
    let x = analysis.find("X").unwrap();

    assert_eq!(x.valid_molecules, 4);
    assert_eq!(x.excluded_rows, 1);
    for pair in x.stats.windows(2) {
        assert!(pair[0].frequency >= pair[1].frequency);
    }
    for stat in &x.stats {
        let expected = 100.0 * stat.frequency as f64 / 4.0;
        assert!((stat.percentage - expected).abs() < 1e-9);
    }
    // 同数の [1*]C(C)=O と c1ccccc1 は先に現れた方が上
    assert_eq!(x.stats[0].fragment.as_str(), "c1ccccc1");
    assert_eq!(x.stats[1].fragment.as_str(), "[1*]C(C)=O");
}

/// データ行のない表は解析エラー
#[test]
fn test_header_only_table() {
    let (_dir, path) = write_csv("smiles,activity\n");
    let table = loader::load_table(&path, None).unwrap();
    let err = run_analysis(&table, &ColumnSelection::new("smiles", "activity"), &decomposer()).unwrap_err();
    assert!(matches!(err, FragmentError::EmptyTable(_)));
}

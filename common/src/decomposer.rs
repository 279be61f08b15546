//! 分子分解器・描画器のインターフェース
//!
//! BRICS分解そのものは外部ツールキットに委譲する。
//! 集計ロジックはこのトレイト越しにしか分解器を呼ばないため、
//! テストでは決定的な偽の分解器を差し込める。

use crate::error::Result;
use crate::types::FragmentKey;
use std::collections::{BTreeSet, HashMap};

/// 1分子の分解結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decomposition {
    /// 分解成功（分子ごとに集合として扱う）
    Fragments(BTreeSet<FragmentKey>),
    /// 構造文字列を解釈できない
    InvalidStructure,
    /// 構造は読めたが分解中に失敗した
    Failed(String),
}

impl Decomposition {
    pub fn fragments<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Decomposition::Fragments(keys.into_iter().map(|k| FragmentKey::new(k)).collect())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Decomposition::Fragments(_))
    }
}

/// 分子分解器
pub trait MoleculeDecomposer: Sync {
    /// 1分子を分解する
    fn decompose(&self, structure: &str) -> Decomposition;

    /// 入力順を保ったまま全分子を分解する
    ///
    /// 既定実装は1行ずつ [`decompose`](Self::decompose) を呼ぶ。
    /// プロセス起動などの固定コストがある実装はまとめて処理するために上書きする。
    /// `Err` は行単位ではなく解析全体の失敗を意味する。
    fn decompose_all(&self, structures: &[&str]) -> Result<Vec<Decomposition>> {
        Ok(structures.iter().map(|s| self.decompose(s)).collect())
    }
}

/// フラグメント描画器（PNGバイト列を返す）
pub trait FragmentRenderer {
    /// 各フラグメントを描画する。描画できないものは `None`
    fn render_all(&self, fragments: &[FragmentKey], width: u32, height: u32) -> Result<Vec<Option<Vec<u8>>>>;
}

/// 対応表による分解器（テスト・デモ用）
///
/// 表にない構造は [`Decomposition::InvalidStructure`] になる。
#[derive(Debug, Clone, Default)]
pub struct TableDecomposer {
    entries: HashMap<String, Vec<String>>,
}

impl TableDecomposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, structure: &str, fragments: &[&str]) -> Self {
        self.entries.insert(
            structure.to_string(),
            fragments.iter().map(|f| f.to_string()).collect(),
        );
        self
    }
}

impl MoleculeDecomposer for TableDecomposer {
    fn decompose(&self, structure: &str) -> Decomposition {
        match self.entries.get(structure.trim()) {
            Some(fragments) => Decomposition::fragments(fragments.iter().cloned()),
            None => Decomposition::InvalidStructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_decomposer_known_and_unknown() {
        let decomposer = TableDecomposer::new().with("CCO", &["[1*]C", "[2*]O"]);
        assert!(decomposer.decompose("CCO").is_valid());
        assert!(decomposer.decompose(" CCO ").is_valid());
        assert_eq!(decomposer.decompose("xx"), Decomposition::InvalidStructure);
    }

    #[test]
    fn test_fragments_are_a_set() {
        let d = Decomposition::fragments(["[1*]C", "[1*]C", "[2*]O"]);
        match d {
            Decomposition::Fragments(set) => assert_eq!(set.len(), 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decompose_all_keeps_order() {
        let decomposer = TableDecomposer::new().with("C", &["C"]).with("N", &["N"]);
        let out = decomposer.decompose_all(&["N", "bad", "C"]).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Decomposition::fragments(["N"]));
        assert_eq!(out[1], Decomposition::InvalidStructure);
        assert_eq!(out[2], Decomposition::fragments(["C"]));
    }
}

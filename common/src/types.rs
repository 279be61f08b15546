//! 型定義

use serde::{Deserialize, Serialize};
use std::fmt;

/// カテゴリ値（目的変数列のセル値を表示文字列に正規化したもの）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 表示用ラベル（空セルは "(blank)"）
    pub fn label(&self) -> &str {
        if self.0.is_empty() { "(blank)" } else { &self.0 }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// フラグメントの正規表現（分解器が返すSMILES文字列そのもの）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentKey(String);

impl FragmentKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FragmentKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 入力1行（構造列・カテゴリ列のみ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub structure: String,
    pub category: Category,
}

impl Row {
    pub fn new(structure: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            structure: structure.into(),
            category: Category::new(category),
        }
    }
}

/// 選択された列名
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSelection {
    pub structure: String,
    pub category: String,
}

impl ColumnSelection {
    pub fn new(structure: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            structure: structure.into(),
            category: category.into(),
        }
    }
}

/// フラグメント1件の集計値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentStat {
    pub fragment: FragmentKey,
    pub frequency: usize,
    pub percentage: f64,
}

/// カテゴリごとの集計結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFragmentStats {
    pub category: Category,
    /// 頻度の降順（同数は初出順）
    pub stats: Vec<FragmentStat>,
    /// カテゴリ内の全行数
    pub total_rows: usize,
    /// 構造を解釈できた分子数（百分率の分母）
    pub valid_molecules: usize,
    /// 解釈できず除外した行数
    pub excluded_rows: usize,
}

impl CategoryFragmentStats {
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }
}

/// 解析結果全体（カテゴリは初出順）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentAnalysis {
    #[serde(default)]
    pub selection: ColumnSelection,
    pub categories: Vec<CategoryFragmentStats>,
}

impl FragmentAnalysis {
    /// カテゴリ一覧（集計時の順序）
    pub fn category_list(&self) -> Vec<&Category> {
        self.categories.iter().map(|c| &c.category).collect()
    }

    pub fn get(&self, category: &Category) -> Option<&CategoryFragmentStats> {
        self.categories.iter().find(|c| &c.category == category)
    }

    /// 表示ラベルまたは生の値でカテゴリを検索
    pub fn find(&self, name: &str) -> Option<&CategoryFragmentStats> {
        self.categories
            .iter()
            .find(|c| c.category.as_str() == name)
            .or_else(|| self.categories.iter().find(|c| c.category.label() == name))
    }

    pub fn total_rows(&self) -> usize {
        self.categories.iter().map(|c| c.total_rows).sum()
    }

    pub fn excluded_rows(&self) -> usize {
        self.categories.iter().map(|c| c.excluded_rows).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

//! 結果表のレイアウト定義
//!
//! CLI表示・デスクトップ表示・Excel出力で同じ列定義を使う。

use crate::types::FragmentStat;

/// 結果表の列
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultColumn {
    pub key: &'static str,
    pub label: &'static str,
    /// Excel列幅（文字数単位）
    pub width: f64,
}

pub const FRAGMENTS: ResultColumn = ResultColumn { key: "fragment", label: "FRAGMENTS", width: 48.0 };
pub const FREQUENCY: ResultColumn = ResultColumn { key: "frequency", label: "FREQUENCY", width: 12.0 };
pub const PERCENTAGE: ResultColumn = ResultColumn { key: "percentage", label: "PERCENTAGE", width: 12.0 };

/// 数値列の並び
pub const RESULT_COLUMNS: [ResultColumn; 3] = [FRAGMENTS, FREQUENCY, PERCENTAGE];

/// CSV出力などで先頭に付くカテゴリ列
pub const CATEGORY_LABEL: &str = "CATEGORY";

/// 画像列の見出し
pub const IMAGE_LABEL: &str = "IMAGE";

/// 百分率の小数桁数
pub const PERCENTAGE_DECIMALS: usize = 2;

/// プレビュー行数の既定値
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// サムネイルの既定サイズ(px)
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 120;

/// 百分率を表示用に整形
pub fn format_percentage(value: f64) -> String {
    format!("{:.*}", PERCENTAGE_DECIMALS, value)
}

/// 列キーに対応するセル文字列
pub fn cell_text(stat: &FragmentStat, key: &str) -> String {
    match key {
        "fragment" => stat.fragment.to_string(),
        "frequency" => stat.frequency.to_string(),
        "percentage" => format_percentage(stat.percentage),
        _ => String::new(),
    }
}

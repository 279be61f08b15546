//! Excel生成（共通ライブラリ）
//!
//! layout.rs の列定義を使い、集計サマリ＋カテゴリごとのシートを生成する。
//! 各フラグメント行の先頭列にサムネイル画像を埋め込む。

use crate::layout::{CATEGORY_LABEL, IMAGE_LABEL, RESULT_COLUMNS};
use crate::types::{CategoryFragmentStats, FragmentAnalysis, FragmentKey};
use rust_xlsxwriter::*;
use std::collections::HashSet;

/// 画像データ（バイト配列）
pub struct ImageData {
    pub data: Vec<u8>,
    pub extension: String, // "png"
}

/// ワークブック生成オプション
#[derive(Debug, Clone)]
pub struct ExcelOptions {
    pub title: String,
    /// 生成日時（表示用文字列）
    pub generated_at: String,
    /// サムネイル一辺(px)
    pub thumbnail_size: u32,
}

const SUMMARY_SHEET: &str = "Summary";
const MAX_SHEET_NAME: usize = 31;
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Excelをバッファに生成
///
/// # Arguments
/// * `analysis` - 集計結果
/// * `options` - タイトル・サムネイルサイズ
/// * `image_loader` - フラグメント画像を取得するクロージャ (fragment -> Option<ImageData>)
pub fn generate_excel_buffer<F>(
    analysis: &FragmentAnalysis,
    options: &ExcelOptions,
    image_loader: F,
) -> Result<Vec<u8>, String>
where
    F: Fn(&FragmentKey) -> Option<ImageData>,
{
    let mut workbook = Workbook::new();

    let title_format = Format::new().set_bold().set_font_size(14.0);

    let header_format = Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_font_color(Color::RGB(0x333333))
        .set_background_color(Color::RGB(0xF0F0F0))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let text_format = Format::new()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let count_format = Format::new()
        .set_align(FormatAlign::VerticalCenter)
        .set_num_format("0")
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let percent_format = Format::new()
        .set_align(FormatAlign::VerticalCenter)
        .set_num_format("0.00")
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let image_cell_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xCCCCCC));

    // サマリシート
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SUMMARY_SHEET)
            .map_err(|e| format!("シート名設定エラー: {}", e))?;

        sheet.write_string_with_format(0, 0, options.title.as_str(), &title_format)
            .map_err(|e| format!("タイトル書き込みエラー: {}", e))?;
        sheet.write_string(1, 0, &format!("生成日時: {}", options.generated_at))
            .map_err(|e| format!("日時書き込みエラー: {}", e))?;
        sheet.write_string(
            2,
            0,
            &format!(
                "構造列: {} / カテゴリ列: {}",
                analysis.selection.structure, analysis.selection.category
            ),
        )
        .map_err(|e| format!("列情報書き込みエラー: {}", e))?;

        let headers = [CATEGORY_LABEL, "ROWS", "VALID", "EXCLUDED", "DISTINCT FRAGMENTS"];
        for (col, label) in headers.iter().enumerate() {
            sheet.write_string_with_format(4, col as u16, *label, &header_format)
                .map_err(|e| format!("見出し書き込みエラー: {}", e))?;
            sheet.set_column_width(col as u16, if col == 0 { 24.0 } else { 18.0 })
                .map_err(|e| format!("列幅設定エラー: {}", e))?;
        }

        for (i, category) in analysis.categories.iter().enumerate() {
            let row = 5 + i as u32;
            sheet.write_string_with_format(row, 0, category.category.label(), &text_format)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
            let numbers = [
                category.total_rows,
                category.valid_molecules,
                category.excluded_rows,
                category.stats.len(),
            ];
            for (offset, value) in numbers.iter().enumerate() {
                sheet.write_number_with_format(row, 1 + offset as u16, *value as f64, &count_format)
                    .map_err(|e| format!("値書き込みエラー: {}", e))?;
            }
        }
    }

    // カテゴリごとのシート
    let mut used_names: HashSet<String> = HashSet::new();
    used_names.insert(SUMMARY_SHEET.to_lowercase());

    let row_height_px = options.thumbnail_size + 8;
    let image_col_px = options.thumbnail_size + 12;

    for (index, category) in analysis.categories.iter().enumerate() {
        let sheet_name = unique_sheet_name(category, index, &mut used_names);
        let sheet = workbook.add_worksheet();
        sheet.set_name(&sheet_name)
            .map_err(|e| format!("シート名設定エラー: {}", e))?;

        sheet.set_column_width_pixels(0, image_col_px)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
        for (i, column) in RESULT_COLUMNS.iter().enumerate() {
            sheet.set_column_width(1 + i as u16, column.width)
                .map_err(|e| format!("列幅設定エラー: {}", e))?;
        }

        sheet.write_string_with_format(0, 0, IMAGE_LABEL, &header_format)
            .map_err(|e| format!("見出し書き込みエラー: {}", e))?;
        for (i, column) in RESULT_COLUMNS.iter().enumerate() {
            sheet.write_string_with_format(0, 1 + i as u16, column.label, &header_format)
                .map_err(|e| format!("見出し書き込みエラー: {}", e))?;
        }
        sheet.set_freeze_panes(1, 0)
            .map_err(|e| format!("ウィンドウ枠固定エラー: {}", e))?;

        if category.stats.is_empty() {
            sheet.write_string(1, 1, "(有効な分子がありません)")
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
            continue;
        }

        for (i, stat) in category.stats.iter().enumerate() {
            let row = 1 + i as u32;
            sheet.set_row_height_pixels(row, row_height_px)
                .map_err(|e| format!("行高さ設定エラー: {}", e))?;

            sheet.write_blank(row, 0, &image_cell_format)
                .map_err(|e| format!("セル書き込みエラー: {}", e))?;

            // 画像埋め込み（描画できないフラグメントは空欄のまま）
            if let Some(image_data) = image_loader(&stat.fragment) {
                let image = Image::new_from_buffer(&image_data.data)
                    .map_err(|e| format!("画像読み込みエラー: {}", e))?
                    .set_object_movement(ObjectMovement::DontMoveOrSizeWithCells);

                sheet.insert_image_with_offset(row, 0, &image, 4, 4)
                    .map_err(|e| format!("画像埋め込みエラー: {}", e))?;
            }

            sheet.write_string_with_format(row, 1, stat.fragment.as_str(), &text_format)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
            sheet.write_number_with_format(row, 2, stat.frequency as f64, &count_format)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
            sheet.write_number_with_format(row, 3, stat.percentage, &percent_format)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
        }
    }

    // バッファに書き出し
    workbook.save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}

/// Excelのシート名制約（31文字・禁止文字・大文字小文字無視の重複不可）を満たす名前を作る
pub fn unique_sheet_name(
    category: &CategoryFragmentStats,
    index: usize,
    used: &mut HashSet<String>,
) -> String {
    let cleaned: String = category
        .category
        .label()
        .chars()
        .filter(|c| !INVALID_SHEET_CHARS.contains(c))
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    let base = if cleaned.is_empty() {
        format!("Category {}", index + 1)
    } else {
        cleaned
    };

    let mut candidate: String = base.chars().take(MAX_SHEET_NAME).collect();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({})", n);
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }

    used.insert(candidate.to_lowercase());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, FragmentStat};

    fn category(name: &str) -> CategoryFragmentStats {
        CategoryFragmentStats {
            category: Category::new(name),
            stats: vec![FragmentStat {
                fragment: FragmentKey::new("[1*]C"),
                frequency: 1,
                percentage: 100.0,
            }],
            total_rows: 1,
            valid_molecules: 1,
            excluded_rows: 0,
        }
    }

    #[test]
    fn test_sheet_name_strips_invalid_chars() {
        let mut used = HashSet::new();
        assert_eq!(unique_sheet_name(&category("a/b:c"), 0, &mut used), "abc");
    }

    #[test]
    fn test_sheet_name_truncated() {
        let mut used = HashSet::new();
        let name = unique_sheet_name(&category(&"x".repeat(40)), 0, &mut used);
        assert_eq!(name.chars().count(), 31);
    }

    #[test]
    fn test_sheet_name_deduplicated_case_insensitive() {
        let mut used = HashSet::new();
        used.insert("summary".to_string());
        assert_eq!(unique_sheet_name(&category("SUMMARY"), 0, &mut used), "SUMMARY (2)");
        assert_eq!(unique_sheet_name(&category("x"), 1, &mut used), "x");
        assert_eq!(unique_sheet_name(&category("X"), 2, &mut used), "X (2)");
    }

    #[test]
    fn test_sheet_name_blank_category() {
        let mut used = HashSet::new();
        // "(blank)" ラベルはそのまま使える
        assert_eq!(unique_sheet_name(&category(""), 4, &mut used), "(blank)");
        assert_eq!(unique_sheet_name(&category("***"), 5, &mut used), "Category 6");
    }

    #[test]
    fn test_generate_buffer_without_images() {
        let analysis = FragmentAnalysis {
            categories: vec![category("active"), CategoryFragmentStats {
                stats: vec![],
                valid_molecules: 0,
                excluded_rows: 1,
                ..category("inactive")
            }],
            ..Default::default()
        };
        let options = ExcelOptions {
            title: "Fragment Analysis".into(),
            generated_at: "2026-01-01 00:00".into(),
            thumbnail_size: 100,
        };
        let buffer = generate_excel_buffer(&analysis, &options, |_| None).unwrap();
        // xlsx は zip
        assert!(buffer.starts_with(b"PK"));
    }
}

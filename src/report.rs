//! 端末向けのテキスト表

use fragment_analysis_common::layout::{cell_text, CATEGORY_LABEL, RESULT_COLUMNS};
use fragment_analysis_common::{CategoryFragmentStats, DataTable, FragmentAnalysis};
use std::fmt::Write;

/// 表示幅（全角は2として数える）
fn display_width(s: &str) -> usize {
    s.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

fn pad(s: &str, width: usize) -> String {
    let w = display_width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(display_width(cell));
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(headers));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", line(&rule));
    for row in rows {
        let _ = writeln!(out, "{}", line(row));
    }
    out
}

/// 読み込んだ表の列名と先頭n行
pub fn format_preview(table: &DataTable, n: usize) -> String {
    let rows: Vec<Vec<String>> = table.head(n).to_vec();
    let mut out = render_grid(table.headers(), &rows);
    let _ = writeln!(out, "({}行 × {}列)", table.len(), table.headers().len());
    out
}

/// 1カテゴリの集計表
pub fn format_category(stats: &CategoryFragmentStats) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} ({}行, 有効 {}, 除外 {})",
        CATEGORY_LABEL, stats.category, stats.total_rows, stats.valid_molecules, stats.excluded_rows
    );

    if stats.is_empty() {
        let _ = writeln!(out, "  (有効な分子がありません)");
        return out;
    }

    let headers: Vec<String> = RESULT_COLUMNS.iter().map(|c| c.label.to_string()).collect();
    let rows: Vec<Vec<String>> = stats
        .stats
        .iter()
        .map(|s| RESULT_COLUMNS.iter().map(|c| cell_text(s, c.key)).collect())
        .collect();
    out.push_str(&render_grid(&headers, &rows));
    out
}

/// 全カテゴリの集計表
pub fn format_analysis(analysis: &FragmentAnalysis) -> String {
    analysis
        .categories
        .iter()
        .map(format_category)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragment_analysis_common::{Category, FragmentKey, FragmentStat};

    #[test]
    fn test_format_category() {
        let stats = CategoryFragmentStats {
            category: Category::new("active"),
            stats: vec![FragmentStat {
                fragment: FragmentKey::new("[1*]C"),
                frequency: 2,
                percentage: 200.0 / 3.0,
            }],
            total_rows: 4,
            valid_molecules: 3,
            excluded_rows: 1,
        };
        let text = format_category(&stats);
        assert!(text.contains("active"));
        assert!(text.contains("FRAGMENTS"));
        assert!(text.contains("[1*]C"));
        assert!(text.contains("66.67"));
    }

    #[test]
    fn test_format_empty_category() {
        let stats = CategoryFragmentStats {
            category: Category::new(""),
            stats: vec![],
            total_rows: 2,
            valid_molecules: 0,
            excluded_rows: 2,
        };
        let text = format_category(&stats);
        assert!(text.contains("(blank)"));
        assert!(text.contains("有効な分子がありません"));
    }

    #[test]
    fn test_format_preview_counts_rows() {
        let table = DataTable::from_csv_str("a,b\n1,2\n3,4\n5,6\n").unwrap();
        let text = format_preview(&table, 2);
        assert!(text.contains("(3行 × 2列)"));
        assert!(!text.contains('5'));
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("分子"), 4);
    }
}

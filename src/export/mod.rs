pub mod excel;

use crate::cli::ExportFormat;
use crate::error::Result;
use fragment_analysis_common::layout::{format_percentage, CATEGORY_LABEL, RESULT_COLUMNS};
use fragment_analysis_common::{FragmentAnalysis, FragmentRenderer};
use std::path::{Path, PathBuf};

/// 出力先がディレクトリ（または拡張子なし）なら `title.ext` を付ける
fn output_path_for_format(output: &Path, title: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", title, extension))
    } else {
        output.to_path_buf()
    }
}

/// 全形式出力用のパス（ファイル指定時は同じステムで拡張子違い）
fn output_paths_for_all(output: &Path, title: &str) -> [PathBuf; 3] {
    let (dir, stem) = if output.is_dir() || output.extension().is_none() {
        (output.to_path_buf(), title.to_string())
    } else {
        let parent = output.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(title)
            .to_string();
        (parent, stem)
    };
    ["json", "csv", "xlsx"].map(|ext| dir.join(format!("{}.{}", stem, ext)))
}

/// JSONで保存
pub fn write_json(analysis: &FragmentAnalysis, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(analysis)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// 縦持ちCSV（CATEGORY, FRAGMENTS, FREQUENCY, PERCENTAGE）で保存
pub fn write_csv(analysis: &FragmentAnalysis, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![CATEGORY_LABEL];
    header.extend(RESULT_COLUMNS.iter().map(|c| c.label));
    writer.write_record(&header)?;

    for category in &analysis.categories {
        for stat in &category.stats {
            writer.write_record([
                category.category.as_str().to_string(),
                stat.fragment.to_string(),
                stat.frequency.to_string(),
                format_percentage(stat.percentage),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// 解析結果を指定形式で出力し、書き出したパスを返す
pub fn export_results(
    analysis: &FragmentAnalysis,
    format: &ExportFormat,
    output: &Path,
    title: &str,
    renderer: Option<&dyn FragmentRenderer>,
    thumbnail_size: u32,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    match format {
        ExportFormat::Json => {
            let path = output_path_for_format(output, title, "json");
            write_json(analysis, &path)?;
            written.push(path);
        }
        ExportFormat::Csv => {
            let path = output_path_for_format(output, title, "csv");
            write_csv(analysis, &path)?;
            written.push(path);
        }
        ExportFormat::Excel => {
            let path = output_path_for_format(output, title, "xlsx");
            excel::generate_excel(analysis, &path, title, renderer, thumbnail_size)?;
            written.push(path);
        }
        ExportFormat::All => {
            let [json_path, csv_path, excel_path] = output_paths_for_all(output, title);
            write_json(analysis, &json_path)?;
            write_csv(analysis, &csv_path)?;
            excel::generate_excel(analysis, &excel_path, title, renderer, thumbnail_size)?;
            written.extend([json_path, csv_path, excel_path]);
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_for_file() {
        let path = output_path_for_format(Path::new("/tmp/out/result.xlsx"), "t", "xlsx");
        assert_eq!(path, PathBuf::from("/tmp/out/result.xlsx"));
    }

    #[test]
    fn test_output_path_for_extensionless() {
        let path = output_path_for_format(Path::new("/nonexistent/out"), "report", "csv");
        assert_eq!(path, PathBuf::from("/nonexistent/out/report.csv"));
    }

    #[test]
    fn test_output_paths_for_all_with_file() {
        let [json, csv, xlsx] = output_paths_for_all(Path::new("/tmp/x/result.json"), "t");
        assert_eq!(json, PathBuf::from("/tmp/x/result.json"));
        assert_eq!(csv, PathBuf::from("/tmp/x/result.csv"));
        assert_eq!(xlsx, PathBuf::from("/tmp/x/result.xlsx"));
    }
}

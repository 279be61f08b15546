//! Excel生成（CLI版）
//!
//! 共通ライブラリの excel_core にフラグメント画像を渡して書き出す。

use crate::depict::{depict_fragments, Thumbnail};
use crate::error::{FragmentError, Result};
use fragment_analysis_common::export::excel_core::{generate_excel_buffer, ExcelOptions, ImageData};
use fragment_analysis_common::{FragmentAnalysis, FragmentKey, FragmentRenderer};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

/// 全カテゴリに現れるフラグメント（初出順・重複なし）
pub fn distinct_fragments(analysis: &FragmentAnalysis) -> Vec<FragmentKey> {
    let mut seen = HashSet::new();
    analysis
        .categories
        .iter()
        .flat_map(|c| c.stats.iter())
        .filter(|s| seen.insert(&s.fragment))
        .map(|s| s.fragment.clone())
        .collect()
}

pub fn generate_excel(
    analysis: &FragmentAnalysis,
    output_path: &Path,
    title: &str,
    renderer: Option<&dyn FragmentRenderer>,
    thumbnail_size: u32,
) -> Result<()> {
    let images: HashMap<FragmentKey, Vec<u8>> = match renderer {
        Some(renderer) => {
            let fragments = distinct_fragments(analysis);
            depict_fragments(renderer, &fragments, thumbnail_size)
                .into_iter()
                .filter_map(|thumb| encode(&thumb).map(|png| (thumb.fragment, png)))
                .collect()
        }
        None => HashMap::new(),
    };

    let options = ExcelOptions {
        title: title.to_string(),
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        thumbnail_size,
    };

    let buffer = generate_excel_buffer(analysis, &options, |fragment| {
        images.get(fragment).map(|png| ImageData {
            data: png.clone(),
            extension: "png".to_string(),
        })
    })
    .map_err(FragmentError::ExcelGeneration)?;

    std::fs::write(output_path, buffer)
        .map_err(|e| FragmentError::ExcelGeneration(format!("保存エラー: {}", e)))?;

    Ok(())
}

fn encode(thumb: &Thumbnail) -> Option<Vec<u8>> {
    match thumb.to_png() {
        Ok(png) => Some(png),
        Err(e) => {
            warn!(fragment = %thumb.fragment, "thumbnail encode failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragment_analysis_common::{Category, CategoryFragmentStats, FragmentStat};

    fn stat(fragment: &str) -> FragmentStat {
        FragmentStat {
            fragment: FragmentKey::new(fragment),
            frequency: 1,
            percentage: 100.0,
        }
    }

    #[test]
    fn test_distinct_fragments_first_seen() {
        let analysis = FragmentAnalysis {
            categories: vec![
                CategoryFragmentStats {
                    category: Category::new("a"),
                    stats: vec![stat("x"), stat("y")],
                    total_rows: 1,
                    valid_molecules: 1,
                    excluded_rows: 0,
                },
                CategoryFragmentStats {
                    category: Category::new("b"),
                    stats: vec![stat("y"), stat("z")],
                    total_rows: 1,
                    valid_molecules: 1,
                    excluded_rows: 0,
                },
            ],
            ..Default::default()
        };
        let names: Vec<String> = distinct_fragments(&analysis).iter().map(|f| f.to_string()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }
}

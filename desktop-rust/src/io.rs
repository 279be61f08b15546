use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use fragment_analysis::cli::ExportFormat;
use fragment_analysis::config::Config;
use fragment_analysis::export;
use fragment_analysis::rdkit::RdkitBridge;
use fragment_analysis_common::{FragmentAnalysis, FragmentRenderer};

use crate::model::ExportKind;

pub fn load_config() -> Result<Config> {
    let path = Config::config_path()?;
    Config::load().with_context(|| format!("read {}", path.display()))
}

pub fn export_analysis(
    analysis: &FragmentAnalysis,
    kind: ExportKind,
    path: &Path,
    config: &Config,
) -> Result<Vec<PathBuf>> {
    let format = match kind {
        ExportKind::Json => ExportFormat::Json,
        ExportKind::Csv => ExportFormat::Csv,
        ExportKind::Excel => ExportFormat::Excel,
    };
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("fragment_analysis")
        .to_string();
    let bridge = RdkitBridge::from_config(config);

    export::export_results(
        analysis,
        &format,
        path,
        &title,
        Some(&bridge as &dyn FragmentRenderer),
        config.thumbnail_size,
    )
    .with_context(|| format!("write {}", path.display()))
}

pub fn default_export_path(source: Option<&Path>, kind: ExportKind) -> PathBuf {
    let stem = source
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("result");
    let file_name = format!("{stem}_fragments.{}", kind.extension());
    match source {
        Some(path) => path.with_file_name(file_name),
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_export_path() {
        let path = default_export_path(Some(Path::new("/data/set1.csv")), ExportKind::Excel);
        assert_eq!(path, PathBuf::from("/data/set1_fragments.xlsx"));
        assert_eq!(default_export_path(None, ExportKind::Csv), PathBuf::from("result_fragments.csv"));
    }
}

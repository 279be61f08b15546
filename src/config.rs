use crate::error::{FragmentError, Result};
use fragment_analysis_common::layout::{DEFAULT_PREVIEW_ROWS, DEFAULT_THUMBNAIL_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Python実行ファイルを上書きする環境変数
pub const PYTHON_ENV: &str = "FRAGMENT_ANALYSIS_PYTHON";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RDKitが入っているPython
    pub python: String,
    /// 並列に起動するブリッジプロセス数
    pub workers: usize,
    pub thumbnail_size: u32,
    pub preview_rows: usize,
    /// BRICS: 最小フラグメントサイズ
    pub min_fragment_size: u32,
    /// BRICS: 葉以外の中間フラグメントも残す
    pub keep_non_leaf_nodes: bool,
    /// BRICS: 1段だけ切断する
    pub single_pass: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FragmentError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("fragment-analysis").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            python: default_python().into(),
            workers: 1,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            min_fragment_size: 1,
            keep_non_leaf_nodes: false,
            single_pass: false,
        }
    }

    /// 使用するPython（環境変数を優先）
    pub fn python_command(&self) -> String {
        if let Ok(python) = std::env::var(PYTHON_ENV) {
            if !python.trim().is_empty() {
                return python;
            }
        }
        self.python.clone()
    }

    pub fn set_python(&mut self, python: String) -> Result<()> {
        if python.trim().is_empty() {
            return Err(FragmentError::Config("Pythonのパスが空です".into()));
        }
        self.python = python;
        self.save()
    }

    pub fn set_workers(&mut self, workers: usize) -> Result<()> {
        if workers == 0 {
            return Err(FragmentError::Config("workers は1以上を指定してください".into()));
        }
        self.workers = workers;
        self.save()
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

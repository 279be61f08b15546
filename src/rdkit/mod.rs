//! RDKit連携モジュール
//!
//! Python上のRDKitを子プロセスとして呼び出し、BRICS分解とフラグメント描画を行う。
//! リクエストはJSONで標準入力へ、結果はJSONで標準出力から受け取る。
//! 複数ワーカー指定時は入力を連続したチャンクに分けて並列実行し、
//! 入力順のまま結合する。

use crate::config::Config;
use crate::error::{FragmentError, Result};
use base64::Engine;
use fragment_analysis_common::{Decomposition, FragmentKey, FragmentRenderer, MoleculeDecomposer};
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

const BRIDGE_SCRIPT: &str = include_str!("bridge.py");

/// 1プロセスに渡す最大行数
const CHUNK_ROWS: usize = 500;

/// BRICS分解のオプション
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BricsOptions {
    pub min_fragment_size: u32,
    pub keep_non_leaf_nodes: bool,
    pub single_pass: bool,
}

impl Default for BricsOptions {
    fn default() -> Self {
        Self {
            min_fragment_size: 1,
            keep_non_leaf_nodes: false,
            single_pass: false,
        }
    }
}

#[derive(Serialize)]
struct DecomposeRequest<'a> {
    structures: &'a [&'a str],
    #[serde(flatten)]
    options: &'a BricsOptions,
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    fragments: Vec<&'a str>,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct BridgeResponse<T> {
    results: T,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
#[allow(dead_code)]
enum DecomposeEntry {
    Fragments { fragments: Vec<String> },
    Invalid { invalid: bool },
    Error { error: String },
}

impl From<DecomposeEntry> for Decomposition {
    fn from(entry: DecomposeEntry) -> Self {
        match entry {
            DecomposeEntry::Fragments { fragments } => Decomposition::fragments(fragments),
            DecomposeEntry::Invalid { .. } => Decomposition::InvalidStructure,
            DecomposeEntry::Error { error } => Decomposition::Failed(error),
        }
    }
}

/// RDKitブリッジ
#[derive(Clone)]
pub struct RdkitBridge {
    python: String,
    workers: usize,
    options: BricsOptions,
    progress: Option<ProgressBar>,
}

impl RdkitBridge {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            workers: 1,
            options: BricsOptions::default(),
            progress: None,
        }
    }

    /// 設定ファイルの値から構築
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.python_command())
            .with_workers(config.workers)
            .with_options(BricsOptions {
                min_fragment_size: config.min_fragment_size,
                keep_non_leaf_nodes: config.keep_non_leaf_nodes,
                single_pass: config.single_pass,
            })
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_options(mut self, options: BricsOptions) -> Self {
        self.options = options;
        self
    }

    /// チャンク完了ごとに進捗バーを進める
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    /// RDKitのバージョンを取得（疎通確認）
    pub fn version(&self) -> Result<String> {
        let stdout = self.run_bridge("version", None)?;
        let response: BridgeResponse<String> = serde_json::from_slice(&stdout)
            .map_err(|e| FragmentError::BridgeParse(e.to_string()))?;
        Ok(response.results)
    }

    /// 全構造を分解（入力順を保持）
    pub fn decompose_batch(&self, structures: &[&str]) -> Result<Vec<Decomposition>> {
        if structures.is_empty() {
            return Ok(Vec::new());
        }

        let chunks: Vec<&[&str]> = structures.chunks(chunk_size(structures.len(), self.workers)).collect();

        if let Some(progress) = &self.progress {
            progress.set_length(chunks.len() as u64);
        }
        debug!(
            rows = structures.len(),
            chunks = chunks.len(),
            workers = self.workers,
            "decompose start"
        );

        let results = self.run_chunks(&chunks);

        // 失敗時もバーを残さない
        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }

        merge_chunks(results?)
    }

    fn run_chunks(&self, chunks: &[&[&str]]) -> Result<Vec<Result<Vec<Decomposition>>>> {
        if self.workers == 1 || chunks.len() == 1 {
            return Ok(chunks.iter().map(|chunk| self.decompose_chunk(chunk)).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| FragmentError::Bridge(format!("ワーカー生成エラー: {}", e)))?;
        Ok(pool.install(|| chunks.par_iter().map(|chunk| self.decompose_chunk(chunk)).collect()))
    }

    fn decompose_chunk(&self, chunk: &[&str]) -> Result<Vec<Decomposition>> {
        let request = DecomposeRequest {
            structures: chunk,
            options: &self.options,
        };
        let body = serde_json::to_vec(&request)?;
        let stdout = self.run_bridge("decompose", Some(&body))?;
        let decompositions = parse_decompose_response(&stdout, chunk.len())?;

        if let Some(progress) = &self.progress {
            progress.inc(1);
        }

        Ok(decompositions)
    }

    /// フラグメントをPNGに描画（描画できないものは None）
    pub fn render_batch(&self, fragments: &[FragmentKey], width: u32, height: u32) -> Result<Vec<Option<Vec<u8>>>> {
        if fragments.is_empty() {
            return Ok(Vec::new());
        }

        let request = RenderRequest {
            fragments: fragments.iter().map(|f| f.as_str()).collect(),
            width,
            height,
        };
        let body = serde_json::to_vec(&request)?;
        let stdout = self.run_bridge("render", Some(&body))?;
        parse_render_response(&stdout, fragments.len())
    }

    fn run_bridge(&self, mode: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.python)
            .arg("-c")
            .arg(BRIDGE_SCRIPT)
            .arg(mode)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FragmentError::Bridge(format!("{} を起動できません: {}", self.python, e)))?;

        // stdin を閉じてEOFを伝える（起動直後に落ちた場合は stderr を優先して報告）
        let mut write_result = Ok(());
        if let Some(mut stdin) = child.stdin.take() {
            if let Some(body) = body {
                write_result = stdin.write_all(body);
            }
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FragmentError::Bridge(format!(
                "{} {} failed (code {:?}): {}",
                self.python,
                mode,
                output.status.code(),
                last_line(&stderr)
            )));
        }
        write_result?;

        Ok(output.stdout)
    }
}

impl MoleculeDecomposer for RdkitBridge {
    fn decompose(&self, structure: &str) -> Decomposition {
        match self.decompose_batch(&[structure]) {
            Ok(mut results) if results.len() == 1 => results.remove(0),
            Ok(_) => Decomposition::Failed("unexpected bridge output".into()),
            Err(e) => Decomposition::Failed(e.to_string()),
        }
    }

    fn decompose_all(&self, structures: &[&str]) -> fragment_analysis_common::Result<Vec<Decomposition>> {
        self.decompose_batch(structures)
            .map_err(|e| fragment_analysis_common::Error::Decomposer(e.to_string()))
    }
}

impl FragmentRenderer for RdkitBridge {
    fn render_all(&self, fragments: &[FragmentKey], width: u32, height: u32) -> fragment_analysis_common::Result<Vec<Option<Vec<u8>>>> {
        self.render_batch(fragments, width, height)
            .map_err(|e| fragment_analysis_common::Error::Decomposer(e.to_string()))
    }
}

/// decompose モードの応答を解析
fn parse_decompose_response(stdout: &[u8], expected: usize) -> Result<Vec<Decomposition>> {
    let response: BridgeResponse<Vec<DecomposeEntry>> = serde_json::from_slice(stdout)
        .map_err(|e| FragmentError::BridgeParse(e.to_string()))?;

    if response.results.len() != expected {
        return Err(FragmentError::BridgeParse(format!(
            "結果件数が一致しません (期待 {}件, 実際 {}件)",
            expected,
            response.results.len()
        )));
    }

    Ok(response.results.into_iter().map(Decomposition::from).collect())
}

/// render モードの応答を解析（base64を復号できないものは None）
fn parse_render_response(stdout: &[u8], expected: usize) -> Result<Vec<Option<Vec<u8>>>> {
    let response: BridgeResponse<Vec<Option<String>>> = serde_json::from_slice(stdout)
        .map_err(|e| FragmentError::BridgeParse(e.to_string()))?;

    if response.results.len() != expected {
        return Err(FragmentError::BridgeParse(format!(
            "結果件数が一致しません (期待 {}件, 実際 {}件)",
            expected,
            response.results.len()
        )));
    }

    Ok(response
        .results
        .into_iter()
        .map(|encoded| {
            let encoded = encoded?;
            match base64::engine::general_purpose::STANDARD.decode(encoded.as_bytes()) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("invalid base64 image from bridge: {}", e);
                    None
                }
            }
        })
        .collect())
}

/// チャンクあたりの行数（ワーカー数で等分し、上限は CHUNK_ROWS）
fn chunk_size(rows: usize, workers: usize) -> usize {
    rows.div_ceil(workers.max(1)).clamp(1, CHUNK_ROWS)
}

/// チャンクの結果を入力順に連結する。最初の失敗を返す
fn merge_chunks<T>(results: Vec<Result<Vec<T>>>) -> Result<Vec<T>> {
    let mut merged = Vec::new();
    for result in results {
        merged.extend(result?);
    }
    Ok(merged)
}

fn last_line(stderr: &str) -> &str {
    stderr.trim().lines().last().unwrap_or("")
}

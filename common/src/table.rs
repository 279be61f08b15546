//! 表データモジュール
//!
//! アップロードされた表をヘッダー＋文字列セルとして保持する。
//! CSV文字列からの読み込みもここで行い、スプレッドシートは
//! 呼び出し側がセルを文字列化してから [`DataTable::from_records`] に渡す。

use crate::error::{Error, Result};
use crate::types::{ColumnSelection, Row};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Read;

/// 表全体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// ヘッダー行とデータ行から構築
    ///
    /// - 空のヘッダーは `Unnamed: <列番号>` に置き換える
    /// - 重複したヘッダーには `.1`, `.2` … を付ける
    /// - 列数が足りない行は空セルで埋め、余分なセルは捨てる
    pub fn from_records<I, R, S>(header: Vec<String>, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if header.is_empty() || header.iter().all(|h| h.trim().is_empty()) {
            return Err(Error::InvalidTable("ヘッダー行がありません".into()));
        }
        if header.len() < 2 {
            return Err(Error::InvalidTable(format!(
                "列が2つ以上必要です (検出: {}列)",
                header.len()
            )));
        }

        let headers = normalize_headers(header);
        let width = headers.len();

        let rows = records
            .into_iter()
            .map(|record| {
                let mut cells: Vec<String> = record.into_iter().map(Into::into).take(width).collect();
                cells.resize(width, String::new());
                cells
            })
            .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
            .collect();

        Ok(Self { headers, rows })
    }

    /// 区切り文字付きテキストから読み込み
    pub fn from_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let header: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(|c| c.to_string()).collect::<Vec<_>>());
        }

        Self::from_records(header, records)
    }

    /// CSV文字列から読み込み
    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_delimited(content.as_bytes(), b',')
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 列名から列番号を取得
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// 先頭n行（プレビュー用）
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// 選択された2列だけを取り出して集計用の行に変換
    pub fn select_rows(&self, selection: &ColumnSelection) -> Result<Vec<Row>> {
        let structure = self.column_index(&selection.structure)?;
        let category = self.column_index(&selection.category)?;

        Ok(self
            .rows
            .iter()
            .map(|cells| Row::new(cells[structure].trim(), cells[category].trim()))
            .collect())
    }
}

/// ヘッダー名の正規化
///
/// 付けた接尾辞が既存の列名と衝突する場合は番号を進める。
fn normalize_headers(header: Vec<String>) -> Vec<String> {
    let bases: Vec<String> = header
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim();
            if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut emitted: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(bases.len());

    for base in bases {
        let unique = if emitted.contains(&base) {
            let count = counts.entry(base.clone()).or_insert(0);
            loop {
                *count += 1;
                let candidate = format!("{}.{}", base, count);
                if !emitted.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base
        };
        emitted.insert(unique.clone());
        headers.push(unique);
    }

    headers
}

use fragment_analysis_common::{DataTable, FragmentKey};

/// 構造列・カテゴリ列の選択（列名）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnChoice {
    pub structure: Option<String>,
    pub category: Option<String>,
}

impl ColumnChoice {
    /// 未選択の欄だけを新しい表の先頭列で埋める
    ///
    /// 選択済みの列名は表になくても書き換えない。解析時に列なしエラーになる。
    pub fn fit_to(&mut self, table: &DataTable) {
        let headers = table.headers();
        if self.structure.is_none() {
            self.structure = headers.first().cloned();
        }
        if self.category.is_none() {
            self.category = headers
                .iter()
                .find(|h| Some(*h) != self.structure.as_ref())
                .cloned();
        }
    }

    /// 表に存在しない選択済みの列名
    pub fn missing_in(&self, table: &DataTable) -> Vec<String> {
        [&self.structure, &self.category]
            .into_iter()
            .flatten()
            .filter(|name| table.column_index(name).is_err())
            .cloned()
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.structure.is_some() && self.category.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportKind {
    Json,
    Csv,
    #[default]
    Excel,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Json => "json",
            ExportKind::Csv => "csv",
            ExportKind::Excel => "xlsx",
        }
    }
}

pub enum UiMessage {
    ExportDone { message: String },
}

pub struct ThumbData {
    pub fragment: FragmentKey,
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}

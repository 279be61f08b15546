use thiserror::Error;

#[derive(Error, Debug)]
pub enum FragmentError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("対応していないファイル形式です: {0} (csv/tsv/txt/xlsx/xlsm/xls/ods)")]
    UnsupportedFormat(String),

    #[error("表の読み込みに失敗: {0}")]
    TableLoad(String),

    #[error("列が見つかりません: {0}")]
    ColumnNotFound(String),

    #[error("表にデータ行がありません: {0}")]
    EmptyTable(String),

    #[error("カテゴリが見つかりません: {0}")]
    CategoryNotFound(String),

    #[error("解析エラー: {0}")]
    Analysis(String),

    #[error("RDKitブリッジの実行に失敗: {0}")]
    Bridge(String),

    #[error("RDKitブリッジの応答を解析できません: {0}")]
    BridgeParse(String),

    #[error("画像生成エラー: {0}")]
    ImageRender(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("スプレッドシート読み込みエラー: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

impl From<fragment_analysis_common::Error> for FragmentError {
    fn from(err: fragment_analysis_common::Error) -> Self {
        use fragment_analysis_common::Error as E;
        match err {
            E::Csv(e) => FragmentError::Csv(e),
            E::InvalidTable(msg) => FragmentError::TableLoad(msg),
            E::ColumnNotFound(name) => FragmentError::ColumnNotFound(name),
            E::Decomposer(msg) => FragmentError::Analysis(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, FragmentError>;

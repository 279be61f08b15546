use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fragment-analysis")]
#[command(about = "BRICSフラグメント集計ツール（カテゴリ別の出現頻度）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 列名と先頭行を表示
    Columns {
        /// 入力ファイル（csv/tsv/xlsx など）
        #[arg(required = true)]
        input: PathBuf,

        /// シート名（スプレッドシートのみ、省略時は先頭シート）
        #[arg(long)]
        sheet: Option<String>,
    },

    /// フラグメントを集計して表示
    Analyze {
        /// 入力ファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 構造（SMILES）列
        #[arg(short = 's', long = "structure-col")]
        structure: String,

        /// カテゴリ列
        #[arg(short = 'c', long = "category-col")]
        category: String,

        /// 表示するカテゴリ（省略時は全カテゴリ）
        #[arg(long = "category")]
        category_value: Option<String>,

        /// シート名
        #[arg(long)]
        sheet: Option<String>,

        /// 結果JSONの保存先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 並列ワーカー数（省略時は設定値）
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// 集計結果をJSON/CSV/Excelに出力
    Export {
        /// 入力ファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 構造（SMILES）列
        #[arg(short = 's', long = "structure-col")]
        structure: String,

        /// カテゴリ列
        #[arg(short = 'c', long = "category-col")]
        category: String,

        /// シート名
        #[arg(long)]
        sheet: Option<String>,

        /// 出力形式 (json/csv/excel/all)
        #[arg(short, long, default_value = "excel")]
        format: ExportFormat,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// サムネイルの一辺（px、省略時は設定値）
        #[arg(long)]
        thumb_size: Option<u32>,

        /// ドキュメントタイトル
        #[arg(short, long, default_value = "fragment_analysis")]
        title: String,

        /// 並列ワーカー数（省略時は設定値）
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// 対話モード（ファイル選択→列選択→カテゴリ表示を繰り返す）
    Interactive,

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// RDKitが入ったPythonを設定
        #[arg(long)]
        set_python: Option<String>,

        /// 並列ワーカー数を設定
        #[arg(long)]
        set_workers: Option<usize>,
    },

    /// Python/RDKitの疎通確認
    Doctor,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    #[default]
    Excel,
    All,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "all" => Ok(ExportFormat::All),
            _ => Err(format!("Unknown format: {}. Use json, csv, excel, or all", s)),
        }
    }
}

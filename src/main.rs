use clap::Parser;
use fragment_analysis::{cli, config, error, export, interactive, loader, rdkit, report, session};
use cli::{Cli, Commands};
use config::Config;
use error::{FragmentError, Result};
use fragment_analysis_common::{ColumnSelection, FragmentAnalysis, FragmentRenderer};
use indicatif::{ProgressBar, ProgressStyle};
use rdkit::RdkitBridge;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Columns { input, sheet } => {
            let table = loader::load_table(&input, sheet.as_deref())?;
            if let Ok(names) = loader::sheet_names(&input) {
                println!("シート: {}\n", names.join(", "));
            }
            println!("{}", report::format_preview(&table, config.preview_rows));
        }

        Commands::Analyze { input, structure, category, category_value, sheet, output, workers } => {
            println!("🧪 fragment-analysis - フラグメント集計\n");

            let selection = ColumnSelection::new(structure, category);
            let (analysis, _) = load_and_analyze(&input, sheet.as_deref(), &selection, &config, workers)?;

            println!("[3/3] 結果\n");
            match category_value {
                Some(value) => {
                    let stats = analysis
                        .find(&value)
                        .ok_or_else(|| FragmentError::CategoryNotFound(value.clone()))?;
                    println!("{}", report::format_category(stats));
                }
                None => println!("{}", report::format_analysis(&analysis)),
            }

            if let Some(output) = output {
                export::write_json(&analysis, &output)?;
                println!("✔ 結果を保存: {}", output.display());
            }
        }

        Commands::Export { input, structure, category, sheet, format, output, thumb_size, title, workers } => {
            println!("📄 fragment-analysis - エクスポート\n");

            let selection = ColumnSelection::new(structure, category);
            let (analysis, bridge) = load_and_analyze(&input, sheet.as_deref(), &selection, &config, workers)?;

            println!("[3/3] 出力中...");
            let output_dir = output.unwrap_or_else(|| default_output_dir(&input));
            let thumb_size = thumb_size.unwrap_or(config.thumbnail_size);
            let written = export::export_results(
                &analysis,
                &format,
                &output_dir,
                &title,
                Some(&bridge as &dyn FragmentRenderer),
                thumb_size,
            )?;
            for path in &written {
                println!("✔ {}", path.display());
            }

            println!("\n✅ エクスポート完了");
        }

        Commands::Interactive => {
            println!("🧪 fragment-analysis - 対話モード\n");
            interactive::run_interactive(&config)?;
        }

        Commands::Config { show, set_python, set_workers } => {
            let mut config = config;

            if let Some(python) = set_python {
                config.set_python(python)?;
                println!("✔ Pythonを設定しました");
            }

            if let Some(workers) = set_workers {
                config.set_workers(workers)?;
                println!("✔ ワーカー数を設定しました");
            }

            if show {
                println!("設定:");
                println!("  パス: {}", Config::config_path()?.display());
                println!("  Python: {}", config.python_command());
                println!("  ワーカー数: {}", config.workers);
                println!("  サムネイル: {}px", config.thumbnail_size);
                println!("  プレビュー行数: {}", config.preview_rows);
                println!(
                    "  BRICS: min_fragment_size={}, keep_non_leaf_nodes={}, single_pass={}",
                    config.min_fragment_size, config.keep_non_leaf_nodes, config.single_pass
                );
            }
        }

        Commands::Doctor => {
            let bridge = RdkitBridge::from_config(&config);
            println!("Python: {}", bridge.python());
            match bridge.version() {
                Ok(version) => println!("✔ RDKit {}", version),
                Err(e) => {
                    println!("❌ {}", e);
                    println!("  RDKitの入ったPythonを `config --set-python` か環境変数 {} で指定してください", config::PYTHON_ENV);
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 読み込み→分解・集計（[1/3], [2/3]）
fn load_and_analyze(
    input: &Path,
    sheet: Option<&str>,
    selection: &ColumnSelection,
    config: &Config,
    workers: Option<usize>,
) -> Result<(FragmentAnalysis, RdkitBridge)> {
    println!("[1/3] ファイルを読み込み中...");
    let table = loader::load_table(input, sheet)?;
    println!("✔ {}行を読み込み\n", table.len());

    println!("[2/3] BRICS分解中...");
    let progress = decompose_progress();
    let mut bridge = RdkitBridge::from_config(config).with_progress(progress.clone());
    if let Some(workers) = workers {
        bridge = bridge.with_workers(workers);
    }

    let analysis = session::run_analysis(&table, selection, &bridge);
    if analysis.is_err() {
        progress.abandon();
    }
    let analysis = analysis?;
    println!(
        "✔ {}カテゴリ / 除外 {}行\n",
        analysis.categories.len(),
        analysis.excluded_rows()
    );

    Ok((analysis, bridge))
}

fn decompose_progress() -> ProgressBar {
    let progress = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("  [{bar:30}] {pos}/{len} chunks {elapsed}") {
        progress.set_style(style.progress_chars("=>-"));
    }
    progress
}

fn default_output_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

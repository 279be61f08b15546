//! 対話モード
//!
//! ファイル → 構造列・カテゴリ列 → カテゴリ の順に選び、集計表を表示する。
//! 途中のエラーは表示してループを続ける（セッションは再利用可能）。

use crate::config::Config;
use crate::error::{FragmentError, Result};
use crate::rdkit::RdkitBridge;
use crate::report;
use crate::session::Session;
use dialoguer::{Confirm, Input, Select};
use fragment_analysis_common::{ColumnSelection, DataTable, FragmentAnalysis};
use std::path::PathBuf;

/// カテゴリ選択肢（表示ラベル）
pub fn category_items(analysis: &FragmentAnalysis) -> Vec<String> {
    analysis.categories.iter().map(|c| c.category.label().to_string()).collect()
}

/// カテゴリ列の初期候補（構造列と別の列）
pub fn default_category_index(table: &DataTable, structure_index: usize) -> usize {
    if structure_index == 0 && table.headers().len() > 1 {
        1
    } else {
        0
    }
}

/// セッションのエラーメッセージを取り出して消す（表示はそのまま）
fn take_error(session: &mut Session) -> String {
    let message = session.error_message().unwrap_or_default().to_string();
    session.clear_error();
    message
}

fn prompt_err(e: dialoguer::Error) -> FragmentError {
    FragmentError::Prompt(e.to_string())
}

pub fn run_interactive(config: &Config) -> Result<()> {
    let mut session = Session::new();

    loop {
        if let Err(e) = run_once(&mut session, config) {
            // 入力そのものが壊れた場合は続行できない
            if matches!(e, FragmentError::Prompt(_)) {
                return Err(e);
            }
            println!("❌ {}\n", e);
        }

        let again = Confirm::new()
            .with_prompt("続けますか？")
            .default(true)
            .interact()
            .map_err(prompt_err)?;
        if !again {
            break;
        }
        println!();
    }

    Ok(())
}

fn run_once(session: &mut Session, config: &Config) -> Result<()> {
    let default_path = session
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let path: String = Input::new()
        .with_prompt("入力ファイル (csv/tsv/xlsx)")
        .with_initial_text(default_path)
        .interact_text()
        .map_err(prompt_err)?;
    let path = PathBuf::from(path.trim());

    if !session.load_file(&path, None) {
        println!("❌ {}\n", take_error(session));
        return Ok(());
    }

    let Some(table) = session.table() else {
        return Ok(());
    };
    println!("\n{}", report::format_preview(table, config.preview_rows));

    let headers = table.headers().to_vec();
    let structure_index = Select::new()
        .with_prompt("構造（SMILES）列")
        .items(&headers)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let category_index = Select::new()
        .with_prompt("カテゴリ列")
        .items(&headers)
        .default(default_category_index(table, structure_index))
        .interact()
        .map_err(prompt_err)?;

    session.select_columns(ColumnSelection::new(
        headers[structure_index].clone(),
        headers[category_index].clone(),
    ));

    println!("解析中...");
    let bridge = RdkitBridge::from_config(config);
    if !session.analyze(&bridge) {
        println!("❌ {}\n", take_error(session));
        return Ok(());
    }

    let Some(analysis) = session.analysis() else {
        return Ok(());
    };
    let items = category_items(analysis);
    let categories: Vec<_> = analysis.categories.iter().map(|c| c.category.clone()).collect();

    loop {
        let index = Select::new()
            .with_prompt("カテゴリ")
            .items(&items)
            .default(0)
            .interact()
            .map_err(prompt_err)?;
        session.select_category(&categories[index]);

        if let Some(stats) = session.current_stats() {
            println!("\n{}", report::format_category(stats));
        }

        let other = Confirm::new()
            .with_prompt("別のカテゴリを表示しますか？")
            .default(false)
            .interact()
            .map_err(prompt_err)?;
        if !other {
            break;
        }
    }

    Ok(())
}

//! フラグメント集計（CLI/デスクトップ共通）
//!
//! カテゴリごとに分子を分解し、フラグメントの出現頻度と
//! 「有効分子数に対する百分率」を求める。

use crate::decomposer::{Decomposition, MoleculeDecomposer};
use crate::error::{Error, Result};
use crate::types::{Category, CategoryFragmentStats, FragmentAnalysis, FragmentKey, FragmentStat, Row};
use std::collections::HashMap;

/// 百分率を計算（分母0は呼び出し側で除外済み）
pub fn percentage(frequency: usize, valid_molecules: usize) -> f64 {
    100.0 * frequency as f64 / valid_molecules as f64
}

/// 行をカテゴリの初出順に分割（各要素は行インデックス）
pub fn partition_by_category(rows: &[Row]) -> Vec<(Category, Vec<usize>)> {
    let mut order: Vec<(Category, Vec<usize>)> = Vec::new();
    let mut index: HashMap<&Category, usize> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        match index.get(&row.category) {
            Some(&slot) => order[slot].1.push(i),
            None => {
                index.insert(&row.category, order.len());
                order.push((row.category.clone(), vec![i]));
            }
        }
    }

    order
}

/// 全行を集計
///
/// 分解器は1行につき1回（まとめて1バッチ）呼ばれる。
/// 解釈できない行・分解に失敗した行はフラグメントにも分母にも数えない。
pub fn aggregate<D>(rows: &[Row], decomposer: &D) -> Result<FragmentAnalysis>
where
    D: MoleculeDecomposer + ?Sized,
{
    let structures: Vec<&str> = rows.iter().map(|r| r.structure.as_str()).collect();
    let decompositions = decomposer.decompose_all(&structures)?;
    aggregate_decomposed(rows, &decompositions)
}

/// 分解済みの結果から集計（`decompositions[i]` は `rows[i]` に対応）
pub fn aggregate_decomposed(rows: &[Row], decompositions: &[Decomposition]) -> Result<FragmentAnalysis> {
    if decompositions.len() != rows.len() {
        return Err(Error::Decomposer(format!(
            "分解結果の件数が一致しません (入力 {}件, 結果 {}件)",
            rows.len(),
            decompositions.len()
        )));
    }

    let categories = partition_by_category(rows)
        .into_iter()
        .map(|(category, indices)| {
            let outcomes: Vec<&Decomposition> = indices.iter().map(|&i| &decompositions[i]).collect();
            category_stats(category, &outcomes)
        })
        .collect();

    Ok(FragmentAnalysis {
        categories,
        ..Default::default()
    })
}

/// 1カテゴリ分の集計
fn category_stats(category: Category, outcomes: &[&Decomposition]) -> CategoryFragmentStats {
    // フラグメント → (頻度, 初出位置)
    let mut counts: HashMap<&FragmentKey, (usize, usize)> = HashMap::new();
    let mut valid_molecules = 0;
    let mut seen = 0;

    for outcome in outcomes {
        let Decomposition::Fragments(fragments) = outcome else {
            continue;
        };
        valid_molecules += 1;
        for fragment in fragments {
            let entry = counts.entry(fragment).or_insert((0, seen));
            entry.0 += 1;
            seen += 1;
        }
    }

    let mut ranked: Vec<(&FragmentKey, usize, usize)> = counts
        .into_iter()
        .map(|(fragment, (frequency, first_seen))| (fragment, frequency, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let stats = if valid_molecules == 0 {
        Vec::new()
    } else {
        ranked
            .into_iter()
            .map(|(fragment, frequency, _)| FragmentStat {
                fragment: fragment.clone(),
                frequency,
                percentage: percentage(frequency, valid_molecules),
            })
            .collect()
    };

    CategoryFragmentStats {
        category,
        stats,
        total_rows: outcomes.len(),
        valid_molecules,
        excluded_rows: outcomes.len() - valid_molecules,
    }
}

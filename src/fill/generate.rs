//! FILENAME: src/fill/generate.rs
//! PURPOSE: Generates fill-series values from a detected pattern, and
//! adjusts relative cell references in copied-down formulas.
//! CONTEXT: Formula reference adjustment scans tokens matching
//! `(\$?)([A-Za-z]+)(\$?)(\d+)`; a `$` before the column or row component
//! anchors that component so it does not shift.

use regex::Regex;
use std::sync::OnceLock;

use crate::cell::CellValue;
use crate::coord::{col_to_index, index_to_col};
use crate::fill::pattern::DetectedPattern;

fn reference_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\$?)([A-Za-z]+)(\$?)(\d+)").expect("static regex is valid"))
}

/// Generates `count` values continuing `pattern`, not including the seed
/// values it was detected from. For 0-based target index `i` the source
/// index is `i mod sourceLength` and the absolute position fed to the
/// numeric/text formulas is `sourceLength + i` — the seed values themselves
/// occupy positions `0..sourceLength`.
pub fn generate_values(pattern: &DetectedPattern, count: usize, custom_lists: &[Vec<String>]) -> Vec<CellValue> {
    match pattern {
        DetectedPattern::Linear { start, step, len } => {
            (0..count).map(|i| CellValue::Number(start + step * (len + i) as f64)).collect()
        }
        DetectedPattern::Geometric { start, ratio, len } => {
            (0..count).map(|i| CellValue::Number(start * ratio.powi((len + i) as i32))).collect()
        }
        DetectedPattern::CustomList { list_index, start_offset, source_casing } => {
            let list = match custom_lists.get(*list_index) {
                Some(list) if !list.is_empty() => list,
                _ => return vec![CellValue::Empty; count],
            };
            let len = source_casing.len().max(1);
            (0..count)
                .map(|i| {
                    let item = &list[(start_offset + len + i) % list.len()];
                    let casing = source_casing.get(i % len).copied().unwrap_or(crate::fill::pattern::Casing::Verbatim);
                    CellValue::String(casing.apply(item))
                })
                .collect()
        }
        DetectedPattern::TextWithNumber { prefix, start, step, width, suffix, len } => {
            let width = *width;
            (0..count)
                .map(|i| {
                    CellValue::String(format!(
                        "{}{:0width$}{}",
                        prefix,
                        start + step * (len + i) as i64,
                        suffix,
                        width = width
                    ))
                })
                .collect()
        }
        DetectedPattern::Copy => vec![CellValue::Empty; count],
    }
}

/// Adjusts every relative cell reference in `formula` by `(row_delta,
/// col_delta)`, leaving `$`-anchored components untouched.
pub fn adjust_formula_references(formula: &str, col_delta: i64, row_delta: i64) -> String {
    reference_token_regex()
        .replace_all(formula, |caps: &regex::Captures| {
            let col_anchor = &caps[1];
            let col_str = &caps[2];
            let row_anchor = &caps[3];
            let row_str = &caps[4];

            let new_col = if col_anchor == "$" {
                col_str.to_string()
            } else {
                let idx = (col_to_index(col_str) as i64 + col_delta).max(0);
                index_to_col(idx as u32)
            };

            let new_row = if row_anchor == "$" {
                row_str.to_string()
            } else {
                let row_num: i64 = row_str.parse().unwrap_or(0);
                let adjusted = (row_num + row_delta).max(1);
                adjusted.to_string()
            };

            format!("{}{}{}{}", col_anchor, new_col, row_anchor, new_row)
        })
        .to_string()
}

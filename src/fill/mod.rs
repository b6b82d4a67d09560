//! FILENAME: src/fill/mod.rs
//! PURPOSE: The fill-pattern engine: detect a pattern from a seed range and
//! extend it across a target range, one column or row series at a time.

pub mod generate;
pub mod pattern;

pub use generate::{adjust_formula_references, generate_values};
pub use pattern::{detect_pattern, DetectedPattern};

use crate::cell::{Cell, CellValue};
use crate::config::EngineConfig;
use crate::coord::CellRange;

/// Direction a fill handle was dragged, which decides whether the series
/// continues along rows or down columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillDirection {
    Down,
    Up,
    Right,
    Left,
}

impl FillDirection {
    fn is_vertical(self) -> bool {
        matches!(self, FillDirection::Down | FillDirection::Up)
    }
}

/// One generated fill result: the target coordinate and the `Cell` to
/// write there (a formula copy keeps `formula` populated with adjusted
/// references; a value series populates `value` only).
#[derive(Debug, Clone, PartialEq)]
pub struct FillResult {
    pub row: u32,
    pub col: u32,
    pub cell: Cell,
}

/// Fills `target` by extending the series found in `seed_range`, analyzing
/// one column (for a vertical drag) or one row (for a horizontal drag) at a
/// time.
pub fn fill_range(
    seed_range: &CellRange,
    target: &CellRange,
    direction: FillDirection,
    get_cell: impl Fn(u32, u32) -> Option<Cell>,
    config: &EngineConfig,
) -> Vec<FillResult> {
    let mut results = Vec::new();

    if direction.is_vertical() {
        for col in seed_range.start_col..=seed_range.end_col {
            let seed: Vec<Cell> = (seed_range.start_row..=seed_range.end_row)
                .map(|row| get_cell(row, col).unwrap_or_default())
                .collect();
            let target_rows: Vec<u32> = (target.start_row..=target.end_row)
                .filter(|r| *r < seed_range.start_row || *r > seed_range.end_row)
                .collect();
            results.extend(fill_series(&seed, &target_rows, col, true, config));
        }
    } else {
        for row in seed_range.start_row..=seed_range.end_row {
            let seed: Vec<Cell> = (seed_range.start_col..=seed_range.end_col)
                .map(|col| get_cell(row, col).unwrap_or_default())
                .collect();
            let target_cols: Vec<u32> = (target.start_col..=target.end_col)
                .filter(|c| *c < seed_range.start_col || *c > seed_range.end_col)
                .collect();
            results.extend(fill_series(&seed, &target_cols, row, false, config));
        }
    }

    results
}

fn fill_series(seed: &[Cell], target_indices: &[u32], fixed_index: u32, vertical: bool, config: &EngineConfig) -> Vec<FillResult> {
    if seed.iter().any(|c| c.formula.is_some()) {
        let template = seed
            .iter()
            .find_map(|c| c.formula.clone())
            .expect("checked formula presence above");
        return target_indices
            .iter()
            .enumerate()
            .map(|(i, &idx)| {
                let delta = (i as i64 + 1) * step_sign(seed.len());
                let adjusted = if vertical {
                    adjust_formula_references(&template, 0, delta)
                } else {
                    adjust_formula_references(&template, delta, 0)
                };
                let cell = Cell::new_formula(adjusted);
                if vertical {
                    FillResult { row: idx, col: fixed_index, cell }
                } else {
                    FillResult { row: fixed_index, col: idx, cell }
                }
            })
            .collect();
    }

    let values: Vec<CellValue> = seed.iter().map(|c| c.value.clone()).collect();
    let detected = detect_pattern(&values, &config.custom_fill_lists);
    let generated = generate_values(&detected, target_indices.len(), &config.custom_fill_lists);

    target_indices
        .iter()
        .zip(generated.into_iter())
        .map(|(&idx, value)| {
            let cell = match detected {
                DetectedPattern::Copy if values.len() == 1 => Cell {
                    value: values[0].clone(),
                    ..Cell::new()
                },
                _ => Cell { value, ..Cell::new() },
            };
            if vertical {
                FillResult { row: idx, col: fixed_index, cell }
            } else {
                FillResult { row: fixed_index, col: idx, cell }
            }
        })
        .collect()
}

fn step_sign(seed_len: usize) -> i64 {
    seed_len.max(1) as i64
}

//! FILENAME: src/conditional/engine.rs
//! PURPOSE: The conditional-formatting engine — a prioritized, overlapping
//! rule set evaluated per cell into a merged format overlay.
//! CONTEXT: Rule storage follows a flat, priority-tagged rule list,
//! generalized to a priority-ascending evaluation order with
//! `stopIfTrue` short-circuiting (later rules win on conflicting properties)
//! plus the color-scale/data-bar/icon-set computed visuals.

use std::collections::{HashMap, HashSet};

use crate::cell::CellValue;
use crate::conditional::rules::{Rule, RuleKind, RangeStats};
use crate::coord::{CellCoord, CellRange};
use crate::style::{Color, FormatOverrides};
use crate::subscription::{Publisher, Unsubscribe};

/// A conditional-formatting rule's stable identifier, as assigned by
/// `ConditionalFormattingEngine::add_rule`.
pub type RuleId = u64;

/// The fully evaluated conditional-format outcome for one cell: a merged
/// property overlay plus at most one computed visual (a rule range cannot
/// usefully combine a color scale and a data bar on the same cell, so the
/// first one encountered in priority order wins).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedCellFormat {
    pub overrides: FormatOverrides,
    pub color_scale_color: Option<Color>,
    pub data_bar_fraction: Option<f64>,
    /// The bar's fill color: `max_color` for non-negative values,
    /// `negative_fill_color` (falling back to `min_color`) for negatives.
    pub data_bar_color: Option<Color>,
    pub icon: Option<(String, usize)>,
    /// Ids of every rule that applied to this cell, in priority-ascending
    /// order.
    pub matched_rules: Vec<RuleId>,
}

impl ComputedCellFormat {
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
            && self.color_scale_color.is_none()
            && self.data_bar_fraction.is_none()
            && self.icon.is_none()
            && self.matched_rules.is_empty()
    }
}

/// The conditional-formatting rule engine for one sheet.
pub struct ConditionalFormattingEngine {
    rules: Vec<Rule>,
    next_id: u64,
    publisher: Publisher,
}

impl ConditionalFormattingEngine {
    pub fn new() -> Self {
        ConditionalFormattingEngine {
            rules: Vec::new(),
            next_id: 0,
            publisher: Publisher::new(),
        }
    }

    /// Adds a rule, assigning it a stable id, and notifies subscribers.
    pub fn add_rule(&mut self, range: CellRange, kind: RuleKind, priority: i32, format: FormatOverrides, stop_if_true: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rules.push(Rule {
            id,
            range,
            kind,
            priority,
            format,
            stop_if_true,
        });
        log::debug!("added conditional format rule {} at priority {}", id, priority);
        self.publisher.notify();
        id
    }

    pub fn remove_rule(&mut self, id: u64) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        let removed = self.rules.len() != before;
        if removed {
            self.publisher.notify();
        }
        removed
    }

    /// Rules in evaluation order: ascending priority (lower runs, and is
    /// overridden, first).
    pub fn rules_in_priority_order(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by_key(|r| (r.priority, r.id));
        rules
    }

    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> Unsubscribe {
        self.publisher.subscribe(listener)
    }

    /// Evaluates every rule covering `coord` and merges the result.
    /// `stats_for_range` supplies precomputed `RangeStats` for a rule's
    /// range; when a rule's kind needs a full value scan (duplicates,
    /// unique, color scale, data bar, icon set), `values_in_range` is used
    /// instead.
    pub fn evaluate_cell<'a>(
        &self,
        coord: CellCoord,
        value: &CellValue,
        today: chrono::NaiveDate,
        stats_for_range: impl Fn(&CellRange) -> RangeStats,
        values_in_range: impl Fn(&CellRange) -> Vec<(CellCoord, CellValue)>,
    ) -> ComputedCellFormat {
        let mut result = ComputedCellFormat::default();

        for rule in self.rules_in_priority_order() {
            if !rule.range.contains(coord.0, coord.1) {
                continue;
            }

            let matched = match &rule.kind {
                RuleKind::ColorScale(stops) => {
                    let mut applied = false;
                    if let Some(n) = value.as_number() {
                        let stats = stats_for_range(&rule.range);
                        if let Some(color) = color_scale_color(stops, n, &stats) {
                            result.color_scale_color = Some(color);
                            applied = true;
                        }
                    }
                    if applied {
                        result.matched_rules.push(rule.id);
                    }
                    false
                }
                RuleKind::DataBar(bar) => {
                    if let Some(n) = value.as_number() {
                        let stats = stats_for_range(&rule.range);
                        let is_negative = n < 0.0;
                        let range_span = stats.max - stats.min;
                        let fraction = if is_negative {
                            let neg_span = stats.min.min(0.0).abs();
                            if neg_span > f64::EPSILON {
                                (n.abs() / neg_span).clamp(0.0, 1.0)
                            } else {
                                0.0
                            }
                        } else if range_span.abs() > f64::EPSILON {
                            ((n - stats.min) / range_span).clamp(0.0, 1.0)
                        } else {
                            0.0
                        };
                        result.data_bar_fraction = Some(if bar.direction == crate::conditional::rules::DataBarDirection::RightToLeft {
                            1.0 - fraction
                        } else {
                            fraction
                        });
                        result.data_bar_color = Some(if is_negative {
                            bar.negative_fill_color.unwrap_or(bar.min_color)
                        } else {
                            bar.max_color
                        });
                        result.matched_rules.push(rule.id);
                    }
                    false
                }
                RuleKind::IconSet(icon_rule) => {
                    if let Some(n) = value.as_number() {
                        let stats = stats_for_range(&rule.range);
                        let idx = icon_rule.bucket_for(n, &stats);
                        if let Some(icon) = icon_rule.icons.get(idx) {
                            result.icon = Some((icon.clone(), idx));
                            result.matched_rules.push(rule.id);
                        }
                    }
                    false
                }
                RuleKind::Duplicates => {
                    let dupes = duplicate_coords(&values_in_range(&rule.range));
                    dupes.contains(&coord)
                }
                RuleKind::Unique => {
                    let dupes = duplicate_coords(&values_in_range(&rule.range));
                    !dupes.contains(&coord)
                }
                RuleKind::FormulaMask(coords) => coords.contains(&coord),
                other => {
                    let stats = stats_for_range(&rule.range);
                    crate::conditional::rules::rule_matches(other, value, &stats, today)
                }
            };

            if matched {
                result.matched_rules.push(rule.id);
                result.overrides = result.overrides.merge(&rule.format);
                if rule.stop_if_true {
                    break;
                }
            }
        }

        result
    }
}

impl Default for ConditionalFormattingEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn color_scale_color(stops: &[crate::conditional::rules::ColorScalePoint], value: f64, stats: &RangeStats) -> Option<Color> {
    if stops.len() < 2 {
        return stops.first().map(|s| s.color);
    }
    let mut resolved: Vec<(f64, Color)> = stops
        .iter()
        .map(|s| {
            let pos = if s.is_absolute {
                s.position
            } else {
                stats.min + s.position * (stats.max - stats.min)
            };
            (pos, s.color)
        })
        .collect();
    resolved.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    if value <= resolved[0].0 {
        return Some(resolved[0].1);
    }
    if value >= resolved[resolved.len() - 1].0 {
        return Some(resolved[resolved.len() - 1].1);
    }
    for window in resolved.windows(2) {
        let (lo_pos, lo_color) = window[0];
        let (hi_pos, hi_color) = window[1];
        if value >= lo_pos && value <= hi_pos {
            let span = hi_pos - lo_pos;
            let t = if span.abs() > f64::EPSILON { (value - lo_pos) / span } else { 0.0 };
            return Some(Color::lerp(lo_color, hi_color, t));
        }
    }
    None
}

fn duplicate_coords(values: &[(CellCoord, CellValue)]) -> HashSet<CellCoord> {
    let mut counts: HashMap<String, Vec<CellCoord>> = HashMap::new();
    for (coord, value) in values {
        if value.is_empty() {
            continue;
        }
        counts.entry(value.as_text()).or_default().push(*coord);
    }
    counts
        .into_values()
        .filter(|coords| coords.len() > 1)
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditional::rules::{CellValueOperator, ColorScalePoint};

    fn today() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
    }

    #[test]
    fn test_single_matching_rule_applies_format() {
        let mut engine = ConditionalFormattingEngine::new();
        engine.add_rule(
            CellRange::new(0, 0, 5, 0),
            RuleKind::CellValue {
                operator: CellValueOperator::GreaterThan,
                operand1: 10.0,
                operand2: None,
            },
            0,
            FormatOverrides {
                bold: Some(true),
                ..Default::default()
            },
            false,
        );

        let result = engine.evaluate_cell(
            (1, 0),
            &CellValue::Number(20.0),
            today(),
            |_| RangeStats::from_values(std::iter::empty()),
            |_| vec![],
        );
        assert_eq!(result.overrides.bold, Some(true));
    }

    #[test]
    fn test_stop_if_true_prevents_lower_priority_rule() {
        let mut engine = ConditionalFormattingEngine::new();
        engine.add_rule(
            CellRange::new(0, 0, 5, 0),
            RuleKind::CellValue {
                operator: CellValueOperator::GreaterThan,
                operand1: 0.0,
                operand2: None,
            },
            0,
            FormatOverrides {
                bold: Some(true),
                ..Default::default()
            },
            true,
        );
        engine.add_rule(
            CellRange::new(0, 0, 5, 0),
            RuleKind::CellValue {
                operator: CellValueOperator::GreaterThan,
                operand1: 0.0,
                operand2: None,
            },
            1,
            FormatOverrides {
                italic: Some(true),
                ..Default::default()
            },
            false,
        );

        let result = engine.evaluate_cell(
            (1, 0),
            &CellValue::Number(5.0),
            today(),
            |_| RangeStats::from_values(std::iter::empty()),
            |_| vec![],
        );
        assert_eq!(result.overrides.bold, Some(true));
        assert_eq!(result.overrides.italic, None);
        assert_eq!(result.matched_rules, vec![0]);
    }

    #[test]
    fn test_matched_rules_lists_every_applying_rule_in_priority_order() {
        let mut engine = ConditionalFormattingEngine::new();
        let second_id = engine.add_rule(
            CellRange::new(0, 0, 5, 0),
            RuleKind::CellValue {
                operator: CellValueOperator::GreaterThan,
                operand1: 0.0,
                operand2: None,
            },
            5,
            FormatOverrides {
                italic: Some(true),
                ..Default::default()
            },
            false,
        );
        let first_id = engine.add_rule(
            CellRange::new(0, 0, 5, 0),
            RuleKind::CellValue {
                operator: CellValueOperator::GreaterThan,
                operand1: 0.0,
                operand2: None,
            },
            1,
            FormatOverrides {
                bold: Some(true),
                ..Default::default()
            },
            false,
        );

        let result = engine.evaluate_cell(
            (1, 0),
            &CellValue::Number(5.0),
            today(),
            |_| RangeStats::from_values(std::iter::empty()),
            |_| vec![],
        );
        assert_eq!(result.matched_rules, vec![first_id, second_id]);
    }

    #[test]
    fn test_later_rule_without_stop_overrides_earlier() {
        let mut engine = ConditionalFormattingEngine::new();
        engine.add_rule(
            CellRange::new(0, 0, 5, 0),
            RuleKind::CellValue {
                operator: CellValueOperator::GreaterThan,
                operand1: 0.0,
                operand2: None,
            },
            0,
            FormatOverrides {
                bold: Some(true),
                ..Default::default()
            },
            false,
        );
        engine.add_rule(
            CellRange::new(0, 0, 5, 0),
            RuleKind::CellValue {
                operator: CellValueOperator::GreaterThan,
                operand1: 0.0,
                operand2: None,
            },
            1,
            FormatOverrides {
                bold: Some(false),
                ..Default::default()
            },
            false,
        );

        let result = engine.evaluate_cell(
            (1, 0),
            &CellValue::Number(5.0),
            today(),
            |_| RangeStats::from_values(std::iter::empty()),
            |_| vec![],
        );
        assert_eq!(result.overrides.bold, Some(false));
    }

    #[test]
    fn test_color_scale_two_point_interpolation() {
        let mut engine = ConditionalFormattingEngine::new();
        engine.add_rule(
            CellRange::new(0, 0, 2, 0),
            RuleKind::ColorScale(vec![
                ColorScalePoint {
                    position: 0.0,
                    is_absolute: false,
                    color: Color::new(255, 0, 0),
                },
                ColorScalePoint {
                    position: 1.0,
                    is_absolute: false,
                    color: Color::new(0, 0, 255),
                },
            ]),
            0,
            FormatOverrides::default(),
            false,
        );

        let result = engine.evaluate_cell(
            (1, 0),
            &CellValue::Number(50.0),
            today(),
            |_| RangeStats::from_values(vec![0.0, 50.0, 100.0].into_iter()),
            |_| vec![],
        );
        let color = result.color_scale_color.unwrap();
        assert!(color.r < 255 && color.r > 0);
        assert!(color.b < 255 && color.b > 0);
    }

    #[test]
    fn test_data_bar_uses_negative_fill_color_for_negative_values() {
        use crate::conditional::rules::{DataBarDirection, DataBarRule};
        let mut engine = ConditionalFormattingEngine::new();
        engine.add_rule(
            CellRange::new(0, 0, 2, 0),
            RuleKind::DataBar(DataBarRule {
                min_color: Color::new(0, 0, 0),
                max_color: Color::new(0, 200, 0),
                direction: DataBarDirection::LeftToRight,
                show_value: true,
                negative_fill_color: Some(Color::new(200, 0, 0)),
            }),
            0,
            FormatOverrides::default(),
            false,
        );

        let result = engine.evaluate_cell(
            (0, 0),
            &CellValue::Number(-5.0),
            today(),
            |_| RangeStats::from_values(vec![-10.0, 0.0, 10.0].into_iter()),
            |_| vec![],
        );
        assert_eq!(result.data_bar_color, Some(Color::new(200, 0, 0)));
    }

    #[test]
    fn test_duplicates_rule_flags_repeated_values() {
        let mut engine = ConditionalFormattingEngine::new();
        engine.add_rule(
            CellRange::new(0, 0, 2, 0),
            RuleKind::Duplicates,
            0,
            FormatOverrides {
                background: Some(Color::new(255, 200, 200)),
                ..Default::default()
            },
            false,
        );

        let values = vec![
            ((0, 0), CellValue::Number(1.0)),
            ((1, 0), CellValue::Number(2.0)),
            ((2, 0), CellValue::Number(1.0)),
        ];

        let result = engine.evaluate_cell(
            (0, 0),
            &CellValue::Number(1.0),
            today(),
            |_| RangeStats::from_values(std::iter::empty()),
            |_| values.clone(),
        );
        assert!(result.overrides.background.is_some());

        let non_dupe = engine.evaluate_cell(
            (1, 0),
            &CellValue::Number(2.0),
            today(),
            |_| RangeStats::from_values(std::iter::empty()),
            |_| values.clone(),
        );
        assert!(non_dupe.overrides.background.is_none());
    }

    #[test]
    fn test_rule_outside_range_does_not_apply() {
        let mut engine = ConditionalFormattingEngine::new();
        engine.add_rule(
            CellRange::new(0, 0, 1, 0),
            RuleKind::CellValue {
                operator: CellValueOperator::GreaterThan,
                operand1: 0.0,
                operand2: None,
            },
            0,
            FormatOverrides {
                bold: Some(true),
                ..Default::default()
            },
            false,
        );

        let result = engine.evaluate_cell(
            (5, 0),
            &CellValue::Number(100.0),
            today(),
            |_| RangeStats::from_values(std::iter::empty()),
            |_| vec![],
        );
        assert!(result.is_empty());
    }
}

//! FILENAME: src/conditional/rules.rs
//! PURPOSE: Conditional-formatting rule kinds and the range statistics they
//! need to evaluate against.
//! CONTEXT: Shaped after a conditional-formatting rule vocabulary
//! (`CFValueType`, `ColorScalePoint`, `ColorScaleRule`, `DataBarDirection`,
//! `DataBarAxisPosition`, `DataBarRule`) — renamed into this crate's own
//! rule vocabulary and reduced to the operations this engine needs.

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::conditional::dates::DateBucket;
use crate::coord::CellRange;
use crate::style::{Color, FormatOverrides};

/// Comparison used by `CellValueRule`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellValueOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    NotBetween,
}

/// Whether `TopBottomRule` ranks from the top or the bottom, and whether
/// the count is absolute or a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TopBottomKind {
    TopItems(u32),
    BottomItems(u32),
    TopPercent(f64),
    BottomPercent(f64),
}

/// One stop in a two- or three-point color scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScalePoint {
    /// Position of this stop, 0.0..=1.0 along the range's min..max (or an
    /// absolute value when `is_absolute` is set).
    pub position: f64,
    pub is_absolute: bool,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataBarDirection {
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataBarRule {
    pub min_color: Color,
    pub max_color: Color,
    pub direction: DataBarDirection,
    pub show_value: bool,
    /// Fill used for negative values when set; `None` reuses `min_color`.
    pub negative_fill_color: Option<Color>,
}

/// The scale a threshold's `value` is expressed in: each icon-set
/// threshold has a `type` of number, percent, or percentile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdKind {
    Number,
    Percent,
    Percentile,
}

/// The comparison a threshold uses against the resolved value (`>` or `≥`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdOperator {
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IconThreshold {
    pub value: f64,
    pub kind: ThresholdKind,
    pub operator: ThresholdOperator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconSetRule {
    /// Icon identifiers, ordered lowest-to-highest bucket. The render
    /// frame looks these up in its own icon atlas; the engine only decides
    /// which bucket index a value falls into.
    pub icons: Vec<String>,
    /// Ascending thresholds; `icons.len() == thresholds.len() + 1`.
    pub thresholds: Vec<IconThreshold>,
    /// Inverts the bucket order (lowest value gets the highest-ranked icon).
    pub reverse_order: bool,
}

impl IconSetRule {
    /// The icon index a value should use, given the range's statistics.
    pub fn bucket_for(&self, value: f64, stats: &RangeStats) -> usize {
        let mut idx = 0;
        for threshold in &self.thresholds {
            let resolved = match threshold.kind {
                ThresholdKind::Number => threshold.value,
                ThresholdKind::Percent => stats.min + (threshold.value / 100.0) * (stats.max - stats.min),
                ThresholdKind::Percentile => stats.percentile(threshold.value / 100.0).unwrap_or(stats.min),
            };
            let passes = match threshold.operator {
                ThresholdOperator::GreaterThan => value > resolved,
                ThresholdOperator::GreaterThanOrEqual => value >= resolved,
            };
            if passes {
                idx += 1;
            } else {
                break;
            }
        }
        let idx = idx.min(self.icons.len().saturating_sub(1));
        if self.reverse_order {
            self.icons.len().saturating_sub(1).saturating_sub(idx)
        } else {
            idx
        }
    }
}

/// The closed set of conditional-formatting rule kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RuleKind {
    CellValue {
        operator: CellValueOperator,
        operand1: f64,
        operand2: Option<f64>,
    },
    TextContains(String),
    TextNotContains(String),
    TextStartsWith(String),
    TextEndsWith(String),
    TopBottom(TopBottomKind),
    DateBucket(DateBucket),
    ColorScale(Vec<ColorScalePoint>),
    DataBar(DataBarRule),
    IconSet(IconSetRule),
    Blanks,
    NoBlanks,
    Errors,
    NoErrors,
    Duplicates,
    Unique,
    /// A formula-based rule is stored as a pre-evaluated boolean mask
    /// rather than re-deriving formula evaluation, which is out of this
    /// engine's scope. The host evaluates the formula per cell and reports
    /// matches here.
    FormulaMask(Vec<(u32, u32)>),
}

/// A single conditional-formatting rule: a kind, the range it applies to,
/// a priority (lower runs first), the format it contributes, and whether it
/// short-circuits lower-priority rules on a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: u64,
    pub range: CellRange,
    pub kind: RuleKind,
    pub priority: i32,
    pub format: FormatOverrides,
    pub stop_if_true: bool,
}

/// Precomputed statistics over a range's numeric values, supplied by the
/// adapter. `RangeStats::from_values` is the concrete builder for callers
/// that just have an iterator of values in hand.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeStats {
    pub sorted_ascending: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl RangeStats {
    pub fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let min = sorted.first().copied().unwrap_or(0.0);
        let max = sorted.last().copied().unwrap_or(0.0);
        RangeStats {
            count: sorted.len(),
            sorted_ascending: sorted,
            min,
            max,
        }
    }

    /// The value at a given percentile rank (0.0..=1.0) via nearest-rank.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.sorted_ascending.is_empty() {
            return None;
        }
        let idx = ((self.sorted_ascending.len() as f64 - 1.0) * p.clamp(0.0, 1.0)).round() as usize;
        self.sorted_ascending.get(idx).copied()
    }
}

/// Tests a rule's predicate-only kinds (everything except `ColorScale`,
/// `DataBar`, and `IconSet`, which contribute a computed visual rather than
/// a boolean match) against one cell's value.
pub fn rule_matches(kind: &RuleKind, value: &CellValue, stats: &RangeStats, today: chrono::NaiveDate) -> bool {
    match kind {
        RuleKind::CellValue {
            operator,
            operand1,
            operand2,
        } => {
            let n = match value.as_number() {
                Some(n) => n,
                None => return false,
            };
            match operator {
                CellValueOperator::Equal => n == *operand1,
                CellValueOperator::NotEqual => n != *operand1,
                CellValueOperator::GreaterThan => n > *operand1,
                CellValueOperator::GreaterThanOrEqual => n >= *operand1,
                CellValueOperator::LessThan => n < *operand1,
                CellValueOperator::LessThanOrEqual => n <= *operand1,
                CellValueOperator::Between => {
                    let hi = operand2.unwrap_or(*operand1);
                    n >= operand1.min(hi) && n <= operand1.max(hi)
                }
                CellValueOperator::NotBetween => {
                    let hi = operand2.unwrap_or(*operand1);
                    !(n >= operand1.min(hi) && n <= operand1.max(hi))
                }
            }
        }
        RuleKind::TextContains(s) => value.as_text().to_lowercase().contains(&s.to_lowercase()),
        RuleKind::TextNotContains(s) => !value.as_text().to_lowercase().contains(&s.to_lowercase()),
        RuleKind::TextStartsWith(s) => value.as_text().to_lowercase().starts_with(&s.to_lowercase()),
        RuleKind::TextEndsWith(s) => value.as_text().to_lowercase().ends_with(&s.to_lowercase()),
        RuleKind::TopBottom(kind) => {
            let n = match value.as_number() {
                Some(n) => n,
                None => return false,
            };
            match_top_bottom(*kind, n, stats)
        }
        RuleKind::DateBucket(bucket) => match crate::conditional::dates::excel_serial_to_date(value) {
            Some(date) => crate::conditional::dates::date_in_bucket(date, *bucket, today),
            None => false,
        },
        RuleKind::Blanks => value.is_empty(),
        RuleKind::NoBlanks => !value.is_empty(),
        RuleKind::Errors => value.is_error(),
        RuleKind::NoErrors => !value.is_error(),
        // Duplicates/Unique and ColorScale/DataBar/IconSet need the whole
        // range's values, not just `stats`'s scalar summary; the engine
        // evaluates these directly rather than through this per-cell hook.
        RuleKind::Duplicates | RuleKind::Unique => false,
        RuleKind::ColorScale(_) | RuleKind::DataBar(_) | RuleKind::IconSet(_) => false,
        RuleKind::FormulaMask(cells) => cells.is_empty(), // resolved by coordinate elsewhere
    }
}

fn match_top_bottom(kind: TopBottomKind, value: f64, stats: &RangeStats) -> bool {
    if stats.count == 0 {
        return false;
    }
    match kind {
        TopBottomKind::TopItems(n) => {
            let threshold_idx = stats.count.saturating_sub(n as usize);
            stats
                .sorted_ascending
                .get(threshold_idx)
                .map(|&t| value >= t)
                .unwrap_or(false)
        }
        TopBottomKind::BottomItems(n) => {
            let threshold_idx = (n as usize).saturating_sub(1).min(stats.count - 1);
            stats
                .sorted_ascending
                .get(threshold_idx)
                .map(|&t| value <= t)
                .unwrap_or(false)
        }
        // Percent converts to an item count (ceil, at least 1) and reuses
        // the exact top/bottom-items threshold, rather than interpolating
        // a percentile.
        TopBottomKind::TopPercent(p) => {
            let n = percent_to_item_count(p, stats.count);
            let threshold_idx = stats.count.saturating_sub(n);
            stats.sorted_ascending.get(threshold_idx).map(|&t| value >= t).unwrap_or(false)
        }
        TopBottomKind::BottomPercent(p) => {
            let n = percent_to_item_count(p, stats.count);
            let threshold_idx = n.saturating_sub(1).min(stats.count - 1);
            stats.sorted_ascending.get(threshold_idx).map(|&t| value <= t).unwrap_or(false)
        }
    }
}

/// Converts a percentage of a range's row count into an item count: rounds
/// up, and is always at least 1.
fn percent_to_item_count(percent: f64, count: usize) -> usize {
    let raw = (percent / 100.0 * count as f64).ceil();
    (raw.max(1.0) as usize).min(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellErrorCode;

    #[test]
    fn test_cell_value_between() {
        let stats = RangeStats::from_values(std::iter::empty());
        let kind = RuleKind::CellValue {
            operator: CellValueOperator::Between,
            operand1: 1.0,
            operand2: Some(10.0),
        };
        let today = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(rule_matches(&kind, &CellValue::Number(5.0), &stats, today));
        assert!(!rule_matches(&kind, &CellValue::Number(20.0), &stats, today));
    }

    #[test]
    fn test_range_stats_percentile() {
        let stats = RangeStats::from_values(vec![1.0, 2.0, 3.0, 4.0, 5.0].into_iter());
        assert_eq!(stats.percentile(0.0), Some(1.0));
        assert_eq!(stats.percentile(1.0), Some(5.0));
    }

    #[test]
    fn test_top_items() {
        let stats = RangeStats::from_values(vec![10.0, 20.0, 30.0, 40.0, 50.0].into_iter());
        assert!(match_top_bottom(TopBottomKind::TopItems(2), 50.0, &stats));
        assert!(match_top_bottom(TopBottomKind::TopItems(2), 40.0, &stats));
        assert!(!match_top_bottom(TopBottomKind::TopItems(2), 30.0, &stats));
    }

    #[test]
    fn test_bottom_items() {
        let stats = RangeStats::from_values(vec![10.0, 20.0, 30.0, 40.0, 50.0].into_iter());
        assert!(match_top_bottom(TopBottomKind::BottomItems(2), 10.0, &stats));
        assert!(!match_top_bottom(TopBottomKind::BottomItems(2), 30.0, &stats));
    }

    #[test]
    fn test_top_percent_rounds_up_to_item_count() {
        // 10 values, 25% -> ceil(2.5) = 3 items: 80, 90, 100.
        let stats = RangeStats::from_values((1..=10).map(|i| i as f64 * 10.0));
        assert!(match_top_bottom(TopBottomKind::TopPercent(25.0), 80.0, &stats));
        assert!(!match_top_bottom(TopBottomKind::TopPercent(25.0), 70.0, &stats));
    }

    #[test]
    fn test_bottom_percent_rounds_up_to_item_count() {
        let stats = RangeStats::from_values((1..=10).map(|i| i as f64 * 10.0));
        assert!(match_top_bottom(TopBottomKind::BottomPercent(25.0), 30.0, &stats));
        assert!(!match_top_bottom(TopBottomKind::BottomPercent(25.0), 40.0, &stats));
    }

    #[test]
    fn test_percent_is_at_least_one_item() {
        let stats = RangeStats::from_values(vec![1.0, 2.0, 3.0].into_iter());
        // 1% of 3 rounds up to 1 item, not 0.
        assert!(match_top_bottom(TopBottomKind::TopPercent(1.0), 3.0, &stats));
        assert!(!match_top_bottom(TopBottomKind::TopPercent(1.0), 2.0, &stats));
    }

    #[test]
    fn test_icon_set_bucket_for() {
        let stats = RangeStats::from_values(std::iter::empty());
        let icons = IconSetRule {
            icons: vec!["red".into(), "yellow".into(), "green".into()],
            thresholds: vec![
                IconThreshold {
                    value: 33.0,
                    kind: ThresholdKind::Number,
                    operator: ThresholdOperator::GreaterThanOrEqual,
                },
                IconThreshold {
                    value: 67.0,
                    kind: ThresholdKind::Number,
                    operator: ThresholdOperator::GreaterThanOrEqual,
                },
            ],
            reverse_order: false,
        };
        assert_eq!(icons.bucket_for(10.0, &stats), 0);
        assert_eq!(icons.bucket_for(50.0, &stats), 1);
        assert_eq!(icons.bucket_for(90.0, &stats), 2);
    }

    #[test]
    fn test_icon_set_reverse_order_inverts_buckets() {
        let stats = RangeStats::from_values(std::iter::empty());
        let icons = IconSetRule {
            icons: vec!["red".into(), "yellow".into(), "green".into()],
            thresholds: vec![
                IconThreshold {
                    value: 33.0,
                    kind: ThresholdKind::Number,
                    operator: ThresholdOperator::GreaterThanOrEqual,
                },
                IconThreshold {
                    value: 67.0,
                    kind: ThresholdKind::Number,
                    operator: ThresholdOperator::GreaterThanOrEqual,
                },
            ],
            reverse_order: true,
        };
        assert_eq!(icons.bucket_for(10.0, &stats), 2);
        assert_eq!(icons.bucket_for(90.0, &stats), 0);
    }

    #[test]
    fn test_icon_set_percent_threshold_resolves_against_min_max() {
        let stats = RangeStats::from_values(vec![0.0, 50.0, 100.0].into_iter());
        let icons = IconSetRule {
            icons: vec!["red".into(), "green".into()],
            thresholds: vec![IconThreshold {
                value: 50.0,
                kind: ThresholdKind::Percent,
                operator: ThresholdOperator::GreaterThanOrEqual,
            }],
            reverse_order: false,
        };
        assert_eq!(icons.bucket_for(40.0, &stats), 0);
        assert_eq!(icons.bucket_for(60.0, &stats), 1);
    }

    #[test]
    fn test_blanks_and_errors() {
        let stats = RangeStats::from_values(std::iter::empty());
        let today = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(rule_matches(&RuleKind::Blanks, &CellValue::Empty, &stats, today));
        assert!(rule_matches(
            &RuleKind::Errors,
            &CellValue::Error(CellErrorCode::Div0),
            &stats,
            today
        ));
        assert!(!rule_matches(
            &RuleKind::NoErrors,
            &CellValue::Error(CellErrorCode::Div0),
            &stats,
            today
        ));
    }
}

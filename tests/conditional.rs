//! Integration coverage for `ConditionalFormattingEngine`, including the
//! literal S2 scenario ("conditional top-2 with format overlay") and
//! multi-rule composition the way the render adapter drives it.

use sheetcore::conditional::{CellValueOperator, RangeStats, TopBottomKind};
use sheetcore::style::FormatOverrides;
use sheetcore::{Cell, CellRange, CellValue, ConditionalFormattingEngine, RuleKind, SparseCellStore};

fn today() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2026, 7, 27).unwrap()
}

/// S2 — conditional top-2 with format overlay. Rows 0..3 col 0 hold
/// [10, 20, 30, 40]; a `topBottom{top, rank=2, items}` rule with a bold
/// overlay should bold only rows 2 and 3.
#[test]
fn scenario_s2_conditional_top_two_with_format_overlay() {
    let mut store = SparseCellStore::new();
    for (row, value) in [10.0, 20.0, 30.0, 40.0].into_iter().enumerate() {
        store.set_cell(row as i64, 0, Cell::new_number(value)).unwrap();
    }
    let range = CellRange::new(0, 0, 3, 0);

    let mut engine = ConditionalFormattingEngine::new();
    engine.add_rule(
        range,
        RuleKind::TopBottom(TopBottomKind::TopItems(2)),
        0,
        FormatOverrides {
            bold: Some(true),
            ..Default::default()
        },
        false,
    );

    let stats_for_range = |_: &CellRange| {
        RangeStats::from_values((0..=3).map(|r| store.get_cell(r, 0).unwrap().unwrap().value.as_number().unwrap()))
    };

    for row in 0..=3 {
        let cell = store.get_cell(row, 0).unwrap().unwrap();
        let result = engine.evaluate_cell((row as u32, 0), &cell.value, today(), stats_for_range, |_| vec![]);
        let expect_bold = row >= 2;
        assert_eq!(result.overrides.bold, if expect_bold { Some(true) } else { None }, "row {row}");
    }
}

#[test]
fn overlapping_rules_compose_with_priority_order_and_stop_if_true() {
    let mut engine = ConditionalFormattingEngine::new();
    let high_priority_bold = engine.add_rule(
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
    assert_eq!(result.overrides.italic, None, "stopIfTrue must block the lower-priority rule");
    assert_eq!(result.matched_rules, vec![high_priority_bold]);
}

#[test]
fn duplicates_rule_scans_the_whole_range_supplied_by_the_adapter() {
    let mut store = SparseCellStore::new();
    store.set_cell(0, 0, Cell::new_number(7.0)).unwrap();
    store.set_cell(1, 0, Cell::new_number(8.0)).unwrap();
    store.set_cell(2, 0, Cell::new_number(7.0)).unwrap();

    let range = CellRange::new(0, 0, 2, 0);
    let mut engine = ConditionalFormattingEngine::new();
    engine.add_rule(
        range,
        RuleKind::Duplicates,
        0,
        FormatOverrides {
            background: Some(sheetcore::Color::new(255, 220, 220)),
            ..Default::default()
        },
        false,
    );

    let values_in_range = |_: &CellRange| {
        (0..=2)
            .map(|r| ((r as u32, 0), store.get_cell(r, 0).unwrap().unwrap().value.clone()))
            .collect::<Vec<_>>()
    };

    let dupe = engine.evaluate_cell((0, 0), &CellValue::Number(7.0), today(), |_| RangeStats::from_values(std::iter::empty()), values_in_range);
    assert!(dupe.overrides.background.is_some());

    let unique = engine.evaluate_cell((1, 0), &CellValue::Number(8.0), today(), |_| RangeStats::from_values(std::iter::empty()), values_in_range);
    assert!(unique.overrides.background.is_none());
}

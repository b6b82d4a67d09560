//! FILENAME: src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet core engine.
//! CONTEXT: Re-exports public types and modules. Dependency order, leaves
//! first: types & ranges -> sparse cell store -> merge manager -> filter
//! predicates -> filter manager -> conditional-formatting engine ->
//! fill-pattern engine & format painter -> render-frame adapter ->
//! subscription/event plumbing.

pub mod cell;
pub mod conditional;
pub mod config;
pub mod coord;
pub mod error;
pub mod fill;
pub mod filter;
pub mod merge;
pub mod number_format;
pub mod painter;
pub mod render;
pub mod store;
pub mod style;
pub mod subscription;

pub use cell::{Cell, CellErrorCode, CellValidation, CellValue, FormatRun, MergeSpan, ValidationKind, ValidationOperator};
pub use conditional::{ComputedCellFormat, ConditionalFormattingEngine, RangeStats, Rule, RuleKind};
pub use config::EngineConfig;
pub use coord::{a1_to_coord, cell_key, col_to_index, coord_to_a1, index_to_col, validate_coord, CellCoord, CellKey, CellRange};
pub use error::{EngineError, EngineResult};
pub use fill::{detect_pattern, fill_range, DetectedPattern, FillDirection, FillResult};
pub use filter::{FilterManager, FilterOn, FilterPredicate};
pub use merge::MergeManager;
pub use number_format::{format_number, format_number_for_cell};
pub use painter::FormatPainter;
pub use render::{
    AxisMetadata, ColPosition, ContentBounds, RenderCell, RenderFrame, RenderFrameAdapter, RowPosition, ScrollPosition,
};
pub use store::SparseCellStore;
pub use style::{CellFormat, Color, FontStyle, NumberFormat};
pub use subscription::{Publisher, Unsubscribe};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_creates_cells() {
        let cell = Cell::new_number(42.0);
        assert_eq!(cell.value, CellValue::Number(42.0));
    }

    #[test]
    fn it_manages_sparse_store() {
        let mut store = SparseCellStore::new();
        store.set_cell(0, 0, Cell::new_text("Hello".to_string())).unwrap();

        let retrieved = store.get_cell(0, 0).unwrap();
        assert!(retrieved.is_some());
        if let Some(c) = retrieved {
            assert_eq!(c.value, CellValue::String("Hello".to_string()));
        }
    }

    #[test]
    fn integration_test_merge_then_render_spans_anchor() {
        let mut store = SparseCellStore::new();
        store.set_cell(0, 0, Cell::new_number(1.0)).unwrap();

        let mut merges = MergeManager::new();
        merges.merge(0, 0, 1, 1).unwrap();

        let rows = AxisMetadata::new(20.0, 0);
        let cols = AxisMetadata::new(80.0, 0);
        let config = EngineConfig::default();
        let adapter = RenderFrameAdapter::new(&rows, &cols, &config);
        let conditional = ConditionalFormattingEngine::new();

        let frame = adapter.build(
            &CellRange::new(0, 0, 1, 1),
            &merges,
            &conditional,
            |r, c| store.get_cell(r as i64, c as i64).ok().flatten().cloned(),
            |_, _| CellFormat::new(),
            |_| RangeStats::from_values(std::iter::empty()),
            |_| vec![],
            chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        );

        let anchor = frame.cells.iter().find(|c| c.row == 0 && c.col == 0).unwrap();
        assert_eq!(anchor.row_span, 2);
        assert_eq!(anchor.col_span, 2);
    }

    #[test]
    fn integration_test_filter_and_fill_compose() {
        use fill::{fill_range, FillDirection};

        let mut store = SparseCellStore::new();
        store.set_cell(0, 0, Cell::new_number(1.0)).unwrap();
        store.set_cell(1, 0, Cell::new_number(2.0)).unwrap();

        let config = EngineConfig::default();
        let results = fill_range(
            &CellRange::new(0, 0, 1, 0),
            &CellRange::new(0, 0, 3, 0),
            FillDirection::Down,
            |r, c| store.get_cell(r as i64, c as i64).ok().flatten().cloned(),
            &config,
        );
        for result in results {
            store.set_cell(result.row as i64, result.col as i64, result.cell).unwrap();
        }

        let mut filter = FilterManager::new(CellRange::new(0, 0, 3, 0));
        filter.set_column_filter(
            0,
            FilterOn::Values(FilterPredicate::Number(filter::NumberPredicate::GreaterThan(2.0))),
        );
        let store_ref = &store;
        let visible = filter
            .get_snapshot(|r, c| store_ref.get_cell(r as i64, c as i64).ok().flatten())
            .to_vec();
        assert_eq!(visible, vec![2, 3]);
    }
}

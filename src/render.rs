//! FILENAME: src/render.rs
//! PURPOSE: The render-frame adapter — turns a viewport into an absolute-
//! positioned stream of `RenderCell`s with zero format computation left for
//! the view.
//! CONTEXT: Shaped after a `TablixViewCell`-style span/background/
//! formatted-value record, adapted from a pivot-table view to a plain grid
//! viewport: merge-anchor spanning,
//! frozen row/column z-ordering, and conditional-format pre-merging so the
//! view only has to paint what it's handed.

use crate::cell::{Cell, CellValidation, CellValue};
use crate::conditional::{ComputedCellFormat, ConditionalFormattingEngine, RangeStats};
use crate::config::EngineConfig;
use crate::coord::CellRange;
use crate::merge::MergeManager;
use crate::style::CellFormat;

/// One cell's fully resolved presentation: position, span, display text,
/// and merged format — the view performs no further lookups per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCell {
    pub row: u32,
    pub col: u32,
    /// Absolute pixel position of this cell's top-left corner within the
    /// sheet (not just the viewport), so merges spanning a scroll edge
    /// still line up.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub row_span: u32,
    pub col_span: u32,
    pub value: CellValue,
    pub formatted_text: String,
    pub format: CellFormat,
    pub conditional: ComputedCellFormat,
    pub validation: Option<CellValidation>,
    pub is_frozen_row: bool,
    pub is_frozen_col: bool,
}

/// Per-row/per-column metadata needed to lay out the grid in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisMetadata {
    pub sizes: Vec<f64>,
    pub default_size: f64,
    pub frozen_count: u32,
}

impl AxisMetadata {
    pub fn new(default_size: f64, frozen_count: u32) -> Self {
        AxisMetadata {
            sizes: Vec::new(),
            default_size,
            frozen_count,
        }
    }

    pub fn size_of(&self, index: u32) -> f64 {
        self.sizes.get(index as usize).copied().unwrap_or(self.default_size)
    }

    /// Absolute pixel offset of `index`'s leading edge, summing every
    /// preceding axis entry's size.
    pub fn offset_of(&self, index: u32) -> f64 {
        (0..index).map(|i| self.size_of(i)).sum()
    }

    pub fn is_frozen(&self, index: u32) -> bool {
        index < self.frozen_count
    }

    /// The pixel position of the freeze line: the total size of every
    /// frozen row/column.
    pub fn freeze_line_position(&self) -> f64 {
        self.offset_of(self.frozen_count)
    }
}

/// One row's pixel position and visibility metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPosition {
    pub row: u32,
    pub top: f64,
    pub height: f64,
    pub frozen: bool,
}

/// One column's pixel position and visibility metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColPosition {
    pub col: u32,
    pub left: f64,
    pub width: f64,
    pub frozen: bool,
}

/// Scroll offset the frame was built for.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

/// Total scrollable pixel extent of the sheet, used to size scrollbars.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContentBounds {
    pub width: f64,
    pub height: f64,
}

/// A fully built render frame for one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub cells: Vec<RenderCell>,
    pub rows: Vec<RowPosition>,
    pub columns: Vec<ColPosition>,
    pub scroll: ScrollPosition,
    pub content_bounds: ContentBounds,
    pub visible_range: CellRange,
    pub freeze_line_x: f64,
    pub freeze_line_y: f64,
    pub timestamp: i64,
    pub zoom: f64,
}

/// Builds `RenderFrame`s from a viewport, a cell source, the merge and
/// conditional-formatting engines, and row/column axis metadata.
pub struct RenderFrameAdapter<'a> {
    pub rows: &'a AxisMetadata,
    pub cols: &'a AxisMetadata,
    pub config: &'a EngineConfig,
}

impl<'a> RenderFrameAdapter<'a> {
    pub fn new(rows: &'a AxisMetadata, cols: &'a AxisMetadata, config: &'a EngineConfig) -> Self {
        RenderFrameAdapter { rows, cols, config }
    }

    /// Builds a frame for `viewport`, expanded by the configured overscan,
    /// and further expanded to include any merge that straddles the
    /// viewport boundary so a partially visible merge never renders
    /// truncated.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        viewport: &CellRange,
        merges: &MergeManager,
        conditional: &ConditionalFormattingEngine,
        get_cell: impl Fn(u32, u32) -> Option<Cell>,
        base_format: impl Fn(u32, u32) -> CellFormat,
        stats_for_range: impl Fn(&CellRange) -> RangeStats,
        values_in_range: impl Fn(&CellRange) -> Vec<((u32, u32), CellValue)>,
        today: chrono::NaiveDate,
    ) -> RenderFrame {
        self.build_with_view_state(
            viewport,
            merges,
            conditional,
            get_cell,
            base_format,
            stats_for_range,
            values_in_range,
            today,
            ScrollPosition::default(),
            1.0,
            0,
            (0, 0),
        )
    }

    /// Like `build`, but also stamps the frame with scroll/zoom/timestamp
    /// and total sheet extent. `build` is the convenience form for callers
    /// that don't need those fields.
    #[allow(clippy::too_many_arguments)]
    pub fn build_with_view_state(
        &self,
        viewport: &CellRange,
        merges: &MergeManager,
        conditional: &ConditionalFormattingEngine,
        get_cell: impl Fn(u32, u32) -> Option<Cell>,
        base_format: impl Fn(u32, u32) -> CellFormat,
        stats_for_range: impl Fn(&CellRange) -> RangeStats,
        values_in_range: impl Fn(&CellRange) -> Vec<((u32, u32), CellValue)>,
        today: chrono::NaiveDate,
        scroll: ScrollPosition,
        zoom: f64,
        timestamp: i64,
        sheet_extent: (u32, u32),
    ) -> RenderFrame {
        let overscanned = CellRange::new(
            viewport.start_row.saturating_sub(self.config.render_overscan_rows),
            viewport.start_col.saturating_sub(self.config.render_overscan_cols),
            viewport.end_row + self.config.render_overscan_rows,
            viewport.end_col + self.config.render_overscan_cols,
        );
        let expanded = merges.expand_range_to_include_merges(overscanned);

        let mut cells = Vec::new();
        let mut skip: std::collections::HashSet<(u32, u32)> = std::collections::HashSet::new();

        for row in expanded.start_row..=expanded.end_row {
            for col in expanded.start_col..=expanded.end_col {
                if skip.contains(&(row, col)) {
                    continue;
                }
                if merges.is_merged_child(row, col) {
                    // Covered by an anchor rendered elsewhere in this loop,
                    // or an anchor outside the expanded range entirely
                    // (shouldn't happen once merges.expand... ran, but we
                    // don't render a bare child defensively).
                    continue;
                }

                let span = merges.get_merge_info(row, col).unwrap_or_else(|| CellRange::single(row, col));
                if span.start_row != row || span.start_col != col {
                    continue;
                }
                for covered in span.cells() {
                    if covered != (row, col) {
                        skip.insert(covered);
                    }
                }

                let cell = get_cell(row, col).unwrap_or_default();
                let base = base_format(row, col);
                let conditional_result = conditional.evaluate_cell(
                    (row, col),
                    &cell.value,
                    today,
                    |range| stats_for_range(range),
                    |range| values_in_range(range),
                );
                let format = conditional_result.overrides.apply_to(cell.format.as_ref().unwrap_or(&base));

                cells.push(RenderCell {
                    row,
                    col,
                    x: self.cols.offset_of(col),
                    y: self.rows.offset_of(row),
                    width: (span.start_col..=span.end_col).map(|c| self.cols.size_of(c)).sum(),
                    height: (span.start_row..=span.end_row).map(|r| self.rows.size_of(r)).sum(),
                    row_span: span.row_span(),
                    col_span: span.col_span(),
                    formatted_text: crate::number_format::format_number_for_cell(&cell),
                    value: cell.value,
                    format,
                    conditional: conditional_result,
                    validation: cell.validation,
                    is_frozen_row: self.rows.is_frozen(row),
                    is_frozen_col: self.cols.is_frozen(col),
                });
            }
        }

        // Frozen cells paint last (on top of scrolled content) — sort so
        // frozen-row/col cells sort after non-frozen ones, stable on
        // reading order otherwise.
        cells.sort_by_key(|c| ((c.is_frozen_row || c.is_frozen_col) as u8, c.row, c.col));

        let rows = (expanded.start_row..=expanded.end_row)
            .map(|r| RowPosition {
                row: r,
                top: self.rows.offset_of(r),
                height: self.rows.size_of(r),
                frozen: self.rows.is_frozen(r),
            })
            .collect();
        let columns = (expanded.start_col..=expanded.end_col)
            .map(|c| ColPosition {
                col: c,
                left: self.cols.offset_of(c),
                width: self.cols.size_of(c),
                frozen: self.cols.is_frozen(c),
            })
            .collect();
        let (sheet_rows, sheet_cols) = sheet_extent;
        let content_bounds = ContentBounds {
            width: self.cols.offset_of(sheet_cols),
            height: self.rows.offset_of(sheet_rows),
        };

        RenderFrame {
            cells,
            rows,
            columns,
            scroll,
            content_bounds,
            visible_range: *viewport,
            freeze_line_x: self.cols.freeze_line_position(),
            freeze_line_y: self.rows.freeze_line_position(),
            timestamp,
            zoom,
        }
    }
}

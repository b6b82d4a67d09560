//! FILENAME: src/painter.rs
//! PURPOSE: The format painter state machine: pick a source region's
//! formats, then apply them to a target, tiling the source pattern across
//! a larger target via a modulo offset.
//! CONTEXT: Property groupings follow `CellFormat`'s own fields
//! (font/fill/borders/alignment/numberFormat), reused here as the
//! `PaintPropertyFilter` selection the pick step captures.

use crate::error::{EngineError, EngineResult};
use crate::style::{CellFormat, PaintPropertyFilter};

/// A picked source pattern: a rectangular grid of formats, row-major, plus
/// its dimensions for the tiling offset.
#[derive(Debug, Clone, PartialEq)]
struct SourcePattern {
    rows: u32,
    cols: u32,
    formats: Vec<CellFormat>,
}

impl SourcePattern {
    fn single(format: CellFormat) -> Self {
        SourcePattern {
            rows: 1,
            cols: 1,
            formats: vec![format],
        }
    }

    /// The format at `(row_offset, col_offset)` cells past the target's
    /// anchor, tiling this pattern via a modulo offset.
    fn at(&self, row_offset: u32, col_offset: u32) -> &CellFormat {
        let r = row_offset % self.rows;
        let c = col_offset % self.cols;
        &self.formats[(r * self.cols + c) as usize]
    }
}

/// The painter's current mode.
#[derive(Debug, Clone, PartialEq)]
enum PainterState {
    Inactive,
    /// Picked once; the next apply deactivates the painter.
    Single { source: SourcePattern, filter: PaintPropertyFilter },
    /// Picked and pinned; stays active across repeated applies until
    /// explicitly deactivated.
    Persistent { source: SourcePattern, filter: PaintPropertyFilter },
}

/// The format painter.
pub struct FormatPainter {
    state: PainterState,
}

impl FormatPainter {
    pub fn new() -> Self {
        FormatPainter {
            state: PainterState::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, PainterState::Inactive)
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.state, PainterState::Persistent { .. })
    }

    /// Picks up a single cell's format to paint.
    pub fn pick(&mut self, source: CellFormat, filter: PaintPropertyFilter, persistent: bool) {
        self.pick_pattern(1, 1, vec![source], filter, persistent);
    }

    /// Picks up a rectangular block of formats (row-major) to paint,
    /// tiling it across a larger target.
    pub fn pick_pattern(&mut self, rows: u32, cols: u32, formats: Vec<CellFormat>, filter: PaintPropertyFilter, persistent: bool) {
        debug_assert_eq!(formats.len() as u32, rows * cols, "pattern dimensions must match format count");
        let source = SourcePattern { rows, cols, formats };
        self.state = if persistent {
            PainterState::Persistent { source, filter }
        } else {
            PainterState::Single { source, filter }
        };
        log::debug!("format painter picked (persistent={})", persistent);
    }

    pub fn deactivate(&mut self) {
        self.state = PainterState::Inactive;
    }

    /// Applies the picked pattern to every cell in `target`, tiling it from
    /// `target`'s top-left corner. Reads the destination's current format
    /// via `base_format` (so properties excluded by the filter fall back to
    /// what was already there) and writes the merged result via `apply`.
    /// Single-shot painters deactivate after this call; persistent painters
    /// remain active. Fails with `PainterInactive` if nothing has been
    /// picked yet.
    pub fn apply(
        &mut self,
        target_start_row: u32,
        target_start_col: u32,
        target_end_row: u32,
        target_end_col: u32,
        base_format: impl Fn(u32, u32) -> CellFormat,
        mut apply: impl FnMut(u32, u32, CellFormat),
    ) -> EngineResult<()> {
        let (source, filter) = match &self.state {
            PainterState::Inactive => return Err(EngineError::PainterInactive),
            PainterState::Single { source, filter } => (source.clone(), *filter),
            PainterState::Persistent { source, filter } => (source.clone(), *filter),
        };

        for row in target_start_row..=target_end_row {
            for col in target_start_col..=target_end_col {
                let picked = source.at(row - target_start_row, col - target_start_col);
                let base = base_format(row, col);
                let painted = filter.filtered(picked, &base);
                apply(row, col, painted);
            }
        }

        if matches!(self.state, PainterState::Single { .. }) {
            self.deactivate();
        }

        Ok(())
    }
}

impl Default for FormatPainter {
    fn default() -> Self {
        Self::new()
    }
}

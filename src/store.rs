//! FILENAME: src/store.rs
//! PURPOSE: The sparse cell store — the spreadsheet's primary data container.
//! CONTEXT: Uses the scalar `CellKey` for O(1) addressing instead of
//! tuple-keyed lookups, so a HashMap lookup never has to hash a compound
//! key. Tracks a memoized used-range bounding rectangle, invalidated lazily
//! on writes that could shrink it and recomputed on demand.

use std::collections::HashMap;

use crate::cell::{Cell, CellValue};
use crate::coord::{cell_key, key_to_coord, validate_coord, CellCoord, CellKey, CellRange};
use crate::error::EngineResult;

/// Sparse storage for spreadsheet cells, keyed by `CellKey` for O(1)
/// addressing.
#[derive(Debug, Clone)]
pub struct SparseCellStore {
    cells: HashMap<CellKey, Cell>,
    /// Cached used-range bounds; `None` means "needs recomputation".
    /// Invalidated whenever a write could shrink the range (a clear at a
    /// boundary) and recomputed lazily on the next `used_range()` call —
    /// growing writes update it in place without invalidation.
    used_range_cache: Option<CellRange>,
}

impl SparseCellStore {
    pub fn new() -> Self {
        SparseCellStore {
            cells: HashMap::new(),
            used_range_cache: None,
        }
    }

    /// Sets a cell at the given coordinates. Writing a cell whose value,
    /// formula, and overlays are all empty deletes the entry instead of
    /// storing a vacant placeholder.
    pub fn set_cell(&mut self, row: i64, col: i64, cell: Cell) -> EngineResult<()> {
        let (row, col) = validate_coord(row, col)?;
        let key = cell_key(row, col);

        if cell.is_vacant() {
            self.remove_key(key);
        } else {
            self.cells.insert(key, cell);
            self.grow_used_range(row, col);
        }
        Ok(())
    }

    /// Retrieves a reference to a cell. Returns `None` if nothing is stored
    /// there — callers should treat that the same as a default/empty cell.
    pub fn get_cell(&self, row: i64, col: i64) -> EngineResult<Option<&Cell>> {
        let (row, col) = validate_coord(row, col)?;
        Ok(self.cells.get(&cell_key(row, col)))
    }

    pub fn get_cell_or_default(&self, row: i64, col: i64) -> EngineResult<Cell> {
        Ok(self.get_cell(row, col)?.cloned().unwrap_or_default())
    }

    /// Removes a cell entirely (value, formula, and every overlay).
    pub fn clear_cell(&mut self, row: i64, col: i64) -> EngineResult<()> {
        let (row, col) = validate_coord(row, col)?;
        self.remove_key(cell_key(row, col));
        Ok(())
    }

    /// Sets only the value, preserving any existing format/borders/merge/
    /// validation overlay on that cell (distinct from `set_cell`, which
    /// replaces the cell wholesale).
    pub fn set_value(&mut self, row: i64, col: i64, value: CellValue) -> EngineResult<()> {
        let (row, col) = validate_coord(row, col)?;
        let key = cell_key(row, col);
        let mut cell = self.cells.remove(&key).unwrap_or_default();
        cell.value = value;
        if cell.is_vacant() {
            self.remove_key(key);
        } else {
            self.cells.insert(key, cell);
            self.grow_used_range(row, col);
        }
        Ok(())
    }

    fn remove_key(&mut self, key: CellKey) {
        let was_removed = self.cells.remove(&key).is_some();
        if was_removed {
            let (row, col) = key_to_coord(key);
            if self.touches_boundary(row, col) {
                self.used_range_cache = None;
            }
        }
    }

    fn touches_boundary(&self, row: u32, col: u32) -> bool {
        match self.used_range_cache {
            Some(range) => {
                row == range.start_row
                    || row == range.end_row
                    || col == range.start_col
                    || col == range.end_col
            }
            None => false,
        }
    }

    fn grow_used_range(&mut self, row: u32, col: u32) {
        self.used_range_cache = Some(match self.used_range_cache {
            Some(existing) => existing.union(&CellRange::single(row, col)),
            None => CellRange::single(row, col),
        });
    }

    /// The bounding rectangle of every non-vacant cell, or `None` if the
    /// store is empty. Recomputed by a full scan only when the cache has
    /// been invalidated by a boundary-shrinking clear.
    pub fn used_range(&mut self) -> Option<CellRange> {
        if self.used_range_cache.is_none() && !self.cells.is_empty() {
            self.used_range_cache = self.recompute_used_range();
        }
        self.used_range_cache
    }

    fn recompute_used_range(&self) -> Option<CellRange> {
        let mut iter = self.cells.keys().map(|&key| key_to_coord(key));
        let first = iter.next()?;
        let mut range = CellRange::single(first.0, first.1);
        for (row, col) in iter {
            range = range.union(&CellRange::single(row, col));
        }
        Some(range)
    }

    /// Number of non-vacant cells currently stored.
    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    /// `endRow - startRow + 1` over the used range — intentionally may
    /// overcount rows that are entirely empty inside the bounding
    /// rectangle. Returns 0 for an empty store.
    pub fn filtered_row_count_over_used_range(&mut self) -> u32 {
        match self.used_range() {
            Some(range) => range.row_span(),
            None => 0,
        }
    }

    /// Count of rows within the used range that have at least one
    /// non-vacant cell — the occupied-only counterpart to
    /// `filtered_row_count_over_used_range`.
    pub fn occupied_row_count(&self) -> usize {
        let mut rows: Vec<u32> = self
            .cells
            .keys()
            .map(|&key| key_to_coord(key).0)
            .collect();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    }

    /// Iterates every non-vacant cell within `range`, in row-major address
    /// order.
    pub fn iter_range<'a>(
        &'a self,
        range: &CellRange,
    ) -> impl Iterator<Item = (CellCoord, &'a Cell)> + 'a {
        range
            .cells()
            .filter_map(move |(row, col)| self.cells.get(&cell_key(row, col)).map(|c| ((row, col), c)))
    }

    /// Iterates every non-vacant cell in a single row, in column order.
    pub fn iter_row<'a>(&'a self, row: u32, range: &CellRange) -> impl Iterator<Item = (u32, &'a Cell)> + 'a {
        (range.start_col..=range.end_col)
            .filter_map(move |col| self.cells.get(&cell_key(row, col)).map(|c| (col, c)))
    }

    /// Iterates every non-vacant cell in a single column, in row order.
    pub fn iter_col<'a>(&'a self, col: u32, range: &CellRange) -> impl Iterator<Item = (u32, &'a Cell)> + 'a {
        (range.start_row..=range.end_row)
            .filter_map(move |row| self.cells.get(&cell_key(row, col)).map(|c| (row, c)))
    }

    /// Search for cells containing the query string.
    /// Returns coordinates sorted by row then column (reading order).
    pub fn find_all(
        &self,
        query: &str,
        case_sensitive: bool,
        match_entire_cell: bool,
        search_formulas: bool,
    ) -> Vec<CellCoord> {
        if query.is_empty() {
            return Vec::new();
        }

        let query_normalized = if case_sensitive {
            query.to_string()
        } else {
            query.to_lowercase()
        };

        let mut matches: Vec<CellCoord> = self
            .cells
            .iter()
            .filter(|(_, cell)| {
                self.cell_matches(cell, &query_normalized, case_sensitive, match_entire_cell, search_formulas)
            })
            .map(|(&key, _)| key_to_coord(key))
            .collect();

        matches.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        matches
    }

    fn cell_matches(
        &self,
        cell: &Cell,
        query: &str,
        case_sensitive: bool,
        match_entire_cell: bool,
        search_formulas: bool,
    ) -> bool {
        let display_value = cell.display_value();
        let display_normalized = if case_sensitive {
            display_value.clone()
        } else {
            display_value.to_lowercase()
        };

        let display_matches = if match_entire_cell {
            display_normalized == *query
        } else {
            display_normalized.contains(query)
        };

        if display_matches {
            return true;
        }

        if search_formulas {
            if let Some(ref formula) = cell.formula {
                let formula_normalized = if case_sensitive {
                    formula.clone()
                } else {
                    formula.to_lowercase()
                };

                return if match_entire_cell {
                    formula_normalized == *query
                } else {
                    formula_normalized.contains(query)
                };
            }
        }

        false
    }
}

impl Default for SparseCellStore {
    fn default() -> Self {
        Self::new()
    }
}

//! FILENAME: src/filter/manager.rs
//! PURPOSE: The filter manager — one predicate per column, AND-composed, with
//! an invalidation-driven result cache and an external subscribe surface.
//! CONTEXT: Column-state model follows an autofilter column-state shape
//! (`FilterOn` aspect tag carried over unevaluated) and its cache/version/
//! listener contract.

use std::collections::HashMap;

use crate::cell::Cell;
use crate::coord::CellRange;
use crate::filter::predicates::FilterPredicate;
use crate::subscription::Publisher;

/// What a column's filter state is comparing — only `Values` (a predicate)
/// is evaluated by this crate; the rest are recorded for a host application
/// to special-case.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOn {
    Values(FilterPredicate),
    TopItems(u32),
    BottomItems(u32),
    TopPercent(f64),
    BottomPercent(f64),
}

/// The per-column filter manager.
///
/// Only `FilterOn::Values` predicates participate in row visibility; other
/// aspects are stored for inspection but evaluation of top/bottom-by-column
/// is out of this crate's scope.
pub struct FilterManager {
    columns: HashMap<u32, FilterOn>,
    source_range: CellRange,
    cache: Option<Vec<u32>>,
    version: u64,
    publisher: Publisher,
}

impl FilterManager {
    pub fn new(source_range: CellRange) -> Self {
        FilterManager {
            columns: HashMap::new(),
            source_range,
            cache: None,
            version: 0,
            publisher: Publisher::new(),
        }
    }

    /// Sets (or replaces) the filter for a column and invalidates the
    /// cached visible-row set.
    pub fn set_column_filter(&mut self, col: u32, filter: FilterOn) {
        self.columns.insert(col, filter);
        self.invalidate();
    }

    pub fn clear_column_filter(&mut self, col: u32) {
        if self.columns.remove(&col).is_some() {
            self.invalidate();
        }
    }

    pub fn clear_all_filters(&mut self) {
        if !self.columns.is_empty() {
            self.columns.clear();
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        self.cache = None;
        self.version += 1;
        log::debug!("filter manager invalidated, version {}", self.version);
        self.publisher.notify();
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Subscribes to invalidation notifications; dropping the returned
    /// guard unsubscribes.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> crate::subscription::Unsubscribe {
        self.publisher.subscribe(listener)
    }

    /// Returns the currently visible row indices (relative to
    /// `source_range`), computing and caching them on first access after an
    /// invalidation.
    pub fn get_snapshot<'a>(&'a mut self, cells: impl Fn(u32, u32) -> Option<&'a Cell>) -> &'a [u32] {
        if self.cache.is_none() {
            self.cache = Some(self.compute_visible_rows(&cells));
        }
        self.cache.as_deref().unwrap()
    }

    fn compute_visible_rows<'a>(&self, cells: &impl Fn(u32, u32) -> Option<&'a Cell>) -> Vec<u32> {
        (self.source_range.start_row..=self.source_range.end_row)
            .filter(|&row| self.row_is_visible(row, cells))
            .collect()
    }

    fn row_is_visible<'a>(&self, row: u32, cells: &impl Fn(u32, u32) -> Option<&'a Cell>) -> bool {
        for (&col, filter) in &self.columns {
            if let FilterOn::Values(predicate) = filter {
                let cell = cells(row, col);
                let value = cell.map(|c| &c.value);
                let matched = match value {
                    Some(v) => predicate.test(v),
                    None => predicate.test(&crate::cell::CellValue::Empty),
                };
                if !matched {
                    return false;
                }
            }
        }
        true
    }

    /// `endRow - startRow + 1` over the source range, preserved even when a
    /// filter is active: callers needing the true visible-row count should
    /// use `get_snapshot().len()` instead.
    pub fn unfiltered_row_count(&self) -> u32 {
        self.source_range.row_span()
    }

    pub fn active_columns(&self) -> impl Iterator<Item = (&u32, &FilterOn)> {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellValue};
    use crate::filter::predicates::{FilterPredicate, NumberPredicate};
    use std::collections::HashMap as StdHashMap;

    fn make_cells(values: &[(u32, u32, f64)]) -> StdHashMap<(u32, u32), Cell> {
        values
            .iter()
            .map(|&(r, c, v)| ((r, c), Cell::new_number(v)))
            .collect()
    }

    #[test]
    fn test_filter_hides_non_matching_rows() {
        let cells = make_cells(&[(0, 0, 5.0), (1, 0, 15.0), (2, 0, 3.0)]);
        let mut mgr = FilterManager::new(CellRange::new(0, 0, 2, 0));
        mgr.set_column_filter(0, FilterOn::Values(FilterPredicate::Number(NumberPredicate::LessThan(10.0))));

        let visible = mgr.get_snapshot(|r, c| cells.get(&(r, c))).to_vec();
        assert_eq!(visible, vec![0, 2]);
    }

    #[test]
    fn test_cache_invalidated_on_filter_change() {
        let cells = make_cells(&[(0, 0, 5.0), (1, 0, 15.0)]);
        let mut mgr = FilterManager::new(CellRange::new(0, 0, 1, 0));
        mgr.set_column_filter(0, FilterOn::Values(FilterPredicate::Number(NumberPredicate::LessThan(10.0))));
        assert_eq!(mgr.get_snapshot(|r, c| cells.get(&(r, c))).to_vec(), vec![0]);

        let v1 = mgr.version();
        mgr.clear_column_filter(0);
        assert_ne!(mgr.version(), v1);
        assert_eq!(mgr.get_snapshot(|r, c| cells.get(&(r, c))).to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_subscribe_notified_on_invalidation() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let calls = Rc::new(RefCell::new(0));
        let calls_clone = calls.clone();

        let mut mgr = FilterManager::new(CellRange::new(0, 0, 1, 0));
        let _guard = mgr.subscribe(move || *calls_clone.borrow_mut() += 1);
        mgr.set_column_filter(0, FilterOn::Values(FilterPredicate::IsNotNull));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_unsubscribe_guard_stops_notifications() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let calls = Rc::new(RefCell::new(0));
        let calls_clone = calls.clone();

        let mut mgr = FilterManager::new(CellRange::new(0, 0, 1, 0));
        let guard = mgr.subscribe(move || *calls_clone.borrow_mut() += 1);
        drop(guard);
        mgr.set_column_filter(0, FilterOn::Values(FilterPredicate::IsNotNull));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_empty_cell_tested_against_predicate() {
        let cells: StdHashMap<(u32, u32), Cell> = StdHashMap::new();
        let mut mgr = FilterManager::new(CellRange::new(0, 0, 0, 0));
        mgr.set_column_filter(0, FilterOn::Values(FilterPredicate::IsNull));
        assert_eq!(mgr.get_snapshot(|r, c| cells.get(&(r, c))).to_vec(), vec![0]);
    }
}

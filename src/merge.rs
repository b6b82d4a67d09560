//! FILENAME: src/merge.rs
//! PURPOSE: The merge manager — tracks merged cell regions independently of
//! cell content.
//! CONTEXT: Grounded on the Tauri merge commands (`merge_cells`,
//! `unmerge_cells`, `get_merged_regions`, `get_merge_info`): normalize the
//! requested range, reject overlaps with existing merges, then record the
//! anchor (top-left) and every child coordinate it covers. Kept as a
//! standalone index (anchor -> span, child -> anchor) rather than folded
//! into the cell store, so the store and merge manager can be synced
//! independently.

use std::collections::HashMap;

use crate::coord::{CellCoord, CellRange};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone)]
struct MergeEntry {
    range: CellRange,
}

/// Tracks merged regions. The anchor is always the top-left cell of a
/// normalized range; every other cell in the range is a "child" that maps
/// back to its anchor.
#[derive(Debug, Clone, Default)]
pub struct MergeManager {
    anchors: HashMap<CellCoord, MergeEntry>,
    children: HashMap<CellCoord, CellCoord>,
}

impl MergeManager {
    pub fn new() -> Self {
        MergeManager {
            anchors: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Merges the given rectangle. The range is normalized first (swapped
    /// so start <= end); a single-cell range is rejected since merging
    /// requires at least two cells, and any overlap with an existing merge
    /// fails the whole operation rather than partially applying it.
    pub fn merge(&mut self, row_a: u32, col_a: u32, row_b: u32, col_b: u32) -> EngineResult<CellRange> {
        let range = CellRange::new(row_a, col_a, row_b, col_b);

        if range.is_single_cell() {
            return Err(EngineError::InvalidMerge {
                reason: "a merge must span at least two cells".to_string(),
                conflict_anchor: None,
            });
        }

        if let Some(conflict) = self.find_overlap(&range) {
            return Err(EngineError::InvalidMerge {
                reason: "range overlaps an existing merge".to_string(),
                conflict_anchor: Some(conflict),
            });
        }

        let anchor = (range.start_row, range.start_col);
        for coord in range.cells() {
            if coord != anchor {
                self.children.insert(coord, anchor);
            }
        }
        self.anchors.insert(anchor, MergeEntry { range });

        log::debug!("merged range {:?} anchored at {:?}", range, anchor);
        Ok(range)
    }

    /// Removes the merge anchored at (or covering) `row`/`col`. Fails with
    /// `NoMergeInRange` if no merge covers that cell.
    pub fn unmerge(&mut self, row: u32, col: u32) -> EngineResult<CellRange> {
        let anchor = self.anchor_for(row, col).ok_or(EngineError::NoMergeInRange)?;
        let entry = self.anchors.remove(&anchor).expect("anchor index consistent with lookup");
        for coord in entry.range.cells() {
            self.children.remove(&coord);
        }
        log::debug!("unmerged range {:?}", entry.range);
        Ok(entry.range)
    }

    /// Removes every merge that intersects the given rectangle, unlike
    /// `unmerge` which targets the single merge covering one cell. Fails
    /// with `NoMergeInRange` if none intersect; on success returns the
    /// removed ranges, anchor-sorted.
    pub fn unmerge_range(&mut self, row_a: u32, col_a: u32, row_b: u32, col_b: u32) -> EngineResult<Vec<CellRange>> {
        let range = CellRange::new(row_a, col_a, row_b, col_b);
        let hits = self.get_merges_in_range(&range);
        if hits.is_empty() {
            return Err(EngineError::NoMergeInRange);
        }
        for merge in &hits {
            let anchor = (merge.start_row, merge.start_col);
            if let Some(entry) = self.anchors.remove(&anchor) {
                for coord in entry.range.cells() {
                    self.children.remove(&coord);
                }
            }
        }
        log::debug!("unmerged {} range(s) intersecting {:?}", hits.len(), range);
        Ok(hits)
    }

    /// Toggles the merge state of a range: merges it if no merge in the
    /// range exists yet, unmerges the covering merge if one does.
    pub fn toggle_merge(&mut self, row_a: u32, col_a: u32, row_b: u32, col_b: u32) -> EngineResult<CellRange> {
        let range = CellRange::new(row_a, col_a, row_b, col_b);
        if let Some(anchor) = self.anchor_for(range.start_row, range.start_col) {
            if self.anchors[&anchor].range == range {
                return self.unmerge(range.start_row, range.start_col);
            }
        }
        self.merge(row_a, col_a, row_b, col_b)
    }

    fn find_overlap(&self, range: &CellRange) -> Option<CellCoord> {
        self.anchors
            .values()
            .find(|entry| entry.range.intersects(range))
            .map(|entry| (entry.range.start_row, entry.range.start_col))
    }

    fn anchor_for(&self, row: u32, col: u32) -> Option<CellCoord> {
        if self.anchors.contains_key(&(row, col)) {
            Some((row, col))
        } else {
            self.children.get(&(row, col)).copied()
        }
    }

    pub fn is_merged(&self, row: u32, col: u32) -> bool {
        self.anchor_for(row, col).is_some()
    }

    pub fn is_merge_anchor(&self, row: u32, col: u32) -> bool {
        self.anchors.contains_key(&(row, col))
    }

    pub fn is_merged_child(&self, row: u32, col: u32) -> bool {
        self.children.contains_key(&(row, col))
    }

    /// The full range of the merge covering (row, col), if any.
    pub fn get_merge_info(&self, row: u32, col: u32) -> Option<CellRange> {
        self.anchor_for(row, col).map(|anchor| self.anchors[&anchor].range)
    }

    pub fn get_merge_anchor(&self, row: u32, col: u32) -> Option<CellCoord> {
        self.anchor_for(row, col)
    }

    /// Every merged range currently tracked, anchor-sorted for deterministic
    /// iteration.
    pub fn get_all_merges(&self) -> Vec<CellRange> {
        let mut ranges: Vec<CellRange> = self.anchors.values().map(|e| e.range).collect();
        ranges.sort_by_key(|r| (r.start_row, r.start_col));
        ranges
    }

    /// Every merged range that intersects `range`.
    pub fn get_merges_in_range(&self, range: &CellRange) -> Vec<CellRange> {
        let mut out: Vec<CellRange> = self
            .anchors
            .values()
            .map(|e| e.range)
            .filter(|r| r.intersects(range))
            .collect();
        out.sort_by_key(|r| (r.start_row, r.start_col));
        out
    }

    /// The rectangle a merge at (row, col) should display as — the full
    /// merge range if merged, otherwise the single cell itself.
    pub fn get_display_range(&self, row: u32, col: u32) -> CellRange {
        self.get_merge_info(row, col).unwrap_or_else(|| CellRange::single(row, col))
    }

    /// The coordinate that edits to (row, col) should actually target: the
    /// anchor if the cell is merged, otherwise itself: writes to a merged
    /// child redirect to the anchor.
    pub fn get_edit_target(&self, row: u32, col: u32) -> CellCoord {
        self.anchor_for(row, col).unwrap_or((row, col))
    }

    /// Expands `range` to fully include every merge it partially overlaps,
    /// repeating until a fixed point is reached — no merge straddles the
    /// boundary.
    pub fn expand_range_to_include_merges(&self, range: CellRange) -> CellRange {
        let mut current = range;
        loop {
            let mut expanded = current;
            for merge in self.get_merges_in_range(&current) {
                expanded = expanded.union(&merge);
            }
            if expanded == current {
                return current;
            }
            current = expanded;
        }
    }

    /// Rebuilds the merge index from an explicit list of ranges — used when
    /// loading a document or reconciling after an external mutation to the
    /// cell store that the merge manager didn't observe directly.
    pub fn sync_from_ranges(&mut self, ranges: &[CellRange]) {
        self.anchors.clear();
        self.children.clear();
        for &range in ranges {
            let anchor = (range.start_row, range.start_col);
            for coord in range.cells() {
                if coord != anchor {
                    self.children.insert(coord, anchor);
                }
            }
            self.anchors.insert(anchor, MergeEntry { range });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_basic() {
        let mut mgr = MergeManager::new();
        let range = mgr.merge(0, 0, 1, 1).unwrap();
        assert_eq!(range, CellRange::new(0, 0, 1, 1));
        assert!(mgr.is_merge_anchor(0, 0));
        assert!(mgr.is_merged_child(0, 1));
        assert!(mgr.is_merged_child(1, 0));
        assert!(mgr.is_merged_child(1, 1));
    }

    #[test]
    fn test_merge_normalizes_reversed_corners() {
        let mut mgr = MergeManager::new();
        let range = mgr.merge(1, 1, 0, 0).unwrap();
        assert_eq!(range, CellRange::new(0, 0, 1, 1));
    }

    #[test]
    fn test_merge_rejects_single_cell() {
        let mut mgr = MergeManager::new();
        assert!(mgr.merge(0, 0, 0, 0).is_err());
    }

    #[test]
    fn test_merge_rejects_overlap() {
        let mut mgr = MergeManager::new();
        mgr.merge(0, 0, 1, 1).unwrap();
        let err = mgr.merge(1, 1, 2, 2).unwrap_err();
        match err {
            EngineError::InvalidMerge { conflict_anchor, .. } => {
                assert_eq!(conflict_anchor, Some((0, 0)));
            }
            _ => panic!("expected InvalidMerge"),
        }
    }

    #[test]
    fn test_unmerge_from_child_coordinate() {
        let mut mgr = MergeManager::new();
        mgr.merge(0, 0, 2, 2).unwrap();
        mgr.unmerge(1, 1).unwrap();
        assert!(!mgr.is_merged(0, 0));
        assert!(!mgr.is_merged(1, 1));
    }

    #[test]
    fn test_unmerge_no_merge_in_range_errors() {
        let mut mgr = MergeManager::new();
        assert!(matches!(mgr.unmerge(5, 5), Err(EngineError::NoMergeInRange)));
    }

    #[test]
    fn test_get_edit_target_redirects_to_anchor() {
        let mut mgr = MergeManager::new();
        mgr.merge(2, 2, 4, 4).unwrap();
        assert_eq!(mgr.get_edit_target(3, 3), (2, 2));
        assert_eq!(mgr.get_edit_target(2, 2), (2, 2));
        assert_eq!(mgr.get_edit_target(10, 10), (10, 10));
    }

    #[test]
    fn test_expand_range_to_include_merges_fixed_point() {
        let mut mgr = MergeManager::new();
        mgr.merge(0, 0, 1, 1).unwrap();
        mgr.merge(1, 2, 3, 3).unwrap();

        // A selection touching only the corner of the first merge and the
        // edge of the second should expand to cover both fully.
        let selection = CellRange::single(1, 1);
        let expanded = mgr.expand_range_to_include_merges(selection);
        assert_eq!(expanded, CellRange::new(0, 0, 1, 1));

        let selection2 = CellRange::new(1, 1, 1, 2);
        let expanded2 = mgr.expand_range_to_include_merges(selection2);
        assert_eq!(expanded2, CellRange::new(0, 0, 3, 3));
    }

    #[test]
    fn test_toggle_merge() {
        let mut mgr = MergeManager::new();
        mgr.toggle_merge(0, 0, 1, 1).unwrap();
        assert!(mgr.is_merged(0, 0));
        mgr.toggle_merge(0, 0, 1, 1).unwrap();
        assert!(!mgr.is_merged(0, 0));
    }

    #[test]
    fn test_unmerge_range_removes_every_intersecting_merge() {
        let mut mgr = MergeManager::new();
        mgr.merge(0, 0, 1, 1).unwrap();
        mgr.merge(1, 2, 2, 3).unwrap();
        mgr.merge(10, 10, 11, 11).unwrap();

        let removed = mgr.unmerge_range(0, 0, 2, 3).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!mgr.is_merged(0, 0));
        assert!(!mgr.is_merged(1, 2));
        assert!(mgr.is_merged(10, 10), "merge outside the target range survives");
    }

    #[test]
    fn test_unmerge_range_errors_when_nothing_intersects() {
        let mut mgr = MergeManager::new();
        mgr.merge(0, 0, 1, 1).unwrap();
        assert!(matches!(mgr.unmerge_range(5, 5, 6, 6), Err(EngineError::NoMergeInRange)));
    }

    #[test]
    fn test_get_merges_in_range() {
        let mut mgr = MergeManager::new();
        mgr.merge(0, 0, 1, 1).unwrap();
        mgr.merge(5, 5, 6, 6).unwrap();
        let found = mgr.get_merges_in_range(&CellRange::new(0, 0, 2, 2));
        assert_eq!(found.len(), 1);
    }
}

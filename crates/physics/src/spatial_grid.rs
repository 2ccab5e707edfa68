//! Uniform spatial hash grid for broad-phase pruning
//!
//! Cells are keyed by integer coordinates and hold arena slots. The grid is
//! rebuilt from scratch every sub-step.

use std::collections::HashMap;

use crate::types::{BoundingBox, Vec3};

pub type CellKey = (i32, i32, i32);

/// Bodies spanning more cells than this are kept in a separate list and
/// paired with everything instead of being written into each cell.
const MAX_CELLS_PER_BODY: i64 = 4096;

/// Statistics about the spatial grid
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SpatialGridStats {
    pub occupied_cells: usize,
    pub total_entries: usize,
    pub average_entries_per_cell: f32,
    pub oversized: usize,
}

#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    oversized: Vec<usize>,
    members: Vec<usize>,
}

impl SpatialGrid {
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Change the cell size. Clears the grid.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.oversized.clear();
        self.members.clear();
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, p: Vec3) -> CellKey {
        // `as` saturates, so far-away points land in the outermost cells.
        let c = |v: f32| (v / self.cell_size).floor() as i32;
        (c(p.x), c(p.y), c(p.z))
    }

    fn cell_range(&self, bounds: &BoundingBox) -> (CellKey, CellKey, i64) {
        let lo = self.cell_of(bounds.min);
        let hi = self.cell_of(bounds.max);
        let span = |a: i32, b: i32| i64::from(b) - i64::from(a) + 1;
        let count = span(lo.0, hi.0)
            .saturating_mul(span(lo.1, hi.1))
            .saturating_mul(span(lo.2, hi.2));
        (lo, hi, count)
    }

    /// Insert a slot into every cell its bounding box overlaps.
    pub fn insert(&mut self, slot: usize, bounds: &BoundingBox) {
        self.members.push(slot);
        let (lo, hi, count) = self.cell_range(bounds);
        if count > MAX_CELLS_PER_BODY {
            self.oversized.push(slot);
            return;
        }
        for z in lo.2..=hi.2 {
            for y in lo.1..=hi.1 {
                for x in lo.0..=hi.0 {
                    self.cells.entry((x, y, z)).or_default().push(slot);
                }
            }
        }
    }

    /// Slots sharing at least one cell with `bounds`, sorted and deduplicated.
    #[must_use]
    pub fn query(&self, bounds: &BoundingBox) -> Vec<usize> {
        let (lo, hi, count) = self.cell_range(bounds);
        let mut found = self.oversized.clone();
        if count > MAX_CELLS_PER_BODY {
            found.extend_from_slice(&self.members);
        } else {
            for z in lo.2..=hi.2 {
                for y in lo.1..=hi.1 {
                    for x in lo.0..=hi.0 {
                        if let Some(cell) = self.cells.get(&(x, y, z)) {
                            found.extend_from_slice(cell);
                        }
                    }
                }
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Every pair of slots sharing a cell, as `(lower, higher)`.
    ///
    /// Sorted and deduplicated so the result does not depend on hash order.
    #[must_use]
    pub fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for cell in self.cells.values() {
            for (i, &a) in cell.iter().enumerate() {
                for &b in &cell[i + 1..] {
                    if a != b {
                        pairs.push((a.min(b), a.max(b)));
                    }
                }
            }
        }
        for &a in &self.oversized {
            for &b in &self.members {
                if a != b {
                    pairs.push((a.min(b), a.max(b)));
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Get statistics about the grid
    #[must_use]
    pub fn stats(&self) -> SpatialGridStats {
        let occupied_cells = self.cells.len();
        let total_entries: usize = self.cells.values().map(Vec::len).sum();
        let average_entries_per_cell = if occupied_cells > 0 {
            total_entries as f32 / occupied_cells as f32
        } else {
            0.0
        };
        SpatialGridStats {
            occupied_cells,
            total_entries,
            average_entries_per_cell,
            oversized: self.oversized.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(center: Vec3, half: f32) -> BoundingBox {
        BoundingBox::from_center_half_extents(center, Vec3::splat(half))
    }

    #[test]
    fn body_spanning_cells_is_inserted_in_each() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(0, &cube(Vec3::ZERO, 0.5));
        // [-0.5, 0.5] on each axis touches cells -1 and 0.
        assert_eq!(grid.stats().occupied_cells, 8);
        assert_eq!(grid.stats().total_entries, 8);
    }

    #[test]
    fn close_bodies_pair_once_far_bodies_do_not() {
        let mut grid = SpatialGrid::new(4.0);
        grid.insert(0, &cube(Vec3::ZERO, 1.0));
        grid.insert(1, &cube(Vec3::new(1.5, 0.0, 0.0), 1.0));
        grid.insert(2, &cube(Vec3::new(30.0, 30.0, 30.0), 1.0));
        assert_eq!(grid.candidate_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn oversized_bodies_pair_with_everything() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(0, &cube(Vec3::ZERO, 1000.0));
        grid.insert(1, &cube(Vec3::new(500.0, 0.0, 0.0), 0.5));
        grid.insert(2, &cube(Vec3::new(-500.0, 0.0, 0.0), 0.5));
        assert_eq!(grid.candidate_pairs(), vec![(0, 1), (0, 2)]);
        assert_eq!(grid.stats().oversized, 1);
    }

    #[test]
    fn clear_empties_every_cell() {
        let mut grid = SpatialGrid::new(2.0);
        grid.insert(0, &cube(Vec3::ZERO, 1.0));
        grid.clear();
        assert_eq!(grid.stats(), SpatialGridStats::default());
        assert!(grid.query(&cube(Vec3::ZERO, 1.0)).is_empty());
    }
}

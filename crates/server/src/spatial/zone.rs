//! Zone: a 3D grid of cells.

use super::Cell;
use crate::ids::{ObjectId, ZoneId};
use crate::math::{Point, Vector};
use std::collections::HashMap;

/// Largest absolute cell coordinate any zone accepts.
pub const MAX_COORD: i32 = 1 << 28;

/// Inclusive cell-coordinate bounds of a bounded zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneBounds {
    pub min: Point,
    pub max: Point,
}

impl ZoneBounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }
}

/// Owns a grid of cells, materialized on first access.
///
/// `get_cell` materializes the whole 3x3x3 neighborhood of the requested
/// cell so adjacency queries from an occupied cell never allocate.
#[derive(Debug)]
pub struct Zone {
    id: ZoneId,
    cell_size: f64,
    bounds: Option<ZoneBounds>,
    cells: HashMap<Point, Cell>,
}

impl Zone {
    /// Create an unbounded zone.
    pub fn new(id: ZoneId, cell_size: f64) -> Self {
        Self {
            id,
            cell_size,
            bounds: None,
            cells: HashMap::with_capacity(1024),
        }
    }

    /// Create a zone that has no cells outside `bounds`.
    pub fn bounded(id: ZoneId, cell_size: f64, bounds: ZoneBounds) -> Self {
        Self {
            bounds: Some(bounds),
            ..Self::new(id, cell_size)
        }
    }

    #[inline]
    pub fn id(&self) -> ZoneId {
        self.id
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    #[inline]
    pub fn bounds(&self) -> Option<ZoneBounds> {
        self.bounds
    }

    /// Number of materialized cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell coordinate containing a world position.
    ///
    /// Casts saturate; non-finite axes map to `i32::MAX`, which no zone
    /// accepts.
    #[inline]
    pub fn point_of(&self, pos: Vector) -> Point {
        let s = self.cell_size;
        let axis = |v: f64| if v.is_finite() { (v / s).floor() as i32 } else { i32::MAX };
        Point::new(axis(pos.x), axis(pos.y), axis(pos.z))
    }

    /// World position of a cell's center.
    #[inline]
    pub fn center_of(&self, p: Point) -> Vector {
        let s = self.cell_size;
        Vector::new(
            (p.x as f64 + 0.5) * s,
            (p.y as f64 + 0.5) * s,
            (p.z as f64 + 0.5) * s,
        )
    }

    /// Within `MAX_COORD` on every axis and inside the bounds, if any.
    #[inline]
    pub fn in_bounds(&self, p: Point) -> bool {
        let limit = -MAX_COORD..=MAX_COORD;
        limit.contains(&p.x) && limit.contains(&p.y) && limit.contains(&p.z) && self.bounds.is_none_or(|b| b.contains(p))
    }

    /// Return the cell at `p`, creating it and its neighborhood if needed.
    ///
    /// Returns `None` for coordinates outside a bounded zone.
    pub fn get_cell(&mut self, p: Point) -> Option<&Cell> {
        if !self.materialize(p) {
            return None;
        }
        self.cells.get(&p)
    }

    /// Existing cell at `p`. Never allocates.
    #[inline]
    pub fn cell(&self, p: Point) -> Option<&Cell> {
        self.cells.get(&p)
    }

    /// Existing cell containing a world position.
    #[inline]
    pub fn cell_at(&self, pos: Vector) -> Option<&Cell> {
        self.cell(self.point_of(pos))
    }

    fn materialize(&mut self, p: Point) -> bool {
        if !self.in_bounds(p) {
            return false;
        }
        self.cells.entry(p).or_insert_with(|| Cell::new(p));
        for n in p.neighbors() {
            if self.in_bounds(n) {
                self.cells.entry(n).or_insert_with(|| Cell::new(n));
            }
        }
        true
    }

    /// Existing cells at Chebyshev distance 1 (at most 26).
    pub fn adjacent_cells(&self, p: Point) -> Vec<Point> {
        p.neighbors().filter(|n| self.cells.contains_key(n)).collect()
    }

    /// True when both cells exist and are distinct neighbors.
    pub fn are_adjacent(&self, a: Point, b: Point) -> bool {
        self.cells.contains_key(&a) && self.cells.contains_key(&b) && a.chebyshev(b) == 1
    }

    /// Existing cells within Chebyshev `radius` of `center`, center included.
    pub fn cells_within(&self, center: Point, radius: u32) -> Vec<Point> {
        let r = radius as i32;
        let mut out = Vec::new();
        for dz in -r..=r {
            for dy in -r..=r {
                for dx in -r..=r {
                    let p = center.offset(dx, dy, dz);
                    if self.cells.contains_key(&p) {
                        out.push(p);
                    }
                }
            }
        }
        out
    }

    /// Mark a cell walkable or not. Returns false outside bounds.
    pub fn set_walkable(&mut self, p: Point, walkable: bool) -> bool {
        if !self.materialize(p) {
            return false;
        }
        if let Some(cell) = self.cells.get_mut(&p) {
            cell.set_walkable(walkable);
        }
        true
    }

    /// Mark a cell as blocking line of sight. Returns false outside bounds.
    pub fn set_blocks_vision(&mut self, p: Point, blocks: bool) -> bool {
        if !self.materialize(p) {
            return false;
        }
        if let Some(cell) = self.cells.get_mut(&p) {
            cell.set_blocks_vision(blocks);
        }
        true
    }

    /// Walkable means the cell exists and its flag is set.
    #[inline]
    pub fn is_walkable(&self, p: Point) -> bool {
        self.cells.get(&p).is_some_and(Cell::is_walkable)
    }

    /// Coordinates of every existing walkable cell, in no particular order.
    pub fn walkable_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.cells.values().filter(|c| c.is_walkable()).map(Cell::point)
    }

    /// Materialize every cell inside the bounds. No-op for unbounded zones.
    pub fn fill(&mut self) {
        let Some(b) = self.bounds else {
            return;
        };
        for z in b.min.z..=b.max.z {
            for y in b.min.y..=b.max.y {
                for x in b.min.x..=b.max.x {
                    let p = Point::new(x, y, z);
                    self.cells.entry(p).or_insert_with(|| Cell::new(p));
                }
            }
        }
    }

    pub(crate) fn insert_member(&mut self, p: Point, id: ObjectId) -> bool {
        if !self.materialize(p) {
            return false;
        }
        self.cells.get_mut(&p).is_some_and(|c| c.insert(id))
    }

    pub(crate) fn remove_member(&mut self, p: Point, id: ObjectId) -> bool {
        self.cells.get_mut(&p).is_some_and(|c| c.remove(id))
    }

    /// Move membership between two existing cells.
    pub(crate) fn relocate_member(&mut self, id: ObjectId, from: Point, to: Point) -> bool {
        if !self.materialize(to) {
            return false;
        }
        self.remove_member(from, id);
        self.cells.get_mut(&to).is_some_and(|c| c.insert(id))
    }
}

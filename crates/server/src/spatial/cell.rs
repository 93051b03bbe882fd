//! A single grid cell.

use crate::ids::ObjectId;
use crate::math::Point;
use std::collections::HashSet;

/// Fixed-size unit of the spatial partition.
///
/// Membership is a secondary index; the world owns the objects.
#[derive(Debug, Clone)]
pub struct Cell {
    point: Point,
    members: HashSet<ObjectId>,
    walkable: bool,
    blocks_vision: bool,
}

impl Cell {
    pub(crate) fn new(point: Point) -> Self {
        Self {
            point,
            members: HashSet::new(),
            walkable: true,
            blocks_vision: false,
        }
    }

    #[inline]
    pub fn point(&self) -> Point {
        self.point
    }

    #[inline]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.members.contains(&id)
    }

    /// Iterate current members.
    pub fn members(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.members.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[inline]
    pub fn is_walkable(&self) -> bool {
        self.walkable
    }

    #[inline]
    pub fn blocks_vision(&self) -> bool {
        self.blocks_vision
    }

    pub(crate) fn set_walkable(&mut self, walkable: bool) {
        self.walkable = walkable;
    }

    pub(crate) fn set_blocks_vision(&mut self, blocks: bool) {
        self.blocks_vision = blocks;
    }

    pub(crate) fn insert(&mut self, id: ObjectId) -> bool {
        self.members.insert(id)
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> bool {
        self.members.remove(&id)
    }
}

//! Visibility engine.
//!
//! The sight calculator is a pure function of the zone's current
//! contents: it scans the cube of cells around the observer and, when
//! ray casting is enabled, drops every cell whose line from the center
//! passes through a vision-blocking cell. The blocking cell itself stays
//! visible.

use crate::entity::Vision;
use crate::ids::ObjectId;
use crate::math::Point;
use crate::spatial::Zone;
use std::collections::BTreeSet;

/// Computes visible cells and objects within one zone.
#[derive(Debug, Clone, Copy)]
pub struct SightCalculator<'a> {
    zone: &'a Zone,
}

impl<'a> SightCalculator<'a> {
    pub fn new(zone: &'a Zone) -> Self {
        Self { zone }
    }

    /// Cells within Chebyshev `radius` of `center`, pruned by line of sight
    /// when `ray_cast` is set.
    pub fn visible_cells(&self, center: Point, radius: u32, ray_cast: bool) -> Vec<Point> {
        let mut cells = self.zone.cells_within(center, radius);
        if ray_cast {
            cells.retain(|&p| self.line_of_sight(center, p));
        }
        cells
    }

    /// Every object in a visible cell, the observer included.
    pub fn visible_objects(&self, center: Point, radius: u32, ray_cast: bool) -> BTreeSet<ObjectId> {
        let mut out = BTreeSet::new();
        for p in self.visible_cells(center, radius, ray_cast) {
            if let Some(cell) = self.zone.cell(p) {
                out.extend(cell.members());
            }
        }
        out
    }

    /// True when no cell strictly between `from` and `to` blocks vision.
    pub fn line_of_sight(&self, from: Point, to: Point) -> bool {
        let path = ray(from, to);
        let Some((_, between)) = path.split_last() else {
            return true;
        };
        between
            .iter()
            .all(|&p| self.zone.cell(p).is_none_or(|c| !c.blocks_vision()))
    }
}

/// Cells visited by a 3D Bresenham line, excluding `from`, including `to`.
pub fn ray(from: Point, to: Point) -> Vec<Point> {
    let a = [from.x, from.y, from.z];
    let b = [to.x, to.y, to.z];
    let d = [(b[0] - a[0]).abs(), (b[1] - a[1]).abs(), (b[2] - a[2]).abs()];
    let s = [(b[0] - a[0]).signum(), (b[1] - a[1]).signum(), (b[2] - a[2]).signum()];

    let major = if d[0] >= d[1] && d[0] >= d[2] {
        0
    } else if d[1] >= d[2] {
        1
    } else {
        2
    };
    let m1 = (major + 1) % 3;
    let m2 = (major + 2) % 3;

    let mut cur = a;
    let mut e1 = 2 * d[m1] - d[major];
    let mut e2 = 2 * d[m2] - d[major];
    let mut out = Vec::with_capacity(d[major] as usize);
    for _ in 0..d[major] {
        cur[major] += s[major];
        if e1 >= 0 {
            cur[m1] += s[m1];
            e1 -= 2 * d[major];
        }
        if e2 >= 0 {
            cur[m2] += s[m2];
            e2 -= 2 * d[major];
        }
        e1 += 2 * d[m1];
        e2 += 2 * d[m2];
        out.push(Point::new(cur[0], cur[1], cur[2]));
    }
    out
}

/// Objects that entered and left an observer's view this tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityDelta {
    pub appeared: Vec<ObjectId>,
    pub vanished: Vec<ObjectId>,
}

impl VisibilityDelta {
    pub fn is_empty(&self) -> bool {
        self.appeared.is_empty() && self.vanished.is_empty()
    }
}

/// Replace the observer's stored set with `current` and report the diff.
pub fn refresh(vision: &mut Vision, current: BTreeSet<ObjectId>) -> VisibilityDelta {
    let appeared = current.difference(&vision.visible).copied().collect();
    let vanished = vision.visible.difference(&current).copied().collect();
    vision.visible = current;
    VisibilityDelta { appeared, vanished }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ZoneId;

    fn zone_with(members: &[(Point, u32)]) -> Zone {
        let mut zone = Zone::new(ZoneId(0), 10.0);
        for &(p, id) in members {
            zone.insert_member(p, ObjectId(id));
        }
        zone
    }

    #[test]
    fn test_ray_reaches_target() {
        let r = ray(Point::new(0, 0, 0), Point::new(3, 1, -2));
        assert_eq!(r.last(), Some(&Point::new(3, 1, -2)));
        assert_eq!(r.len(), 3);
        for w in r.windows(2) {
            assert_eq!(w[0].chebyshev(w[1]), 1);
        }
        assert!(ray(Point::new(1, 1, 1), Point::new(1, 1, 1)).is_empty());
    }

    #[test]
    fn test_shared_cell_is_mutually_visible_at_radius_zero() {
        let p = Point::new(0, 0, 0);
        let zone = zone_with(&[(p, 1), (p, 2)]);
        let sight = SightCalculator::new(&zone);
        let seen = sight.visible_objects(p, 0, true);
        assert!(seen.contains(&ObjectId(1)));
        assert!(seen.contains(&ObjectId(2)));
    }

    #[test]
    fn test_boundary_radius_is_inclusive() {
        let zone = zone_with(&[(Point::new(0, 0, 0), 1), (Point::new(2, 0, 0), 2), (Point::new(3, 0, 0), 3)]);
        let seen = SightCalculator::new(&zone).visible_objects(Point::new(0, 0, 0), 2, false);
        assert!(seen.contains(&ObjectId(2)));
        assert!(!seen.contains(&ObjectId(3)));
    }

    #[test]
    fn test_blocking_cell_hides_what_is_behind_it() {
        let a = Point::new(0, 0, 0);
        let wall = Point::new(1, 0, 0);
        let b = Point::new(2, 0, 0);
        let mut zone = zone_with(&[(a, 1), (wall, 2), (b, 3)]);
        zone.set_blocks_vision(wall, true);

        let seen = SightCalculator::new(&zone).visible_objects(a, 2, true);
        assert!(seen.contains(&ObjectId(2)), "blocking cell itself is visible");
        assert!(!seen.contains(&ObjectId(3)));

        // Without ray casting the cube scan sees through.
        let seen = SightCalculator::new(&zone).visible_objects(a, 2, false);
        assert!(seen.contains(&ObjectId(3)));

        zone.set_blocks_vision(wall, false);
        let seen = SightCalculator::new(&zone).visible_objects(a, 2, true);
        assert!(seen.contains(&ObjectId(3)));
    }

    #[test]
    fn test_refresh_diff_composes() {
        let mut vision = Vision::new(1, false);
        let first: BTreeSet<_> = [ObjectId(1), ObjectId(2)].into_iter().collect();
        let delta = refresh(&mut vision, first.clone());
        assert_eq!(delta.appeared, vec![ObjectId(1), ObjectId(2)]);
        assert!(delta.vanished.is_empty());

        let second: BTreeSet<_> = [ObjectId(2), ObjectId(3)].into_iter().collect();
        let delta = refresh(&mut vision, second.clone());
        assert_eq!(delta.appeared, vec![ObjectId(3)]);
        assert_eq!(delta.vanished, vec![ObjectId(1)]);

        // visible(now) = (visible(prev) + appeared) - vanished
        let mut rebuilt = first;
        rebuilt.extend(delta.appeared.iter().copied());
        for id in &delta.vanished {
            rebuilt.remove(id);
        }
        assert_eq!(&rebuilt, vision.visible());
        assert_eq!(rebuilt, second);
    }
}

//! Movement engine.
//!
//! Continuous-time displacement with at most one cell transition per
//! step. Cell membership changes only through this module and through
//! `World::add_object` / `World::remove_object`.

use crate::entity::{Geometry, Placement, Timing};
use crate::ids::ObjectId;
use crate::math::{step, Point, Vector};
use crate::spatial::Zone;
use crate::time::Timestamp;

/// Result of one movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Idle, or no time elapsed.
    Stayed,
    /// Moved within the same cell.
    Moved,
    /// Moved into a neighboring cell.
    Relocated { from: Point, to: Point },
    /// Destination missing, unwalkable or too far; orientation forced idle.
    Blocked,
}

/// Advance `geometry` from `timing.last_update_start` to `now`.
pub fn advance(
    id: ObjectId,
    geometry: &mut Geometry,
    timing: &Timing,
    placement: &mut Placement,
    zone: &mut Zone,
    now: Timestamp,
) -> MoveOutcome {
    if geometry.orientation.is_idle() {
        return MoveOutcome::Stayed;
    }
    let elapsed = now.secs_since(timing.last_update_start);
    if elapsed <= 0.0 {
        return MoveOutcome::Stayed;
    }

    let target = step(geometry.position, &geometry.orientation, geometry.speed * elapsed);
    match place(id, geometry, placement, zone, target) {
        Some(outcome) => outcome,
        None => {
            geometry.orientation = geometry.orientation.stopped();
            MoveOutcome::Blocked
        }
    }
}

/// Move to `target` if it lies in the current cell or in a walkable
/// neighbor. Returns `None`, leaving everything untouched, otherwise.
pub fn place(
    id: ObjectId,
    geometry: &mut Geometry,
    placement: &mut Placement,
    zone: &mut Zone,
    target: Vector,
) -> Option<MoveOutcome> {
    let from = placement.cell;
    let to = zone.point_of(target);
    if to == from {
        geometry.position = target;
        return Some(MoveOutcome::Moved);
    }
    if !can_enter(zone, from, to) {
        return None;
    }
    if !zone.relocate_member(id, from, to) {
        return None;
    }
    placement.cell = to;
    geometry.position = target;
    Some(MoveOutcome::Relocated { from, to })
}

/// One-cell transition check.
#[inline]
pub fn can_enter(zone: &Zone, from: Point, to: Point) -> bool {
    zone.is_walkable(to) && zone.are_adjacent(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ZoneId;
    use crate::math::{Orientation, RelativeAngle};
    use crate::spatial::ZoneBounds;

    fn setup(position: Vector, speed: f64) -> (Zone, Geometry, Placement, Timing) {
        let mut zone = Zone::new(ZoneId(0), 10.0);
        let cell = zone.point_of(position);
        zone.insert_member(cell, ObjectId(1));
        let geometry = Geometry {
            position,
            orientation: Orientation::new(0.0, RelativeAngle::Front),
            speed,
        };
        let placement = Placement { zone: ZoneId(0), cell };
        (zone, geometry, placement, Timing::default())
    }

    #[test]
    fn test_idle_does_not_move() {
        let (mut zone, mut g, mut p, t) = setup(Vector::new(5.0, 5.0, 0.0), 10.0);
        g.orientation = Orientation::IDLE;
        let out = advance(ObjectId(1), &mut g, &t, &mut p, &mut zone, Timestamp(1000));
        assert_eq!(out, MoveOutcome::Stayed);
        assert_eq!(g.position, Vector::new(5.0, 5.0, 0.0));
    }

    #[test]
    fn test_moves_speed_times_elapsed() {
        let (mut zone, mut g, mut p, t) = setup(Vector::new(1.0, 5.0, 0.0), 10.0);
        let out = advance(ObjectId(1), &mut g, &t, &mut p, &mut zone, Timestamp(100));
        assert_eq!(out, MoveOutcome::Moved);
        assert!((g.position.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_crossing_one_cell_relocates() {
        let (mut zone, mut g, mut p, t) = setup(Vector::new(8.0, 5.0, 0.0), 10.0);
        let out = advance(ObjectId(1), &mut g, &t, &mut p, &mut zone, Timestamp(500));
        assert_eq!(
            out,
            MoveOutcome::Relocated { from: Point::new(0, 0, 0), to: Point::new(1, 0, 0) }
        );
        assert!(zone.cell(p.cell).unwrap().contains(ObjectId(1)));
        assert!(!zone.cell(Point::new(0, 0, 0)).unwrap().contains(ObjectId(1)));
        assert_eq!(zone.point_of(g.position), p.cell);
    }

    #[test]
    fn test_crossing_two_cells_is_blocked() {
        let (mut zone, mut g, mut p, t) = setup(Vector::new(5.0, 5.0, 0.0), 100.0);
        let before = g.position;
        let out = advance(ObjectId(1), &mut g, &t, &mut p, &mut zone, Timestamp(250));
        assert_eq!(out, MoveOutcome::Blocked);
        assert_eq!(g.position, before);
        assert!(g.orientation.is_idle());
        assert!(zone.cell(p.cell).unwrap().contains(ObjectId(1)));
    }

    #[test]
    fn test_bounded_edge_and_walls_block() {
        let bounds = ZoneBounds::new(Point::new(0, 0, 0), Point::new(1, 0, 0));
        let mut zone = Zone::bounded(ZoneId(0), 10.0, bounds);
        zone.insert_member(Point::new(1, 0, 0), ObjectId(1));
        let mut g = Geometry {
            position: Vector::new(19.0, 5.0, 0.0),
            orientation: Orientation::new(0.0, RelativeAngle::Front),
            speed: 10.0,
        };
        let mut p = Placement { zone: ZoneId(0), cell: Point::new(1, 0, 0) };
        let out = advance(ObjectId(1), &mut g, &Timing::default(), &mut p, &mut zone, Timestamp(200));
        assert_eq!(out, MoveOutcome::Blocked);

        // Walking back west into a wall.
        zone.set_walkable(Point::new(0, 0, 0), false);
        g.orientation = Orientation::new(std::f64::consts::PI, RelativeAngle::Front);
        g.position = Vector::new(11.0, 5.0, 0.0);
        let out = advance(ObjectId(1), &mut g, &Timing::default(), &mut p, &mut zone, Timestamp(200));
        assert_eq!(out, MoveOutcome::Blocked);
        assert_eq!(g.position, Vector::new(11.0, 5.0, 0.0));
    }
}

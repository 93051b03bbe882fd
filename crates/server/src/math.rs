//! Position, heading and grid coordinate value types.

use glam::DVec3;

pub use protocol::messages::RelativeAngle;

/// A world-space position or displacement.
pub type Vector = DVec3;

/// Absolute heading plus the movement direction relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// Heading in radians, counter-clockwise from +x.
    pub absolute: f64,
    pub relative: RelativeAngle,
}

impl Orientation {
    pub const IDLE: Orientation = Orientation { absolute: 0.0, relative: RelativeAngle::Idle };

    pub fn new(absolute: f64, relative: RelativeAngle) -> Self {
        Self { absolute, relative }
    }

    /// Same heading, no movement.
    #[inline]
    pub fn stopped(self) -> Self {
        Self { absolute: self.absolute, relative: RelativeAngle::Idle }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.relative.is_idle()
    }

    /// Unit vector of travel in the horizontal plane, or zero when idle.
    pub fn step_vector(&self) -> Vector {
        match self.relative.offset() {
            Some(offset) => {
                let angle = self.absolute + offset;
                Vector::new(angle.cos(), angle.sin(), 0.0)
            }
            None => Vector::ZERO,
        }
    }

    /// Face and walk from `from` toward `to`.
    pub fn toward(from: Vector, to: Vector) -> Self {
        let d = to - from;
        Self::new(d.y.atan2(d.x), RelativeAngle::Front)
    }
}

/// Step `distance` units from `from` along `orientation`.
#[inline]
pub fn step(from: Vector, orientation: &Orientation, distance: f64) -> Vector {
    from + orientation.step_vector() * distance
}

/// Integer cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy), self.z.saturating_add(dz))
    }

    /// Chebyshev distance (max of per-axis distances).
    #[inline]
    pub fn chebyshev(self, other: Point) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx.max(dy).max(dz)
    }

    /// The 26 surrounding coordinates.
    pub fn neighbors(self) -> impl Iterator<Item = Point> {
        (-1..=1).flat_map(move |dz| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).filter_map(move |dx| {
                    if dx == 0 && dy == 0 && dz == 0 {
                        None
                    } else {
                        Some(self.offset(dx, dy, dz))
                    }
                })
            })
        })
    }
}

impl From<[i32; 3]> for Point {
    fn from(v: [i32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_has_no_step() {
        let o = Orientation::new(1.0, RelativeAngle::Idle);
        assert_eq!(o.step_vector(), Vector::ZERO);
        assert_eq!(step(Vector::new(3.0, 4.0, 0.0), &o, 100.0), Vector::new(3.0, 4.0, 0.0));
    }

    #[test]
    fn test_east_front_steps_along_x() {
        let o = Orientation::new(0.0, RelativeAngle::Front);
        let p = step(Vector::ZERO, &o, 2.0);
        assert_eq!(p, Vector::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_relative_angle_rotates_heading() {
        // Facing east, walking left goes north (+y).
        let o = Orientation::new(0.0, RelativeAngle::Left);
        let p = step(Vector::ZERO, &o, 1.0);
        assert!((p - Vector::new(0.0, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_neighbors_and_chebyshev() {
        let origin = Point::new(0, 0, 0);
        let n: Vec<Point> = origin.neighbors().collect();
        assert_eq!(n.len(), 26);
        assert!(n.iter().all(|p| p.chebyshev(origin) == 1));
        assert_eq!(Point::new(3, -1, 0).chebyshev(origin), 3);
    }

    #[test]
    fn test_extreme_points_do_not_overflow() {
        let edge = Point::new(i32::MAX, 0, 0);
        assert_eq!(edge.offset(1, 0, 0), edge);
        assert_eq!(Point::new(i32::MIN, 0, 0).chebyshev(edge), u32::MAX);
    }
}

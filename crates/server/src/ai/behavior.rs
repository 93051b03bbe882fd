//! Scripted NPC behaviours.
//!
//! Behaviours only choose an orientation and keep their own state; the
//! movement engine does the stepping.

use super::Pathfinder;
use crate::ids::ObjectId;
use crate::math::{Orientation, Point, Vector};
use crate::spatial::Zone;
use crate::time::Timestamp;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// What an NPC can perceive on its turn.
#[derive(Debug, Clone, Copy)]
pub struct Senses<'a> {
    pub now: Timestamp,
    pub cell: Point,
    pub position: Vector,
    pub orientation: Orientation,
    /// Players in the NPC's visible set with their current cells.
    pub players_in_view: &'a [(ObjectId, Point)],
    pub zone: &'a Zone,
    pub pathfinder: &'a Pathfinder,
}

/// NPC behaviour component.
#[derive(Debug, Clone)]
pub enum Behavior {
    Aggressive(Aggressive),
    Wanders(Wanders),
}

impl Behavior {
    /// Decide this tick's orientation.
    pub fn think(&mut self, senses: &Senses<'_>) -> Orientation {
        match self {
            Behavior::Aggressive(a) => a.think(senses),
            Behavior::Wanders(w) => w.think(senses),
        }
    }
}

/// Chase state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggroState {
    #[default]
    Idle,
    Pursuing,
    Returning,
}

/// Chases the first player it sees, then walks back home.
#[derive(Debug, Clone, Default)]
pub struct Aggressive {
    state: AggroState,
    target: Option<ObjectId>,
    last_known: Option<Point>,
    home: Option<Point>,
    path: VecDeque<Point>,
}

impl Aggressive {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> AggroState {
        self.state
    }

    #[inline]
    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    fn think(&mut self, senses: &Senses<'_>) -> Orientation {
        drain_reached(&mut self.path, senses.cell);
        match self.state {
            AggroState::Idle => {
                if self.target.is_none() {
                    if let Some(&(id, at)) = senses.players_in_view.first() {
                        debug!("NPC at {:?} starts chasing {}", senses.cell, id);
                        self.target = Some(id);
                        self.last_known = Some(at);
                        self.home = Some(senses.cell);
                        self.state = AggroState::Pursuing;
                        self.plot(senses, at);
                    }
                }
            }
            AggroState::Pursuing => {
                if self.path.is_empty() {
                    let sighting = self
                        .target
                        .and_then(|t| senses.players_in_view.iter().find(|(id, _)| *id == t));
                    match sighting {
                        Some(&(_, at)) => {
                            self.last_known = Some(at);
                            self.plot(senses, at);
                        }
                        None => {
                            debug!("NPC at {:?} lost its target, returning", senses.cell);
                            self.target = None;
                            self.last_known = None;
                            self.state = AggroState::Returning;
                            if let Some(home) = self.home {
                                self.plot(senses, home);
                            }
                        }
                    }
                }
            }
            AggroState::Returning => {
                if self.path.is_empty() {
                    self.state = AggroState::Idle;
                    self.home = None;
                }
            }
        }
        steer(&self.path, senses)
    }

    fn plot(&mut self, senses: &Senses<'_>, goal: Point) {
        self.path = senses.pathfinder.find_path(senses.zone, senses.cell, goal).into();
    }
}

/// Walks a round-robin list of targets, pausing between legs.
#[derive(Debug, Clone)]
pub struct Wanders {
    targets: Vec<Point>,
    next: usize,
    dwell: Duration,
    idle_since: Option<Timestamp>,
    path: VecDeque<Point>,
}

impl Wanders {
    pub fn new(targets: Vec<Point>, dwell: Duration) -> Self {
        Self {
            targets,
            next: 0,
            dwell,
            idle_since: None,
            path: VecDeque::new(),
        }
    }

    /// Remaining cells of the current leg.
    pub fn path(&self) -> &VecDeque<Point> {
        &self.path
    }

    fn think(&mut self, senses: &Senses<'_>) -> Orientation {
        drain_reached(&mut self.path, senses.cell);
        if self.path.is_empty() && !self.targets.is_empty() {
            let since = *self.idle_since.get_or_insert(senses.now);
            if senses.now.saturating_sub(since) >= self.dwell {
                let goal = self.targets[self.next];
                self.next = (self.next + 1) % self.targets.len();
                self.path = senses.pathfinder.find_path(senses.zone, senses.cell, goal).into();
                self.idle_since = if self.path.is_empty() { Some(senses.now) } else { None };
            }
        }
        steer(&self.path, senses)
    }
}

/// Drop waypoints the NPC is already standing in.
fn drain_reached(path: &mut VecDeque<Point>, cell: Point) {
    if path.contains(&cell) {
        while let Some(p) = path.pop_front() {
            if p == cell {
                break;
            }
        }
    }
}

/// Head for the next waypoint's center, or stand still.
fn steer(path: &VecDeque<Point>, senses: &Senses<'_>) -> Orientation {
    match path.front() {
        Some(&next) => {
            let mut goal = senses.zone.center_of(next);
            goal.z = senses.position.z;
            Orientation::toward(senses.position, goal)
        }
        None => senses.orientation.stopped(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ZoneId;
    use crate::math::RelativeAngle;
    use crate::spatial::ZoneBounds;

    fn grid() -> Zone {
        let bounds = ZoneBounds::new(Point::new(0, 0, 0), Point::new(9, 9, 0));
        let mut zone = Zone::bounded(ZoneId(0), 10.0, bounds);
        zone.fill();
        zone
    }

    fn senses<'a>(zone: &'a Zone, pf: &'a Pathfinder, cell: Point, now: u64, view: &'a [(ObjectId, Point)]) -> Senses<'a> {
        let mut position = zone.center_of(cell);
        position.z = 0.0;
        Senses {
            now: Timestamp(now),
            cell,
            position,
            orientation: Orientation::IDLE,
            players_in_view: view,
            zone,
            pathfinder: pf,
        }
    }

    #[test]
    fn test_aggressive_lifecycle() {
        let zone = grid();
        let pf = Pathfinder::new(1024);
        let home = Point::new(0, 0, 0);
        let mut npc = Aggressive::new();

        // Nothing in view: stays idle.
        let o = npc.think(&senses(&zone, &pf, home, 0, &[]));
        assert!(o.is_idle());
        assert_eq!(npc.state(), AggroState::Idle);

        // A player shows up three cells east.
        let player = ObjectId(42);
        let view = [(player, Point::new(3, 0, 0))];
        let o = npc.think(&senses(&zone, &pf, home, 20, &view));
        assert_eq!(npc.state(), AggroState::Pursuing);
        assert_eq!(npc.target(), Some(player));
        assert_eq!(o.relative, RelativeAngle::Front);
        assert!(o.absolute.abs() < 1e-9, "heads east");

        // Reached last-known cell while the player moved on: path refreshed.
        let view = [(player, Point::new(3, 3, 0))];
        let o = npc.think(&senses(&zone, &pf, Point::new(3, 0, 0), 40, &view));
        assert_eq!(npc.state(), AggroState::Pursuing);
        assert!(!o.is_idle());

        // Reached it again and the player is gone: head home.
        let o = npc.think(&senses(&zone, &pf, Point::new(3, 3, 0), 60, &[]));
        assert_eq!(npc.state(), AggroState::Returning);
        assert_eq!(npc.target(), None);
        assert!(!o.is_idle());

        // Back home: idle again.
        let o = npc.think(&senses(&zone, &pf, home, 80, &[]));
        assert_eq!(npc.state(), AggroState::Idle);
        assert!(o.is_idle());
    }

    #[test]
    fn test_wanders_waits_then_cycles_targets() {
        let zone = grid();
        let pf = Pathfinder::new(1024);
        let a = Point::new(2, 0, 0);
        let b = Point::new(0, 2, 0);
        let mut npc = Wanders::new(vec![a, b], Duration::from_millis(100));
        let start = Point::new(0, 0, 0);

        // Dwell not elapsed yet.
        assert!(npc.think(&senses(&zone, &pf, start, 1_000, &[])).is_idle());
        assert!(npc.think(&senses(&zone, &pf, start, 1_050, &[])).is_idle());

        // Dwell elapsed: leg toward `a`.
        let o = npc.think(&senses(&zone, &pf, start, 1_100, &[]));
        assert!(!o.is_idle());
        assert_eq!(npc.path().back(), Some(&a));

        // Arrived at `a`: idle, then next leg goes to `b`.
        assert!(npc.think(&senses(&zone, &pf, a, 1_500, &[])).is_idle());
        let o = npc.think(&senses(&zone, &pf, a, 1_600, &[]));
        assert!(!o.is_idle());
        assert_eq!(npc.path().back(), Some(&b));
    }
}

//! Reconciliation of client movement claims.
//!
//! A claim carries the client's orientation, its uncorrected position and
//! the time of the change. The server extrapolates the claim to `now` and
//! accepts it only if the result is walkable and the claim is plausible
//! against what the server itself predicted. Anything else becomes a
//! forced state for that client.

use crate::config::Config;
use crate::entity::{Geometry, MoveState, Placement, Timing};
use crate::math::step;
use crate::movement::can_enter;
use crate::spatial::Zone;
use crate::time::Timestamp;

/// Slack for comparisons that are equal in exact arithmetic.
const EPSILON: f64 = 1e-9;

/// Policy limits, derived from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Length of one tick in seconds.
    pub tick_secs: f64,
    /// Allowed drift from the server's own prediction, in ticks of movement.
    pub prediction_tolerance: f64,
    /// Largest allowed extrapolation, in ticks of movement.
    pub max_correction: f64,
}

impl Tolerances {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick_secs: config.tick_duration().as_secs_f64(),
            prediction_tolerance: config.reconcile.prediction_tolerance,
            max_correction: config.reconcile.max_correction,
        }
    }
}

/// Why a claim was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The extrapolated position is not on a reachable walkable cell.
    Unwalkable,
    /// The claim drifted too far from the server's view, or is stale.
    Implausible,
}

/// Outcome of evaluating one claim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Commit this state.
    Accepted(MoveState),
    /// Commit nothing; deliver this correction.
    Forced(MoveState, Rejection),
}

/// Evaluate `claim` against the actor's committed state.
pub fn evaluate(
    geometry: &Geometry,
    timing: &Timing,
    placement: &Placement,
    zone: &Zone,
    claim: &MoveState,
    now: Timestamp,
    tol: &Tolerances,
) -> Verdict {
    let speed = geometry.speed;
    let time_past = now.secs_since(claim.timestamp);
    let expected = step(claim.position, &claim.orientation, speed * time_past);

    let target = zone.point_of(expected);
    let walkable = zone.is_walkable(target) && (target == placement.cell || can_enter(zone, placement.cell, target));
    if !walkable {
        let forced = MoveState::new(geometry.orientation.stopped(), geometry.position, timing.last_update_start);
        return Verdict::Forced(forced, Rejection::Unwalkable);
    }

    let one_tick = speed * tol.tick_secs;
    let predicted = step(
        geometry.position,
        &geometry.orientation,
        speed * claim.timestamp.secs_since(timing.last_update_start),
    );
    let drift_ok = claim.position.distance(predicted) <= one_tick * tol.prediction_tolerance + EPSILON;
    let reach_ok = time_past >= 0.0 && claim.position.distance(expected) <= one_tick * tol.max_correction + EPSILON;
    if !(drift_ok && reach_ok) {
        let forced = MoveState::new(geometry.orientation, geometry.position, timing.last_update_start);
        return Verdict::Forced(forced, Rejection::Implausible);
    }

    Verdict::Accepted(MoveState::new(claim.orientation, expected, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ObjectId, ZoneId};
    use crate::math::{Orientation, Point, RelativeAngle, Vector};

    const TICK_MS: u64 = 20;

    fn tolerances() -> Tolerances {
        Tolerances {
            tick_secs: TICK_MS as f64 / 1000.0,
            prediction_tolerance: 0.1,
            max_correction: 1.0,
        }
    }

    fn idle_actor(position: Vector, at: Timestamp) -> (Zone, Geometry, Timing, Placement) {
        let mut zone = Zone::new(ZoneId(0), 10.0);
        let cell = zone.point_of(position);
        zone.insert_member(cell, ObjectId(1));
        let geometry = Geometry {
            position,
            orientation: Orientation::IDLE,
            speed: 10.0,
        };
        let timing = Timing {
            last_update_start: at,
            last_update_end: at,
        };
        (zone, geometry, timing, Placement { zone: ZoneId(0), cell })
    }

    fn east() -> Orientation {
        Orientation::new(0.0, RelativeAngle::Front)
    }

    #[test]
    fn test_in_tolerance_claim_commits_expected_position() {
        let start = Vector::new(5.0, 5.0, 0.0);
        let (zone, g, t, p) = idle_actor(start, Timestamp(1_000));
        let claim = MoveState::new(east(), start, Timestamp(1_000));
        let now = Timestamp(1_010);
        match evaluate(&g, &t, &p, &zone, &claim, now, &tolerances()) {
            Verdict::Accepted(state) => {
                assert_eq!(state.position, step(start, &east(), 10.0 * now.secs_since(claim.timestamp)));
                assert_eq!(state.orientation, east());
                assert_eq!(state.timestamp, now);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn test_one_tick_passes_and_more_is_forced() {
        let start = Vector::new(5.0, 5.0, 0.0);
        let (zone, g, t, p) = idle_actor(start, Timestamp(1_000));
        let claim = MoveState::new(east(), start, Timestamp(1_000));

        // Exactly one tick of movement.
        let now = Timestamp(1_000 + TICK_MS);
        assert!(matches!(
            evaluate(&g, &t, &p, &zone, &claim, now, &tolerances()),
            Verdict::Accepted(_)
        ));

        // 1.1 ticks.
        let now = Timestamp(1_022);
        match evaluate(&g, &t, &p, &zone, &claim, now, &tolerances()) {
            Verdict::Forced(state, Rejection::Implausible) => {
                assert_eq!(state.position, start);
                assert_eq!(state.orientation, g.orientation);
                assert_eq!(state.timestamp, Timestamp(1_000));
            }
            other => panic!("expected forced state, got {other:?}"),
        }
    }

    #[test]
    fn test_claim_far_from_prediction_is_forced() {
        let start = Vector::new(5.0, 5.0, 0.0);
        let (zone, g, t, p) = idle_actor(start, Timestamp(1_000));
        // Tolerance is 10 * 0.02 * 0.1 = 0.02 units.
        let claim = MoveState::new(east(), Vector::new(5.5, 5.0, 0.0), Timestamp(1_000));
        assert!(matches!(
            evaluate(&g, &t, &p, &zone, &claim, Timestamp(1_000), &tolerances()),
            Verdict::Forced(_, Rejection::Implausible)
        ));
    }

    #[test]
    fn test_prediction_follows_prior_orientation() {
        let start = Vector::new(1.0, 5.0, 0.0);
        let (zone, mut g, t, p) = idle_actor(start, Timestamp(1_000));
        g.orientation = east();
        // Actor walked east for 100ms on its own; client stops there.
        let claim = MoveState::new(Orientation::new(0.0, RelativeAngle::Idle), Vector::new(2.0, 5.0, 0.0), Timestamp(1_100));
        match evaluate(&g, &t, &p, &zone, &claim, Timestamp(1_105), &tolerances()) {
            Verdict::Accepted(state) => assert_eq!(state.position, Vector::new(2.0, 5.0, 0.0)),
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn test_unwalkable_destination_forces_idle() {
        let start = Vector::new(9.99, 5.0, 0.0);
        let (mut zone, mut g, t, p) = idle_actor(start, Timestamp(1_000));
        g.orientation = Orientation::new(1.0, RelativeAngle::Idle);
        zone.set_walkable(Point::new(1, 0, 0), false);
        let claim = MoveState::new(east(), start, Timestamp(1_000));
        match evaluate(&g, &t, &p, &zone, &claim, Timestamp(1_010), &tolerances()) {
            Verdict::Forced(state, Rejection::Unwalkable) => {
                assert!(state.orientation.is_idle());
                assert_eq!(state.position, start);
            }
            other => panic!("expected unwalkable, got {other:?}"),
        }
    }

    #[test]
    fn test_claim_from_the_future_is_forced() {
        let start = Vector::new(5.0, 5.0, 0.0);
        let (zone, g, t, p) = idle_actor(start, Timestamp(1_000));
        let claim = MoveState::new(east(), start, Timestamp(1_010));
        assert!(matches!(
            evaluate(&g, &t, &p, &zone, &claim, Timestamp(1_000), &tolerances()),
            Verdict::Forced(_, Rejection::Implausible)
        ));
    }
}

//! Capability components.

use crate::ids::{ConnectionId, ObjectId, ZoneId};
use crate::math::{Orientation, Point, Vector};
use crate::time::Timestamp;
use std::collections::{BTreeSet, VecDeque};

/// What an object is, as reported to clients.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Client-controlled actor.
    Player = 1,
    /// Server-controlled actor.
    Npc = 2,
    /// Static object.
    Item = 3,
}

impl ObjectKind {
    #[inline]
    pub fn type_id(self) -> u16 {
        self as u16
    }

    /// Players and NPCs move; items do not.
    #[inline]
    pub fn is_actor(self) -> bool {
        !matches!(self, ObjectKind::Item)
    }
}

/// Identity of an object.
#[derive(Debug, Clone)]
pub struct Identification {
    pub(super) id: Option<ObjectId>,
    pub name: String,
    pub kind: ObjectKind,
}

/// Where an object is and how it moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub position: Vector,
    pub orientation: Orientation,
    /// Rated speed in units per second.
    pub speed: f64,
}

/// Last update bracket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timing {
    pub last_update_start: Timestamp,
    pub last_update_end: Timestamp,
}

/// Zone and cell back-reference, owned by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub zone: ZoneId,
    pub cell: Point,
}

/// Sight radius and the set seen at the end of the last completed tick.
#[derive(Debug, Clone, Default)]
pub struct Vision {
    /// Radius in cells.
    pub radius: u32,
    /// Prune the cube scan with line-of-sight rays.
    pub ray_cast: bool,
    pub(crate) visible: BTreeSet<ObjectId>,
}

impl Vision {
    pub fn new(radius: u32, ray_cast: bool) -> Self {
        Self {
            radius,
            ray_cast,
            visible: BTreeSet::new(),
        }
    }

    /// Objects visible at the end of the last tick.
    pub fn visible(&self) -> &BTreeSet<ObjectId> {
        &self.visible
    }

    #[inline]
    pub fn sees(&self, id: ObjectId) -> bool {
        self.visible.contains(&id)
    }
}

/// Movement state: used for client claims, corrections and notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveState {
    pub orientation: Orientation,
    pub position: Vector,
    pub timestamp: Timestamp,
}

impl MoveState {
    pub fn new(orientation: Orientation, position: Vector, timestamp: Timestamp) -> Self {
        Self { orientation, position, timestamp }
    }
}

/// Remote control by a client connection.
#[derive(Debug, Clone)]
pub struct Controller {
    pub connection: ConnectionId,
    /// Claims waiting for this actor's turn.
    pub(crate) pending: VecDeque<MoveState>,
    /// Correction waiting to be delivered.
    pub(crate) forced: Option<MoveState>,
    /// Whether the move speed was announced to the connection.
    pub(crate) speed_announced: bool,
}

impl Controller {
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            pending: VecDeque::new(),
            forced: None,
            speed_announced: false,
        }
    }

    pub fn queue(&mut self, claim: MoveState) {
        self.pending.push_back(claim);
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Correction scheduled but not yet delivered.
    pub fn forced(&self) -> Option<&MoveState> {
        self.forced.as_ref()
    }

    /// Take the pending correction; a correction is delivered once.
    pub(crate) fn take_forced(&mut self) -> Option<MoveState> {
        self.forced.take()
    }
}

//! Contract-violation errors.
//!
//! Recoverable per-entity conditions (blocked movement, failed
//! reconciliation, unreachable paths) never show up here.

use crate::ids::{ConnectionId, ObjectId, ZoneId};
use crate::math::Point;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("object already has id {0}")]
    IdAlreadyAssigned(ObjectId),

    #[error("object id read before assignment")]
    IdNotAssigned,

    #[error("id {0} is already registered")]
    DuplicateId(ObjectId),

    #[error("id {0} was retired and cannot be reused")]
    RetiredId(ObjectId),

    #[error("{0} is already registered")]
    ZoneInUse(ZoneId),

    #[error("unknown object {0}")]
    UnknownObject(ObjectId),

    #[error("unknown {0}")]
    UnknownZone(ZoneId),

    #[error("no cell at {0:?} in {1}")]
    NoCell(Point, ZoneId),

    #[error("{0} has no actor in the world")]
    UnknownConnection(ConnectionId),

    #[error("{0} is already bound to an actor")]
    ConnectionInUse(ConnectionId),
}

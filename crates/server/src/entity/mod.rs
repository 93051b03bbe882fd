//! Entity model.
//!
//! One object type composed of independent components. Movement,
//! visibility, reconciliation and behaviour are systems that read and
//! write these components; nothing here knows about the others.

mod components;
mod object;

pub use components::{Controller, Geometry, Identification, MoveState, ObjectKind, Placement, Timing, Vision};
pub use object::WorldObject;

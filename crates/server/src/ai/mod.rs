//! NPC pathfinding and behaviour.

mod behavior;
mod pathfinder;

pub use behavior::{Aggressive, AggroState, Behavior, Senses, Wanders};
pub use pathfinder::Pathfinder;

//! Authoritative world simulation core.
//!
//! Spatial partition, movement, visibility, client reconciliation and
//! NPC behaviour, driven by a fixed-rate tick loop.

pub mod ai;
pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod math;
pub mod movement;
pub mod reconcile;
pub mod server;
pub mod spatial;
pub mod time;
pub mod visibility;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use error::WorldError;
pub use ids::{ConnectionId, ObjectId, ZoneId};
pub use server::{run, Command, Outbound, ServerHandle};
pub use world::{World, WorldStats};

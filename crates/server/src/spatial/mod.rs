//! Spatial partition.
//!
//! A zone is a lazily materialized 3D grid of fixed-size cells.

mod cell;
mod zone;

pub use cell::Cell;
pub use zone::{Zone, ZoneBounds, MAX_COORD};

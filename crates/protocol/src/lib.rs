//! Shared protocol crate for the world simulation server.
//!
//! This crate contains:
//! - Binary reading/writing utilities
//! - Inbound and outbound message shapes
//! - The message registry mapping opcodes to message kinds

mod binary;
mod error;
pub mod messages;
mod registry;

pub use binary::{BinaryReader, BinaryWriter};
pub use error::ProtocolError;
pub use registry::{MessageKind, MessageRegistry};

/// A world-space position using glam's DVec3.
pub type Position = glam::DVec3;

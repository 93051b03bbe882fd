//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message opcode: {0:#04x}")]
    InvalidOpcode(u8),

    #[error("Unexpected end of data")]
    UnexpectedEof,

    #[error("Opcode {0:#04x} is not valid in this direction")]
    WrongDirection(u8),

    #[error("Invalid relative angle code: {0}")]
    InvalidAngle(u8),
}

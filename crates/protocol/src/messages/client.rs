//! Client -> Server messages.

use super::RelativeAngle;
use crate::{BinaryReader, BinaryWriter, MessageKind, ProtocolError};

/// A client's claim that its actor changed movement state.
///
/// The position is the client's own, uncorrected position at
/// `time_of_change`; the height coordinate is implied by the actor.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChangeRequest {
    pub relative_angle: RelativeAngle,
    pub absolute_angle: f64,
    pub x: f64,
    pub y: f64,
    /// Milliseconds on the server clock.
    pub time_of_change: u64,
}

/// Parsed client message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Log in with credentials (0x01).
    Login { username: String, password: String },
    /// Leave the world (0x02).
    Logout,
    /// Movement state change (0x10).
    StateChange(StateChangeRequest),
}

impl ClientMessage {
    /// The registry kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            ClientMessage::Login { .. } => MessageKind::Login,
            ClientMessage::Logout => MessageKind::Logout,
            ClientMessage::StateChange(_) => MessageKind::StateChangeRequest,
        }
    }

    pub(crate) fn write_body(&self, w: &mut BinaryWriter) {
        match self {
            ClientMessage::Login { username, password } => {
                w.put_string_utf8(username);
                w.put_string_utf8(password);
            }
            ClientMessage::Logout => {}
            ClientMessage::StateChange(req) => {
                w.put_u8(req.relative_angle.code());
                w.put_f64(req.absolute_angle);
                w.put_f64(req.x);
                w.put_f64(req.y);
                w.put_u64(req.time_of_change);
            }
        }
    }

    pub(crate) fn read_body(kind: MessageKind, r: &mut BinaryReader) -> Result<Self, ProtocolError> {
        match kind {
            MessageKind::Login => {
                let username = r.get_string_utf8()?;
                let password = r.get_string_utf8()?;
                Ok(ClientMessage::Login { username, password })
            }
            MessageKind::Logout => Ok(ClientMessage::Logout),
            MessageKind::StateChangeRequest => {
                let relative_angle = RelativeAngle::from_code(r.get_u8()?)?;
                Ok(ClientMessage::StateChange(StateChangeRequest {
                    relative_angle,
                    absolute_angle: r.get_f64()?,
                    x: r.get_f64()?,
                    y: r.get_f64()?,
                    time_of_change: r.get_u64()?,
                }))
            }
            other => Err(ProtocolError::WrongDirection(other.opcode())),
        }
    }
}

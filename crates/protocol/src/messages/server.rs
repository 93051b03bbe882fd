//! Server -> Client messages.

use super::RelativeAngle;
use crate::{BinaryReader, BinaryWriter, MessageKind, Position, ProtocolError};

/// Full description of an object sent when it becomes visible.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSnapshot {
    pub id: u32,
    pub name: String,
    pub type_id: u16,
    pub position: Position,
    pub relative_angle: RelativeAngle,
    pub absolute_angle: f64,
    pub speed: f64,
    /// Server time the snapshot was taken at.
    pub observed_at: u64,
}

/// Message built by the simulation for one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// A mobile actor became visible (0x20).
    ActorVisible(ObjectSnapshot),
    /// A static object became visible (0x21).
    ObjectVisible(ObjectSnapshot),
    /// An object left the observer's view (0x22).
    ObjectInvisible { id: u32 },
    /// A visible actor committed a new movement state (0x30).
    StateChange {
        id: u32,
        relative_angle: RelativeAngle,
        absolute_angle: f64,
        time_of_change: u64,
        position: Position,
    },
    /// Authoritative correction of the receiver's own actor (0x31).
    ForceState {
        relative_angle: RelativeAngle,
        absolute_angle: f64,
        position: Position,
        time_of_force: u64,
    },
    /// Rated speed of the receiver's own actor (0x32).
    ActorMoveSpeed { move_speed: f64 },
}

impl ServerMessage {
    /// The registry kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            ServerMessage::ActorVisible(_) => MessageKind::ActorVisible,
            ServerMessage::ObjectVisible(_) => MessageKind::ObjectVisible,
            ServerMessage::ObjectInvisible { .. } => MessageKind::ObjectInvisible,
            ServerMessage::StateChange { .. } => MessageKind::StateChange,
            ServerMessage::ForceState { .. } => MessageKind::ForceState,
            ServerMessage::ActorMoveSpeed { .. } => MessageKind::ActorMoveSpeed,
        }
    }

    pub(crate) fn write_body(&self, w: &mut BinaryWriter) {
        match self {
            ServerMessage::ActorVisible(snap) | ServerMessage::ObjectVisible(snap) => {
                w.put_u32(snap.id);
                w.put_string_utf8(&snap.name);
                w.put_u16(snap.type_id);
                put_position(w, snap.position);
                w.put_u8(snap.relative_angle.code());
                w.put_f64(snap.absolute_angle);
                w.put_f64(snap.speed);
                w.put_u64(snap.observed_at);
            }
            ServerMessage::ObjectInvisible { id } => w.put_u32(*id),
            ServerMessage::StateChange { id, relative_angle, absolute_angle, time_of_change, position } => {
                w.put_u32(*id);
                w.put_u8(relative_angle.code());
                w.put_f64(*absolute_angle);
                w.put_u64(*time_of_change);
                put_position(w, *position);
            }
            ServerMessage::ForceState { relative_angle, absolute_angle, position, time_of_force } => {
                w.put_u8(relative_angle.code());
                w.put_f64(*absolute_angle);
                put_position(w, *position);
                w.put_u64(*time_of_force);
            }
            ServerMessage::ActorMoveSpeed { move_speed } => w.put_f64(*move_speed),
        }
    }

    pub(crate) fn read_body(kind: MessageKind, r: &mut BinaryReader) -> Result<Self, ProtocolError> {
        match kind {
            MessageKind::ActorVisible | MessageKind::ObjectVisible => {
                let snap = ObjectSnapshot {
                    id: r.get_u32()?,
                    name: r.get_string_utf8()?,
                    type_id: r.get_u16()?,
                    position: get_position(r)?,
                    relative_angle: RelativeAngle::from_code(r.get_u8()?)?,
                    absolute_angle: r.get_f64()?,
                    speed: r.get_f64()?,
                    observed_at: r.get_u64()?,
                };
                if kind == MessageKind::ActorVisible {
                    Ok(ServerMessage::ActorVisible(snap))
                } else {
                    Ok(ServerMessage::ObjectVisible(snap))
                }
            }
            MessageKind::ObjectInvisible => Ok(ServerMessage::ObjectInvisible { id: r.get_u32()? }),
            MessageKind::StateChange => Ok(ServerMessage::StateChange {
                id: r.get_u32()?,
                relative_angle: RelativeAngle::from_code(r.get_u8()?)?,
                absolute_angle: r.get_f64()?,
                time_of_change: r.get_u64()?,
                position: get_position(r)?,
            }),
            MessageKind::ForceState => Ok(ServerMessage::ForceState {
                relative_angle: RelativeAngle::from_code(r.get_u8()?)?,
                absolute_angle: r.get_f64()?,
                position: get_position(r)?,
                time_of_force: r.get_u64()?,
            }),
            MessageKind::ActorMoveSpeed => Ok(ServerMessage::ActorMoveSpeed { move_speed: r.get_f64()? }),
            other => Err(ProtocolError::WrongDirection(other.opcode())),
        }
    }
}

fn put_position(w: &mut BinaryWriter, p: Position) {
    w.put_f64(p.x);
    w.put_f64(p.y);
    w.put_f64(p.z);
}

fn get_position(r: &mut BinaryReader) -> Result<Position, ProtocolError> {
    Ok(Position::new(r.get_f64()?, r.get_f64()?, r.get_f64()?))
}

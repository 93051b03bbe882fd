//! Opcode registry.
//!
//! A `MessageRegistry` is built once by whoever owns the transport and
//! passed by reference to the codec calls. Dropping it is the teardown.

use crate::messages::{ClientMessage, ServerMessage};
use crate::{BinaryReader, BinaryWriter, ProtocolError};
use bytes::Bytes;
use std::collections::HashMap;

/// Every message kind the protocol knows about.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Client login with credentials.
    Login = 0x01,
    /// Client logout.
    Logout = 0x02,
    /// Client movement claim.
    StateChangeRequest = 0x10,
    /// Newly visible actor.
    ActorVisible = 0x20,
    /// Newly visible static object.
    ObjectVisible = 0x21,
    /// Newly invisible object.
    ObjectInvisible = 0x22,
    /// Committed state change of a visible actor.
    StateChange = 0x30,
    /// Forced correction.
    ForceState = 0x31,
    /// Own actor speed.
    ActorMoveSpeed = 0x32,
}

impl MessageKind {
    pub const ALL: [MessageKind; 9] = [
        MessageKind::Login,
        MessageKind::Logout,
        MessageKind::StateChangeRequest,
        MessageKind::ActorVisible,
        MessageKind::ObjectVisible,
        MessageKind::ObjectInvisible,
        MessageKind::StateChange,
        MessageKind::ForceState,
        MessageKind::ActorMoveSpeed,
    ];

    #[inline]
    pub fn opcode(self) -> u8 {
        self as u8
    }

    /// Whether this kind travels client -> server.
    #[inline]
    pub fn is_inbound(self) -> bool {
        matches!(self, MessageKind::Login | MessageKind::Logout | MessageKind::StateChangeRequest)
    }
}

/// Opcode -> kind table for one transport instance.
#[derive(Debug, Clone)]
pub struct MessageRegistry {
    by_opcode: HashMap<u8, MessageKind>,
}

impl MessageRegistry {
    /// Build a registry accepting only the given kinds.
    pub fn new(kinds: &[MessageKind]) -> Self {
        let by_opcode = kinds.iter().map(|&k| (k.opcode(), k)).collect();
        Self { by_opcode }
    }

    /// Registry with every known kind.
    pub fn standard() -> Self {
        Self::new(&MessageKind::ALL)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.by_opcode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_opcode.is_empty()
    }

    /// Resolve an opcode to a registered kind.
    pub fn kind_of(&self, opcode: u8) -> Result<MessageKind, ProtocolError> {
        self.by_opcode
            .get(&opcode)
            .copied()
            .ok_or(ProtocolError::InvalidOpcode(opcode))
    }

    fn split(&self, data: &[u8]) -> Result<(MessageKind, BinaryReader), ProtocolError> {
        let (&opcode, body) = data.split_first().ok_or(ProtocolError::UnexpectedEof)?;
        let kind = self.kind_of(opcode)?;
        Ok((kind, BinaryReader::new(Bytes::copy_from_slice(body))))
    }

    /// Decode a client -> server message.
    pub fn decode_client(&self, data: &[u8]) -> Result<ClientMessage, ProtocolError> {
        let (kind, mut reader) = self.split(data)?;
        if !kind.is_inbound() {
            return Err(ProtocolError::WrongDirection(kind.opcode()));
        }
        ClientMessage::read_body(kind, &mut reader)
    }

    /// Encode a client -> server message.
    pub fn encode_client(&self, msg: &ClientMessage) -> Bytes {
        let mut w = BinaryWriter::new();
        w.put_u8(msg.kind().opcode());
        msg.write_body(&mut w);
        w.finish()
    }

    /// Decode a server -> client message.
    pub fn decode_server(&self, data: &[u8]) -> Result<ServerMessage, ProtocolError> {
        let (kind, mut reader) = self.split(data)?;
        if kind.is_inbound() {
            return Err(ProtocolError::WrongDirection(kind.opcode()));
        }
        ServerMessage::read_body(kind, &mut reader)
    }

    /// Encode a server -> client message.
    pub fn encode_server(&self, msg: &ServerMessage) -> Bytes {
        let mut w = BinaryWriter::new();
        w.put_u8(msg.kind().opcode());
        msg.write_body(&mut w);
        w.finish()
    }
}

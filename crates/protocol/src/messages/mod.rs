//! Message definitions exchanged with the transport layer.
//!
//! This module contains both client->server and server->client message types.

mod client;
mod server;

pub use client::*;
pub use server::*;

use crate::ProtocolError;

/// Movement direction relative to an actor's absolute heading.
///
/// `Idle` is the distinguished "no movement" direction.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum RelativeAngle {
    Front = 0,
    FrontRight = 1,
    Right = 2,
    BackRight = 3,
    Back = 4,
    BackLeft = 5,
    Left = 6,
    FrontLeft = 7,
    #[default]
    Idle = 8,
}

impl RelativeAngle {
    /// Decode a wire code.
    pub fn from_code(code: u8) -> Result<Self, ProtocolError> {
        Ok(match code {
            0 => Self::Front,
            1 => Self::FrontRight,
            2 => Self::Right,
            3 => Self::BackRight,
            4 => Self::Back,
            5 => Self::BackLeft,
            6 => Self::Left,
            7 => Self::FrontLeft,
            8 => Self::Idle,
            other => return Err(ProtocolError::InvalidAngle(other)),
        })
    }

    /// Wire code of this direction.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Offset in radians added to the absolute heading, counter-clockwise
    /// positive. `None` for `Idle`.
    pub fn offset(self) -> Option<f64> {
        use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
        match self {
            Self::Front => Some(0.0),
            Self::FrontLeft => Some(FRAC_PI_4),
            Self::Left => Some(FRAC_PI_2),
            Self::BackLeft => Some(3.0 * FRAC_PI_4),
            Self::Back => Some(PI),
            Self::BackRight => Some(-3.0 * FRAC_PI_4),
            Self::Right => Some(-FRAC_PI_2),
            Self::FrontRight => Some(-FRAC_PI_4),
            Self::Idle => None,
        }
    }

    #[inline]
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

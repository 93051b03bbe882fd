//! Login seam.
//!
//! Credential checks and account storage live outside the simulation.
//! The world only needs to know whether a login is admitted and where the
//! new actor appears.

use crate::config::Config;
use crate::ids::ZoneId;
use crate::math::Vector;

/// Where and as whom an admitted login enters the world.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginGrant {
    pub name: String,
    pub position: Vector,
    pub zone: ZoneId,
}

/// Decides whether a login is admitted.
pub trait Authenticator: Send {
    fn authenticate(&self, username: &str, password: &str) -> Option<LoginGrant>;
}

/// Admits every non-empty username without NUL bytes at one spawn point.
#[derive(Debug, Clone)]
pub struct OpenAuthenticator {
    spawn: Vector,
    zone: ZoneId,
}

impl OpenAuthenticator {
    pub fn new(spawn: Vector, zone: ZoneId) -> Self {
        Self { spawn, zone }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Vector::from_array(config.player.spawn), ZoneId::default())
    }
}

impl Authenticator for OpenAuthenticator {
    fn authenticate(&self, username: &str, _password: &str) -> Option<LoginGrant> {
        let name = username.trim();
        if name.is_empty() || name.contains('\0') {
            return None;
        }
        Some(LoginGrant {
            name: name.to_string(),
            position: self.spawn,
            zone: self.zone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_authenticator() {
        let auth = OpenAuthenticator::new(Vector::new(1.0, 2.0, 0.0), ZoneId(0));
        assert_eq!(auth.authenticate("   ", "x"), None);
        let grant = auth.authenticate(" alice ", "").unwrap();
        assert_eq!(grant.name, "alice");
        assert_eq!(grant.position, Vector::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_nul_in_username_is_refused() {
        let auth = OpenAuthenticator::new(Vector::ZERO, ZoneId(0));
        assert_eq!(auth.authenticate("ali\0ce", ""), None);
    }
}

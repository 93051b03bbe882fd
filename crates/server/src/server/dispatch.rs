//! Inbound message dispatch.

use super::auth::Authenticator;
use crate::config::PlayerConfig;
use crate::entity::{Vision, WorldObject};
use crate::ids::ConnectionId;
use crate::world::World;
use protocol::messages::ClientMessage;
use tracing::{debug, info, warn};

/// Routes each client message to the world operation it stands for.
pub struct Dispatcher {
    auth: Box<dyn Authenticator>,
    player: PlayerConfig,
}

impl Dispatcher {
    pub fn new(auth: Box<dyn Authenticator>, player: PlayerConfig) -> Self {
        Self { auth, player }
    }

    /// Handle one message from `connection`.
    pub fn dispatch(&mut self, world: &mut World, connection: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::Login { username, password } => self.login(world, connection, &username, &password),
            ClientMessage::Logout => self.disconnect(world, connection),
            ClientMessage::StateChange(request) => {
                if let Err(e) = world.submit_state_change(connection, &request) {
                    debug!("Dropped state change from {}: {}", connection, e);
                }
            }
        }
    }

    /// Remove the actor bound to `connection`, if any.
    pub fn disconnect(&mut self, world: &mut World, connection: ConnectionId) {
        if let Ok(actor) = world.remove_connection(connection) {
            info!("{} ({}) left the world", actor.name(), connection);
        }
    }

    fn login(&mut self, world: &mut World, connection: ConnectionId, username: &str, password: &str) {
        if world.actor_of(connection).is_some() {
            warn!("{} sent a second login", connection);
            return;
        }
        let Some(grant) = self.auth.authenticate(username, password) else {
            info!("Login refused for '{}' on {}", username, connection);
            return;
        };

        let actor = WorldObject::player(
            grant.name.clone(),
            grant.position,
            self.player.speed,
            Vision::new(self.player.vision_radius, self.player.ray_cast),
            connection,
        );
        match world.add_object(actor, grant.zone) {
            Ok(id) => info!("{} logged in as {} on {}", grant.name, id, connection),
            Err(e) => warn!("Could not place {} for {}: {}", grant.name, connection, e),
        }
    }
}

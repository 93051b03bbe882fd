//! Scheduler, inbound dispatch and the login seam.

mod auth;
mod dispatch;
mod scheduler;

pub use crate::world::Outbound;
pub use auth::{Authenticator, LoginGrant, OpenAuthenticator};
pub use dispatch::Dispatcher;
pub use scheduler::{run, run_with, Command, ServerHandle};

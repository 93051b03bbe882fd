//! Fixed-rate tick loop.
//!
//! The loop task owns the world. Everything else talks to it through the
//! command queue and receives one batch of outbound messages per tick
//! that produced any.

use super::auth::{Authenticator, OpenAuthenticator};
use super::dispatch::Dispatcher;
use crate::config::Config;
use crate::ids::ConnectionId;
use crate::time::Timestamp;
use crate::world::{Outbound, World};
use bytes::Bytes;
use protocol::MessageRegistry;
use protocol::messages::ClientMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

/// Work queued for the tick loop.
#[derive(Debug, Clone)]
pub enum Command {
    /// A transport connection opened.
    Connect { connection: ConnectionId },
    /// An undecoded message body (opcode first).
    Frame { connection: ConnectionId, bytes: Bytes },
    /// An already decoded message.
    Message { connection: ConnectionId, message: ClientMessage },
    /// A transport connection closed.
    Disconnect { connection: ConnectionId },
}

/// Handle to a running tick loop.
///
/// Dropping `commands` stops the loop once the queue is drained.
pub struct ServerHandle {
    pub commands: mpsc::Sender<Command>,
    pub events: mpsc::Receiver<Vec<Outbound>>,
    registry: Arc<MessageRegistry>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }

    /// Serialize an outbound message for the transport.
    pub fn encode(&self, outbound: &Outbound) -> Bytes {
        self.registry.encode_server(&outbound.message)
    }

    /// Close both channels and wait for the loop to finish.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let ServerHandle { commands, events, task, .. } = self;
        drop(commands);
        drop(events);
        task.await?;
        Ok(())
    }
}

/// Build the world from `config` and start ticking it, admitting logins
/// with [`OpenAuthenticator`].
pub fn run(config: Config) -> anyhow::Result<ServerHandle> {
    let auth = OpenAuthenticator::from_config(&config);
    run_with(config, Box::new(auth))
}

/// Like [`run`], with a caller-supplied authenticator.
pub fn run_with(config: Config, auth: Box<dyn Authenticator>) -> anyhow::Result<ServerHandle> {
    let world = World::from_config(&config)?;
    let stats = world.stats();
    info!(
        "{}: {} objects in {} zones, ticking every {}ms",
        config.server.name, stats.objects, stats.zones, config.server.tick_interval_ms
    );

    let (command_tx, command_rx) = mpsc::channel(config.server.command_queue.max(1));
    let (event_tx, event_rx) = mpsc::channel(64);
    let registry = Arc::new(MessageRegistry::standard());

    let tick_loop = TickLoop {
        world,
        dispatcher: Dispatcher::new(auth, config.player.clone()),
        registry: Arc::clone(&registry),
        interval: config.tick_duration(),
    };
    let task = tokio::spawn(tick_loop.run(command_rx, event_tx));

    Ok(ServerHandle {
        commands: command_tx,
        events: event_rx,
        registry,
        task,
    })
}

struct TickLoop {
    world: World,
    dispatcher: Dispatcher,
    registry: Arc<MessageRegistry>,
    interval: Duration,
}

impl TickLoop {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, events: mpsc::Sender<Vec<Outbound>>) {
        let start = Instant::now();
        let mut ticker = interval_at(start + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let budget_ms = self.interval.as_secs_f64() * 1000.0 * 0.9;

        loop {
            ticker.tick().await;

            loop {
                match commands.try_recv() {
                    Ok(command) => self.apply(command),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!("Command queue closed after {} ticks", self.world.tick_count());
                        return;
                    }
                }
            }

            let now = Timestamp::from_millis(start.elapsed().as_millis() as u64);
            let tick_start = std::time::Instant::now();
            let batch = self.world.tick(now);
            let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

            if self.world.tick_count() % 500 == 0 {
                let stats = self.world.stats();
                debug!(
                    "Tick #{}: {:.2}ms | {} objects, {} players, {} cells",
                    self.world.tick_count(),
                    tick_ms,
                    stats.objects,
                    stats.players,
                    stats.cells
                );
            }
            if tick_ms > budget_ms {
                warn!(
                    "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} objects",
                    self.world.tick_count(),
                    tick_ms,
                    budget_ms,
                    self.world.len()
                );
            }

            if !batch.is_empty() && events.send(batch).await.is_err() {
                info!("Event receiver dropped, stopping tick loop");
                return;
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Connect { connection } => debug!("{} opened", connection),
            Command::Frame { connection, bytes } => match self.registry.decode_client(&bytes) {
                Ok(message) => self.dispatcher.dispatch(&mut self.world, connection, message),
                Err(e) => warn!("Undecodable frame from {}: {}", connection, e),
            },
            Command::Message { connection, message } => self.dispatcher.dispatch(&mut self.world, connection, message),
            Command::Disconnect { connection } => {
                debug!("{} closed", connection);
                self.dispatcher.disconnect(&mut self.world, connection);
            }
        }
    }
}

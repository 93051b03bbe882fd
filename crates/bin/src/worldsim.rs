//! World simulation server.
//!
//! Runs the tick loop until Ctrl-C. Transports attach through the
//! server handle's command and event channels.

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("World Sim v{}", env!("CARGO_PKG_VERSION"));

    let config = server::Config::load()?;
    info!(
        "Zone: cell size {}, {} walls, {} NPCs, {} bots",
        config.zone.cell_size,
        config.zone.walls.len(),
        config.npcs.len(),
        config.server.bots
    );

    let mut handle = server::run(config)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            batch = handle.events.recv() => {
                let Some(batch) = batch else {
                    break;
                };
                for outbound in &batch {
                    let bytes = handle.encode(outbound);
                    debug!("{} <- {:?} ({} bytes)", outbound.connection, outbound.message.kind(), bytes.len());
                }
            }
        }
    }

    handle.shutdown().await
}

//! Coin Rush Game Server
//!
//! Authoritative state-sync server for the Coin Rush arena. Binds a
//! WebSocket listener and serves the shared world until interrupted.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coin_rush::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = ServerConfig::default();
    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port.parse().context("PORT must be a number")?;
        config.bind_addr.set_port(port);
    }

    info!("Coin Rush server v{}", VERSION);
    info!(
        "canvas {}x{}, player {}px, collectible {}px",
        config.world.canvas_width,
        config.world.canvas_height,
        config.world.player_size,
        config.world.collectible_size,
    );

    let server = GameServer::new(config);
    server.run().await?;

    Ok(())
}

//! CLI entry point: parses [`utils::ServerConfig`], wires up the
//! [`engine::Registry`] and its background reaper, and accepts connections
//! on a single TCP listener until `Ctrl-C`.

mod connection;
mod dispatch;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use engine::Registry;
use utils::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    utils::logging::init(&config.log_level);

    let registry = Arc::new(Registry::new());
    let reaper = registry.spawn_reaper(config.reaper_interval());

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;
    info!(addr = %bind_addr, "listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "connection accepted");
                        let registry = Arc::clone(&registry);
                        tokio::spawn(async move {
                            connection::handle_connection(stream, registry).await;
                        });
                    }
                    Err(err) => error!(error = %err, "failed to accept connection"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    reaper.shutdown().await;
    info!("shutdown complete");
    Ok(())
}

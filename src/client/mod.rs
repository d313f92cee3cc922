//! Client-side listener.
//!
//! Accepts plain local TCP and forwards each connection to the remote
//! server over the obfuscated link. The client itself speaks no proxy
//! protocol; the inner bytes are whatever the local application sends,
//! decoded and interpreted at the server.

mod config;

pub use config::ClientConfig;

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::codec::{ObfuscatedStream, Seed};
use crate::error::Result;
use crate::proxy::{outbound, relay};

/// Client-side tunnel entry.
pub struct Client {
    config: ClientConfig,
    seed: Arc<Seed>,
}

impl Client {
    /// Create a client; the obfuscation seed is derived from the
    /// configured password once and shared by all sessions.
    pub fn new(config: ClientConfig) -> Self {
        let seed = Arc::new(Seed::derive(&config.password));
        Self { config, seed }
    }

    /// Bind the local address and serve until the listener fails.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.local).await?;
        self.run_on(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn run_on(&self, listener: TcpListener) -> Result<()> {
        tracing::info!("client listening on {}", listener.local_addr()?);
        tracing::info!("remote server: {}", self.config.remote);

        loop {
            match listener.accept().await {
                Ok((local, peer)) => {
                    tracing::debug!("connection from {}", peer);
                    let remote_addr = self.config.remote.clone();
                    let seed = Arc::clone(&self.seed);
                    tokio::spawn(async move {
                        if let Err(e) = forward(local, &remote_addr, seed).await {
                            tracing::debug!("session from {} ended: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!("accept error: {}", e);
                }
            }
        }
    }
}

/// Open the obfuscated hop for one local connection and relay.
async fn forward(local: TcpStream, remote_addr: &str, seed: Arc<Seed>) -> Result<()> {
    local.set_nodelay(true)?;
    let remote = outbound::dial(remote_addr).await?;
    let tunnel = ObfuscatedStream::new(remote, seed);

    let (up, down) = relay::run(local, tunnel).await;
    tracing::debug!("relayed {} bytes up, {} bytes down", up, down);
    Ok(())
}

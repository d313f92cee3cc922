//! Server-side listener.
//!
//! Accepts the obfuscated (or plain) inter-hop connections, decodes the
//! link, and hands the inner stream to the proxy dispatcher. Every session
//! runs in its own task behind a panic boundary so a parser bug can never
//! take the listener down.

mod config;
mod metrics;

pub use config::ServerConfig;
pub use metrics::{MetricsSnapshot, ServerMetrics};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::codec::{ObfuscatedStream, Seed};
use crate::endpoint::{Endpoint, Schema};
use crate::error::Result;
use crate::proxy;

/// Server-side tunnel terminus.
pub struct Server {
    config: ServerConfig,
    gateway: Arc<Endpoint>,
    seed: Option<Arc<Seed>>,
    metrics: Arc<ServerMetrics>,
}

impl Server {
    /// Create a server. Fails on an unusable gateway endpoint; derives the
    /// obfuscation seed when a password is configured.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let gateway = Arc::new(config.gateway_endpoint()?);
        let seed = config
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| Arc::new(Seed::derive(p)));

        Ok(Self {
            config,
            gateway,
            seed,
            metrics: Arc::new(ServerMetrics::new()),
        })
    }

    /// Shared handle to the server's counters.
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Bind the configured address and serve until the listener fails.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen).await?;
        self.run_on(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn run_on(&self, listener: TcpListener) -> Result<()> {
        tracing::info!("server listening on {}", listener.local_addr()?);
        if self.gateway.schema != Schema::None {
            tracing::info!("gateway: {}", self.gateway);
        }
        tracing::info!(
            "obfuscation: {}",
            if self.seed.is_some() { "enabled" } else { "disabled" }
        );

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => self.spawn_session(stream, peer),
                Err(e) => {
                    tracing::warn!("accept error: {}", e);
                }
            }
        }
    }

    /// Run one session in its own task, supervised so that errors and
    /// panics are logged and counted without touching the accept loop.
    fn spawn_session(&self, stream: TcpStream, peer: SocketAddr) {
        let gateway = Arc::clone(&self.gateway);
        let seed = self.seed.clone();
        let metrics = Arc::clone(&self.metrics);
        metrics.session_opened();

        let session = tokio::spawn(async move {
            stream.set_nodelay(true)?;
            match seed {
                Some(seed) => proxy::serve(ObfuscatedStream::new(stream, seed), &gateway).await,
                None => proxy::serve(stream, &gateway).await,
            }
        });

        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(async move {
            match session.await {
                Ok(Ok(stats)) => {
                    metrics.record_session(&stats);
                    tracing::debug!(
                        "session from {} done: {} bytes up, {} bytes down ({})",
                        peer,
                        stats.bytes_up,
                        stats.bytes_down,
                        stats.dialect
                    );
                }
                Ok(Err(e)) => {
                    metrics.record_failure();
                    tracing::debug!("session from {} failed: {}", peer, e);
                }
                Err(join_err) if join_err.is_panic() => {
                    metrics.record_failure();
                    tracing::error!("session from {} panicked: {}", peer, join_err);
                }
                Err(_) => {}
            }
            metrics.session_closed();
        });
    }
}

//! Inbound protocol dispatch and the per-session proxy flow.
//!
//! The server hands each decoded connection to [`serve`]: one read pulls
//! the leading bytes, the first byte picks the dialect (SOCKS4, SOCKS5 or
//! HTTP), the dialect parser completes its handshake and yields the
//! destination, the outbound connector dials it (directly or through the
//! configured gateway), and the relay shuttles bytes until either side
//! closes.

pub mod http;
pub mod outbound;
pub mod relay;
pub mod socks4;
pub mod socks5;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

/// Size of the single classification read.
const ACCEPT_BUF: usize = 128;

/// Inbound proxy dialect, classified on the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Socks4,
    Socks5,
    Http,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Socks4 => f.write_str("socks4"),
            Dialect::Socks5 => f.write_str("socks5"),
            Dialect::Http => f.write_str("http"),
        }
    }
}

/// Classify a session's first byte.
///
/// `0x04`/`0x05` are the SOCKS version bytes; an ASCII upper-case letter is
/// the start of an HTTP method token. Nothing else is recognized.
pub fn classify(first: u8) -> Result<Dialect> {
    match first {
        0x04 => Ok(Dialect::Socks4),
        0x05 => Ok(Dialect::Socks5),
        b'A'..=b'Z' => Ok(Dialect::Http),
        other => Err(Error::protocol(format!("first byte invalid: 0x{:02x}", other))),
    }
}

/// Byte totals and classified dialect of a completed session.
#[derive(Debug, Clone, Copy)]
pub struct SessionStats {
    pub dialect: Dialect,
    pub bytes_up: u64,
    pub bytes_down: u64,
}

/// Serve one inbound session end to end.
///
/// Completes the proxy handshake, connects to the destination according to
/// the gateway, replays a buffered HTTP request when there is one, then
/// relays until either side closes.
pub async fn serve<S>(mut client: S, gateway: &Endpoint) -> Result<SessionStats>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (dialect, ep) = accept(&mut client).await?;
    tracing::debug!("accepted {} request for {}", dialect, ep.address());

    let mut upstream = outbound::connect(&ep, gateway).await?;
    if let Some(request) = ep.request.as_deref() {
        upstream.write_all(request).await?;
    }

    let (bytes_up, bytes_down) = relay::run(client, upstream).await;
    Ok(SessionStats {
        dialect,
        bytes_up,
        bytes_down,
    })
}

/// Read the leading bytes, classify the dialect, and run its parser.
///
/// The bytes already read are handed to the parser as the logical head of
/// the stream.
pub async fn accept<S>(stream: &mut S) -> Result<(Dialect, Endpoint)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; ACCEPT_BUF];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        return Err(Error::protocol("request is empty"));
    }

    let dialect = classify(buf[0])?;
    let ep = match dialect {
        Dialect::Socks4 => socks4::accept_request(stream, &buf[..n]).await?,
        Dialect::Socks5 => socks5::accept_request(stream, &buf[..n]).await?,
        Dialect::Http => http::accept_request(stream, &buf[..n]).await?,
    };

    if ep.host.is_empty() || ep.port == 0 {
        return Err(Error::protocol(format!(
            "destination incomplete: {:?}",
            ep.address()
        )));
    }
    Ok((dialect, ep))
}

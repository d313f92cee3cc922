//! Outbound connectors: direct TCP or chained through a gateway proxy.

use std::net::IpAddr;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::endpoint::{Endpoint, Schema};
use crate::error::{Error, Result};

use super::{http, socks4, socks5};

/// Outbound TCP dial timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect to the destination `ep` according to the gateway schema.
///
/// `none` dials the destination directly; `socks4`, `socks5`/`socks` and
/// `http` chain through the gateway with that proxy's CONNECT handshake.
pub async fn connect(ep: &Endpoint, gateway: &Endpoint) -> Result<TcpStream> {
    match &gateway.schema {
        Schema::Socks5 | Schema::Socks => socks5::connect_via(ep, gateway).await,
        Schema::Socks4 => socks4::connect_via(ep, gateway).await,
        Schema::Http => http::connect_via(ep, gateway).await,
        Schema::None => connect_tcp(ep).await,
        Schema::Tcp | Schema::Other(_) => Err(Error::config("schema invalid of gateway Endpoint")),
    }
}

/// Direct TCP dial to the endpoint address.
pub async fn connect_tcp(ep: &Endpoint) -> Result<TcpStream> {
    if ep.host.parse::<std::net::Ipv6Addr>().is_ok() || ep.host.starts_with('[') {
        return Err(Error::protocol("ipv6 not supported"));
    }
    dial(&ep.address()).await
}

/// Dial `addr` with the connect timeout and nagle disabled.
pub(crate) async fn dial(addr: &str) -> Result<TcpStream> {
    let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
        .await
        .map_err(|_| Error::Timeout(CONNECT_TIMEOUT.as_secs()))??;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// IPv4 octets when the host is an IPv4 literal, `None` for hostnames.
/// IPv6 literals are refused outright.
pub(crate) fn ipv4_octets(host: &str) -> Result<Option<[u8; 4]>> {
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => Ok(Some(v4.octets())),
        Ok(IpAddr::V6(_)) => Err(Error::protocol("ipv6 not supported")),
        Err(_) => Ok(None),
    }
}

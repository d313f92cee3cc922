//! SOCKS5 (no-auth only).
//!
//! Greeting:  `05 NMETHODS METHODS…`  →  `05 00` (or `05 FF`)
//! Request:   `05 CMD RSV ATYP ADDR PORT(2,BE)`  →  `05 00 00 01 0…0`

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

use super::outbound;

/// No-acceptable-methods refusal.
const REPLY_NO_METHOD: [u8; 2] = [5, 0xFF];
/// Address-type-not-supported refusal.
const REPLY_ATYP_UNSUPPORTED: [u8; 10] = [5, 8, 0, 1, 0, 0, 0, 0, 0, 0];
/// Request granted, bound to 0.0.0.0:0.
const REPLY_SUCCESS: [u8; 10] = [5, 0, 0, 1, 0, 0, 0, 0, 0, 0];

/// Longest possible request: header + 255-byte domain + port.
const MAX_REQUEST: usize = 5 + 255 + 2;

/// Negotiate the anonymous method from the dispatcher's prefix, then read
/// and answer the CONNECT request.
pub(crate) async fn accept_request<S>(stream: &mut S, buf: &[u8]) -> Result<Endpoint>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let n = buf.len();
    if n < 2 {
        return Err(Error::protocol("malformed socks5 greeting"));
    }
    let nmethods = buf[1] as usize;
    let methods = &buf[2..n.min(2 + nmethods)];
    if !methods.contains(&0) {
        stream.write_all(&REPLY_NO_METHOD).await?;
        return Err(Error::protocol("method not supported"));
    }
    stream.write_all(&[5, 0]).await?;

    // The request may arrive split; keep reading until the layout for its
    // address type is complete.
    let mut req = [0u8; MAX_REQUEST];
    let mut have = read_at_least(stream, &mut req, 0, 5).await?;
    let total = match req[3] {
        1 => 10,
        3 => 5 + req[4] as usize + 2,
        _ => {
            stream.write_all(&REPLY_ATYP_UNSUPPORTED).await?;
            return Err(Error::protocol("address type not supported"));
        }
    };
    have = read_at_least(stream, &mut req, have, total).await?;
    debug_assert!(have >= total);

    let (host, port) = if req[3] == 1 {
        (
            format!("{}.{}.{}.{}", req[4], req[5], req[6], req[7]),
            u16::from_be_bytes([req[8], req[9]]),
        )
    } else {
        let len = req[4] as usize;
        (
            String::from_utf8_lossy(&req[5..5 + len]).into_owned(),
            u16::from_be_bytes([req[5 + len], req[5 + len + 1]]),
        )
    };

    stream.write_all(&REPLY_SUCCESS).await?;
    Ok(Endpoint::tcp(host, port))
}

async fn read_at_least<S>(
    stream: &mut S,
    buf: &mut [u8; MAX_REQUEST],
    mut have: usize,
    want: usize,
) -> Result<usize>
where
    S: AsyncRead + Unpin,
{
    while have < want {
        let n = stream.read(&mut buf[have..]).await?;
        if n == 0 {
            return Err(Error::protocol("connection closed mid request"));
        }
        have += n;
    }
    Ok(have)
}

/// CONNECT to `ep` through a SOCKS5 gateway with anonymous auth.
pub(crate) async fn connect_via(ep: &Endpoint, gateway: &Endpoint) -> Result<TcpStream> {
    let mut conn = outbound::connect_tcp(gateway).await?;

    conn.write_all(&[5, 1, 0]).await?;
    let mut method = [0u8; 2];
    conn.read_exact(&mut method).await?;
    if method[1] != 0 {
        return Err(Error::protocol("invalid response from socks5 gateway"));
    }

    let mut req = Vec::with_capacity(7 + ep.host.len());
    req.extend_from_slice(&[5, 1, 0]);
    match outbound::ipv4_octets(&ep.host)? {
        Some(ip) => {
            req.push(1);
            req.extend_from_slice(&ip);
        }
        None => {
            if ep.host.len() > 255 {
                return Err(Error::protocol("hostname too long for socks5"));
            }
            req.push(3);
            req.push(ep.host.len() as u8);
            req.extend_from_slice(ep.host.as_bytes());
        }
    }
    req.extend_from_slice(&ep.port.to_be_bytes());
    conn.write_all(&req).await?;

    let mut reply = [0u8; 10];
    conn.read_exact(&mut reply).await?;
    if reply[1] != 0 {
        return Err(Error::protocol("connect to socks5 gateway failed"));
    }
    Ok(conn)
}

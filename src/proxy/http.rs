//! HTTP/1.1 inbound parsing and outbound CONNECT.
//!
//! Only the first request is parsed. CONNECT gets the 200 response and the
//! rest of the stream is opaque payload; any other method is buffered
//! byte-for-byte and replayed to the destination before the relay starts.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

use super::outbound;

/// Upper bound on an accumulated request or response head.
const MAX_HEAD: usize = 64 * 1024;

const CONNECT_ESTABLISHED: &[u8] =
    b"HTTP/1.1 200 Connection Established\r\nConnection: close\r\n\r\n";

/// Parse one request from the dispatcher's prefix plus the live stream.
pub(crate) async fn accept_request<S>(stream: &mut S, prefix: &[u8]) -> Result<Endpoint>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(1024);
    buf.extend_from_slice(prefix);

    loop {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(&buf) {
            Ok(httparse::Status::Complete(_)) => {
                let method = req.method.unwrap_or("");
                let authority = req
                    .headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case("host"))
                    .map(|h| String::from_utf8_lossy(h.value).into_owned())
                    .or_else(|| authority_of(req.path.unwrap_or("")))
                    .ok_or_else(|| Error::protocol("request has no host"))?;
                let (host, port) = split_host_port(&authority)?;

                let mut ep = Endpoint::tcp(host, port);
                if method == "CONNECT" {
                    stream.write_all(CONNECT_ESTABLISHED).await?;
                } else {
                    ep.request = Some(buf);
                }
                return Ok(ep);
            }
            Ok(httparse::Status::Partial) => {
                if buf.len() >= MAX_HEAD {
                    return Err(Error::protocol("request head too large"));
                }
                let mut chunk = [0u8; 1024];
                let n = stream.read(&mut chunk).await?;
                if n == 0 {
                    return Err(Error::protocol("connection closed mid request"));
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            Err(e) => return Err(Error::protocol(format!("invalid http request: {}", e))),
        }
    }
}

/// CONNECT to `ep` through an HTTP gateway; anything but a 200 fails.
pub(crate) async fn connect_via(ep: &Endpoint, gateway: &Endpoint) -> Result<TcpStream> {
    let mut conn = outbound::connect_tcp(gateway).await?;

    let request = format!(
        "CONNECT {}:{} HTTP/1.1\r\nHost: {}\r\n\r\n",
        ep.host, ep.port, ep.host
    );
    conn.write_all(request.as_bytes()).await?;

    let mut buf = Vec::with_capacity(256);
    loop {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut response = httparse::Response::new(&mut headers);
        match response.parse(&buf) {
            Ok(httparse::Status::Complete(_)) => {
                if response.code == Some(200) {
                    return Ok(conn);
                }
                return Err(Error::protocol(format!("connect to remote {} failed", ep)));
            }
            Ok(httparse::Status::Partial) => {
                if buf.len() >= MAX_HEAD {
                    return Err(Error::protocol("response head too large"));
                }
                let mut chunk = [0u8; 1024];
                let n = conn.read(&mut chunk).await?;
                if n == 0 {
                    return Err(Error::protocol("connection closed mid response"));
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            Err(e) => return Err(Error::protocol(format!("invalid http response: {}", e))),
        }
    }
}

/// Authority from an absolute request-URI (`http://host/…`) or the
/// authority-form target of a CONNECT.
fn authority_of(path: &str) -> Option<String> {
    let rest = match path.split_once("://") {
        Some((_, rest)) => rest,
        None if !path.is_empty() && !path.starts_with('/') => path,
        None => return None,
    };
    let authority = rest.split('/').next().unwrap_or("");
    (!authority.is_empty()).then(|| authority.to_string())
}

/// Split `host[:port]`, defaulting to port 80.
fn split_host_port(authority: &str) -> Result<(String, u16)> {
    match authority.split_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| Error::protocol(format!("invalid port in host {:?}", authority)))?;
            Ok((host.to_string(), port))
        }
        None => Ok((authority.to_string(), 80)),
    }
}

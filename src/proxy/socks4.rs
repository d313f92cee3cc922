//! SOCKS4 and SOCKS4a.
//!
//! Request:  `VER(4) CMD PORT(2,BE) IP(4) USERID\0 [4a: HOST\0]`
//! Reply:    `00 5A PORT(2) IP(4)`

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};

use super::outbound;

/// Parse a SOCKS4/4a request from the dispatcher's prefix and send the
/// request-granted reply.
///
/// A destination IP of `0.0.0.NN` with `NN > 0` marks SOCKS4a: the real
/// hostname follows the zero-terminated user id.
pub(crate) async fn accept_request<S>(stream: &mut S, buf: &[u8]) -> Result<Endpoint>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let n = buf.len();
    if n < 8 {
        return Err(Error::protocol("malformed socks4 request"));
    }
    let port = u16::from_be_bytes([buf[2], buf[3]]);

    let host = if buf[4] == 0 && buf[5] == 0 && buf[6] == 0 && buf[7] > 0 {
        let mut index = 8;
        while index < n && buf[index] != 0 {
            index += 1;
        }
        index += 1; // past the USERID terminator
        let start = index;
        while index < n && buf[index] != 0 {
            index += 1;
        }
        if start >= n || index >= n || index == start {
            return Err(Error::protocol("malformed socks4a hostname"));
        }
        String::from_utf8_lossy(&buf[start..index]).into_owned()
    } else {
        format!("{}.{}.{}.{}", buf[4], buf[5], buf[6], buf[7])
    };

    stream
        .write_all(&[0, 90, buf[2], buf[3], buf[4], buf[5], buf[6], buf[7]])
        .await?;

    Ok(Endpoint::tcp(host, port))
}

/// CONNECT to `ep` through a SOCKS4 gateway.
///
/// IPv4 destinations go out as plain SOCKS4; hostnames use the SOCKS4a
/// sentinel `0.0.0.1` with the zero-terminated name after the user id.
pub(crate) async fn connect_via(ep: &Endpoint, gateway: &Endpoint) -> Result<TcpStream> {
    let mut conn = outbound::connect_tcp(gateway).await?;

    let mut req = Vec::with_capacity(10 + ep.host.len());
    req.extend_from_slice(&[4, 1]);
    req.extend_from_slice(&ep.port.to_be_bytes());
    match outbound::ipv4_octets(&ep.host)? {
        Some(ip) => {
            req.extend_from_slice(&ip);
            req.push(0); // empty USERID
        }
        None => {
            req.extend_from_slice(&[0, 0, 0, 1]);
            req.push(0); // empty USERID
            req.extend_from_slice(ep.host.as_bytes());
            req.push(0);
        }
    }
    conn.write_all(&req).await?;

    let mut reply = [0u8; 8];
    conn.read_exact(&mut reply).await?;
    if reply[0] != 0 {
        return Err(Error::protocol("connect to socks4 gateway failed"));
    }
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Schema;
    use tokio::net::TcpListener;

    async fn accept_bytes(request: &[u8]) -> (Result<Endpoint>, Vec<u8>) {
        let (mut near, mut far) = tokio::io::duplex(1024);
        let result = accept_request(&mut near, request).await;
        drop(near);
        let mut reply = Vec::new();
        far.read_to_end(&mut reply).await.unwrap();
        (result, reply)
    }

    #[tokio::test]
    async fn test_plain_socks4() {
        let request = [4, 1, 0x1F, 0x90, 10, 0, 0, 42, 0];
        let (result, reply) = accept_bytes(&request).await;

        let ep = result.unwrap();
        assert_eq!(ep.schema, Schema::Tcp);
        assert_eq!(ep.host, "10.0.0.42");
        assert_eq!(ep.port, 8080);
        assert_eq!(reply, [0, 90, 0x1F, 0x90, 10, 0, 0, 42]);
    }

    #[tokio::test]
    async fn test_socks4a_hostname() {
        let mut request = vec![4, 1, 0x1F, 0x90, 0, 0, 0, 1, 0];
        request.extend_from_slice(b"www.example.com\0");
        let (result, reply) = accept_bytes(&request).await;

        let ep = result.unwrap();
        assert_eq!(ep.host, "www.example.com");
        assert_eq!(ep.port, 8080);
        assert_eq!(reply, [0, 90, 0x1F, 0x90, 0, 0, 0, 1]);
    }

    #[tokio::test]
    async fn test_socks4a_skips_userid() {
        let mut request = vec![4, 1, 0x00, 0x50, 0, 0, 0, 7];
        request.extend_from_slice(b"someuser\0");
        request.extend_from_slice(b"host.internal\0");
        let (result, _) = accept_bytes(&request).await;
        assert_eq!(result.unwrap().host, "host.internal");
    }

    #[tokio::test]
    async fn test_hostname_path_requires_exact_zero_prefix() {
        // 0.0.1.0 is a regular address, not the 4a marker.
        let request = [4, 1, 0x00, 0x50, 0, 0, 1, 0, 0];
        let (result, _) = accept_bytes(&request).await;
        assert_eq!(result.unwrap().host, "0.0.1.0");

        // 0.0.0.0 is not the marker either (fourth byte must be non-zero).
        let request = [4, 1, 0x00, 0x50, 0, 0, 0, 0, 0];
        let (result, _) = accept_bytes(&request).await;
        assert_eq!(result.unwrap().host, "0.0.0.0");
    }

    #[tokio::test]
    async fn test_unterminated_hostname_is_rejected() {
        let mut request = vec![4, 1, 0x00, 0x50, 0, 0, 0, 1, 0];
        request.extend_from_slice(b"chopped.host");
        let (result, _) = accept_bytes(&request).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_truncated_request_is_rejected() {
        let (result, _) = accept_bytes(&[4, 1, 0, 80]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connect_via_gateway_ipv4() {
        let gateway_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let gateway_addr = gateway_listener.local_addr().unwrap();

        let gateway = tokio::spawn(async move {
            let (mut conn, _) = gateway_listener.accept().await.unwrap();
            let mut req = [0u8; 9];
            conn.read_exact(&mut req).await.unwrap();
            assert_eq!(req, [4, 1, 0x01, 0xBB, 93, 184, 216, 34, 0]);
            conn.write_all(&[0, 90, 0, 0, 0, 0, 0, 0]).await.unwrap();
        });

        let ep = Endpoint::tcp("93.184.216.34", 443);
        let gw = Endpoint::parse(&format!("socks4://{}", gateway_addr)).unwrap();
        connect_via(&ep, &gw).await.unwrap();
        gateway.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_via_gateway_hostname() {
        let gateway_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let gateway_addr = gateway_listener.local_addr().unwrap();

        let gateway = tokio::spawn(async move {
            let (mut conn, _) = gateway_listener.accept().await.unwrap();
            let mut req = vec![0u8; 9 + "example.com".len() + 1];
            conn.read_exact(&mut req).await.unwrap();
            assert_eq!(&req[..9], &[4, 1, 0x00, 0x50, 0, 0, 0, 1, 0]);
            assert_eq!(&req[9..], b"example.com\0");
            conn.write_all(&[0, 90, 0, 0, 0, 0, 0, 0]).await.unwrap();
        });

        let ep = Endpoint::tcp("example.com", 80);
        let gw = Endpoint::parse(&format!("socks4://{}", gateway_addr)).unwrap();
        connect_via(&ep, &gw).await.unwrap();
        gateway.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_via_gateway_refusal() {
        let gateway_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let gateway_addr = gateway_listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut conn, _) = gateway_listener.accept().await.unwrap();
            let mut req = [0u8; 9];
            conn.read_exact(&mut req).await.unwrap();
            conn.write_all(&[1, 91, 0, 0, 0, 0, 0, 0]).await.unwrap();
        });

        let ep = Endpoint::tcp("10.1.2.3", 80);
        let gw = Endpoint::parse(&format!("socks4://{}", gateway_addr)).unwrap();
        let err = connect_via(&ep, &gw).await.unwrap_err();
        assert!(err.to_string().contains("socks4 gateway failed"));
    }
}

//! Bidirectional relay between the client-facing and destination-facing
//! streams.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Buffer for the destination → client direction (bulk payload).
const DOWNSTREAM_BUF: usize = 8 * 1024;

/// Buffer for the client → destination direction (typically small requests).
const UPSTREAM_BUF: usize = 1024;

/// Shuttle bytes both ways until either direction reaches EOF or errors.
///
/// Completion of one direction drops the other pump and both streams, so
/// the peer cannot wedge on a half-dead connection. Returns the byte counts
/// as `(upstream, downstream)`.
pub async fn run<A, B>(client: A, upstream: B) -> (u64, u64)
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_r, mut client_w) = tokio::io::split(client);
    let (mut upstream_r, mut upstream_w) = tokio::io::split(upstream);

    let mut up = 0u64;
    let mut down = 0u64;

    let to_upstream = pump(&mut client_r, &mut upstream_w, UPSTREAM_BUF, &mut up);
    let to_client = pump(&mut upstream_r, &mut client_w, DOWNSTREAM_BUF, &mut down);

    tokio::select! {
        _ = to_upstream => {}
        _ = to_client => {}
    }

    (up, down)
}

async fn pump<R, W>(
    reader: &mut R,
    writer: &mut W,
    buf_size: usize,
    count: &mut u64,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buf_size];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
        *count += n as u64;
    }
}

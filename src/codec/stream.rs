//! Obfuscated stream adapter.
//!
//! Wraps a bidirectional byte stream and applies the keystream transform
//! transparently: writes are encoded, reads are decoded. Byte counts and
//! error semantics are those of the underlying stream.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::keystream::{self, Seed};

/// Largest slice encoded per write call; bounds the scratch buffer.
const MAX_WRITE_CHUNK: usize = 16 * 1024;

/// A stream whose bytes are transformed by the password-derived keystream.
///
/// The two directions are independent byte streams with independent running
/// offsets. A short write by the underlying stream advances `write_offset`
/// only by the accepted count, so resubmitted bytes are re-encoded at their
/// correct absolute positions.
pub struct ObfuscatedStream<S> {
    inner: S,
    seed: Arc<Seed>,
    read_offset: u64,
    write_offset: u64,
    scratch: Vec<u8>,
}

impl<S> ObfuscatedStream<S> {
    /// Wrap `inner` with the shared keystream seed. Both offsets start at 0.
    pub fn new(inner: S, seed: Arc<Seed>) -> Self {
        Self {
            inner,
            seed,
            read_offset: 0,
            write_offset: 0,
            scratch: Vec::new(),
        }
    }

    /// Bytes decoded so far.
    pub fn read_offset(&self) -> u64 {
        self.read_offset
    }

    /// Bytes encoded and accepted by the underlying writer so far.
    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    /// Get reference to inner stream
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Consume wrapper and return inner stream
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for ObfuscatedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let filled_before = buf.filled().len();

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let fresh = &mut buf.filled_mut()[filled_before..];
                keystream::decode_in_place(&this.seed, this.read_offset, fresh);
                this.read_offset += fresh.len() as u64;
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for ObfuscatedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let chunk = &buf[..buf.len().min(MAX_WRITE_CHUNK)];

        this.scratch.clear();
        this.scratch.extend_from_slice(chunk);
        keystream::encode_in_place(&this.seed, this.write_offset, &mut this.scratch);

        match Pin::new(&mut this.inner).poll_write(cx, &this.scratch) {
            Poll::Ready(Ok(n)) => {
                this.write_offset += n as u64;
                Poll::Ready(Ok(n))
            }
            other => other,
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

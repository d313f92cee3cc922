//! Obfuscation codec for the inter-hop link.
//!
//! A password is hashed once into a 64-byte seed; each connection then
//! overlays a position-keyed byte transform on its stream, with independent
//! running offsets for the read and write directions. There is no framing:
//! both sides start at offset 0 together with the TCP connection.

mod keystream;
mod stream;

pub use keystream::{decode_in_place, encode_in_place, Seed, SEED_SIZE};
pub use stream::ObfuscatedStream;

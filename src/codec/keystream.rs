//! Keystream seed and the position-keyed byte transform.
//!
//! The transform is an anti-fingerprinting veneer, not a cipher: every byte
//! is mangled by a value taken from a 64-byte seed at `position mod 64`, so
//! an encoder and a decoder sharing the seed and the same running offset
//! invert each other exactly.

use sha2::{Digest, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the keystream seed in bytes (one SHA-512 digest).
pub const SEED_SIZE: usize = 64;

/// Keystream seed derived from the shared password.
///
/// Shared by reference across all sessions for the lifetime of the process;
/// zeroized when the last reference drops.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; SEED_SIZE]);

impl Seed {
    /// Derive the seed from a password: `SHA-512(password-as-UTF-8)`.
    pub fn derive(password: &str) -> Self {
        let digest = Sha512::digest(password.as_bytes());
        let mut seed = [0u8; SEED_SIZE];
        seed.copy_from_slice(&digest);
        Seed(seed)
    }

    /// Raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; SEED_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// Per-position multiplier for the seed byte.
///
/// With `s = pos mod 64`: `(s mod 8) + 1` when bit 3 of `s` is set,
/// otherwise `(s mod 8) - 8` as a wrapping byte (0xF8..0xFF). All
/// arithmetic stays in u8; nothing sign-extends.
#[inline]
fn step(pos: u64) -> u8 {
    let s = (pos & 63) as u8;
    if s & 8 == 0 {
        (s & 7).wrapping_sub(8)
    } else {
        (s & 7) + 1
    }
}

/// Encode `buf` in place as the bytes at absolute positions
/// `offset..offset + buf.len()` of the outgoing stream.
pub fn encode_in_place(seed: &Seed, offset: u64, buf: &mut [u8]) {
    let key = seed.as_bytes();
    for (i, b) in buf.iter_mut().enumerate() {
        let pos = offset.wrapping_add(i as u64);
        let k = key[(pos & 63) as usize];
        *b = !(b.wrapping_add(step(pos).wrapping_mul(k)));
    }
}

/// Decode `buf` in place as the bytes at absolute positions
/// `offset..offset + buf.len()` of the incoming stream.
pub fn decode_in_place(seed: &Seed, offset: u64, buf: &mut [u8]) {
    let key = seed.as_bytes();
    for (i, b) in buf.iter_mut().enumerate() {
        let pos = offset.wrapping_add(i as u64);
        let k = key[(pos & 63) as usize];
        *b = (!*b).wrapping_sub(step(pos).wrapping_mul(k));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_derivation_deterministic() {
        let a = Seed::derive("12345678");
        let b = Seed::derive("12345678");
        let c = Seed::derive("87654321");

        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_step_values() {
        // bit 3 clear: wrapping s%8 - 8, including step(0) == 0xF8
        assert_eq!(step(0), 0xF8);
        assert_eq!(step(7), 0xFF);
        assert_eq!(step(16), 0xF8);
        // bit 3 set: s%8 + 1
        assert_eq!(step(8), 1);
        assert_eq!(step(15), 8);
        assert_eq!(step(12), 5);
        // periodic in 64
        for pos in 0..64u64 {
            assert_eq!(step(pos), step(pos + 64));
        }
    }

    #[test]
    fn test_involution_every_offset_and_byte() {
        let seed = Seed::derive("12345678");
        for offset in 0..64u64 {
            for value in 0..=255u8 {
                let mut buf = [value];
                encode_in_place(&seed, offset, &mut buf);
                decode_in_place(&seed, offset, &mut buf);
                assert_eq!(buf[0], value, "offset {} value {}", offset, value);
            }
        }
    }

    #[test]
    fn test_encode_is_not_identity() {
        let seed = Seed::derive("12345678");
        for offset in 0..64u64 {
            let mut buf = [0x68u8];
            encode_in_place(&seed, offset, &mut buf);
            assert_ne!(buf[0], 0x68, "offset class {}", offset);
        }
    }

    #[test]
    fn test_chunking_invariance() {
        let seed = Seed::derive("chunky");
        let plain: Vec<u8> = (0..200u16).map(|i| (i * 7) as u8).collect();

        let mut whole = plain.clone();
        encode_in_place(&seed, 0, &mut whole);

        for chunk_size in [1usize, 3, 7, 64, 65] {
            let mut split = plain.clone();
            let mut offset = 0u64;
            for chunk in split.chunks_mut(chunk_size) {
                encode_in_place(&seed, offset, chunk);
                offset += chunk.len() as u64;
            }
            assert_eq!(split, whole, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn test_nonzero_start_offset() {
        let seed = Seed::derive("offset");
        let mut buf = *b"hello";
        encode_in_place(&seed, 3, &mut buf);
        decode_in_place(&seed, 3, &mut buf);
        assert_eq!(&buf, b"hello");
    }
}

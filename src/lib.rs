//! # qtun
//!
//! An obfuscated two-hop TCP tunnel whose far end speaks the common proxy
//! protocols.
//!
//! ```text
//! ┌─────────┐  plain   ┌────────┐  obfuscated  ┌────────┐        ┌─────────────┐
//! │  local  │  TCP     │ client │  keystream   │ server │  TCP   │ destination │
//! │   app   ├─────────►│listener├─────────────►│listener├───────►│  (or via a  │
//! │         │◄─────────┤ + codec│◄─────────────┤ + codec│◄───────┤   gateway)  │
//! └─────────┘          └────────┘              └────────┘        └─────────────┘
//!                                                   │
//!                                       SOCKS4/4a · SOCKS5 · HTTP/1.1
//!                                       dispatched on the first byte
//! ```
//!
//! The client side accepts plain TCP and forwards it over a link encoded
//! with a password-derived keystream. The server decodes the link, detects
//! the inner proxy dialect from its first byte, completes that dialect's
//! handshake, connects to the destination (directly or through an upstream
//! gateway), and relays both directions until either side closes.
//!
//! The obfuscation is an anti-fingerprinting veneer, not a cipher; it has
//! no framing and no handshake of its own.

pub mod client;
pub mod codec;
pub mod endpoint;
pub mod error;
pub mod proxy;
pub mod server;

pub use endpoint::{Endpoint, Schema};
pub use error::{Error, Result};

/// Default shared password used by the client when none is configured.
pub const DEFAULT_PASSWORD: &str = "12345678";

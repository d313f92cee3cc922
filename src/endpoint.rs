//! Destination and gateway endpoints.

use std::fmt;

use crate::error::{Error, Result};

/// Connection schema of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    /// Connect directly, no proxy semantics
    None,
    /// Final destination produced by an inbound parser
    Tcp,
    /// Alias of socks5
    Socks,
    /// SOCKS4 gateway
    Socks4,
    /// SOCKS5 gateway
    Socks5,
    /// HTTP CONNECT gateway
    Http,
    /// Unrecognized schema; rejected at gateway dispatch
    Other(String),
}

impl From<&str> for Schema {
    fn from(s: &str) -> Self {
        match s {
            "" | "none" => Schema::None,
            "tcp" => Schema::Tcp,
            "socks" => Schema::Socks,
            "socks4" => Schema::Socks4,
            "socks5" => Schema::Socks5,
            "http" => Schema::Http,
            other => Schema::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::None => f.write_str("none"),
            Schema::Tcp => f.write_str("tcp"),
            Schema::Socks => f.write_str("socks"),
            Schema::Socks4 => f.write_str("socks4"),
            Schema::Socks5 => f.write_str("socks5"),
            Schema::Http => f.write_str("http"),
            Schema::Other(s) => f.write_str(s),
        }
    }
}

/// A destination or gateway: schema, host, and port.
///
/// `request` carries the raw first HTTP request for non-CONNECT methods,
/// replayed to the destination as the very first outbound bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub schema: Schema,
    pub host: String,
    pub port: u16,
    pub request: Option<Vec<u8>>,
}

impl Endpoint {
    /// The direct-connect sentinel, `none://`.
    pub fn none() -> Self {
        Self {
            schema: Schema::None,
            host: String::new(),
            port: 0,
            request: None,
        }
    }

    /// A final destination with no further proxy semantics.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            schema: Schema::Tcp,
            host: host.into(),
            port,
            request: None,
        }
    }

    /// Parse `[schema://][host[:port]]`.
    ///
    /// Without `://` the whole string is the schema. An empty schema
    /// normalizes to `none`. The host is not validated; a port that is not
    /// a decimal u16 fails.
    pub fn parse(s: &str) -> Result<Self> {
        let (schema, rest) = match s.split_once("://") {
            Some((schema, rest)) => (schema, Some(rest)),
            None => (s, None),
        };

        let mut host = String::new();
        let mut port = 0u16;
        if let Some(rest) = rest {
            match rest.split_once(':') {
                Some((h, p)) => {
                    host = h.to_string();
                    port = p
                        .parse()
                        .map_err(|_| Error::config(format!("invalid port in endpoint {:?}", s)))?;
                }
                None => host = rest.to_string(),
            }
        }

        Ok(Self {
            schema: Schema::from(schema),
            host,
            port,
            request: None,
        })
    }

    /// `host:port` form used for dialing.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schema == Schema::None {
            f.write_str("none://")
        } else {
            write!(f, "{}://{}:{}", self.schema, self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let ep = Endpoint::parse("socks5://127.0.0.1:1080").unwrap();
        assert_eq!(ep.schema, Schema::Socks5);
        assert_eq!(ep.host, "127.0.0.1");
        assert_eq!(ep.port, 1080);
        assert_eq!(ep.address(), "127.0.0.1:1080");
    }

    #[test]
    fn test_parse_schema_only() {
        let ep = Endpoint::parse("http").unwrap();
        assert_eq!(ep.schema, Schema::Http);
        assert_eq!(ep.host, "");
        assert_eq!(ep.port, 0);
    }

    #[test]
    fn test_parse_empty_normalizes_to_none() {
        let ep = Endpoint::parse("").unwrap();
        assert_eq!(ep.schema, Schema::None);
        assert_eq!(ep.to_string(), "none://");
    }

    #[test]
    fn test_parse_host_without_port() {
        let ep = Endpoint::parse("http://gateway.local").unwrap();
        assert_eq!(ep.host, "gateway.local");
        assert_eq!(ep.port, 0);
    }

    #[test]
    fn test_parse_bad_port() {
        assert!(Endpoint::parse("socks5://host:70000").is_err());
        assert!(Endpoint::parse("socks5://host:abc").is_err());
    }

    #[test]
    fn test_parse_unknown_schema_is_kept() {
        let ep = Endpoint::parse("quic://h:1").unwrap();
        assert_eq!(ep.schema, Schema::Other("quic".to_string()));
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["tcp://example.com:8080", "socks5://10.0.0.1:1080", "http://gw:3128"] {
            let ep = Endpoint::parse(s).unwrap();
            assert_eq!(ep.to_string(), s);
            assert_eq!(Endpoint::parse(&ep.to_string()).unwrap(), ep);
        }

        let none = Endpoint::none();
        assert_eq!(none.to_string(), "none://");
        assert_eq!(Endpoint::parse("none://").unwrap(), none);
    }
}

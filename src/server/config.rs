//! Server configuration.

use serde::{Deserialize, Serialize};

use crate::endpoint::{Endpoint, Schema};
use crate::error::{Error, Result};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub listen: String,
    /// Optional upstream gateway, e.g. `socks5://10.0.0.1:1080`
    pub gateway: Option<String>,
    /// Obfuscation password; accepted connections are plain when unset
    pub password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:1443".to_string(),
            gateway: None,
            password: None,
        }
    }
}

impl ServerConfig {
    /// Parse the gateway string, defaulting to direct connections.
    ///
    /// A schema the outbound connectors cannot chain through is a fatal
    /// configuration error.
    pub fn gateway_endpoint(&self) -> Result<Endpoint> {
        let Some(raw) = self.gateway.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(Endpoint::none());
        };
        let ep = Endpoint::parse(raw)?;
        match ep.schema {
            Schema::None | Schema::Socks | Schema::Socks4 | Schema::Socks5 | Schema::Http => Ok(ep),
            _ => Err(Error::config("schema invalid of gateway Endpoint")),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.listen.is_empty() {
            return Err(Error::config("listen cannot be empty"));
        }
        self.gateway_endpoint().map(|_| ())
    }
}

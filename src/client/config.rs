//! Client configuration.

use serde::{Deserialize, Serialize};

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Local listen address
    pub local: String,
    /// Remote server address
    pub remote: String,
    /// Shared obfuscation password
    pub password: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            local: "0.0.0.0:2080".to_string(),
            remote: "127.0.0.1:1443".to_string(),
            password: crate::DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl ClientConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.local.is_empty() {
            return Err("local cannot be empty".into());
        }
        if self.remote.is_empty() {
            return Err("remote cannot be empty".into());
        }
        if self.password.is_empty() {
            return Err("password cannot be empty".into());
        }
        Ok(())
    }
}

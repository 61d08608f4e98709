//! Mock server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::mock::MatchPolicy;

/// Where the mock server listens and how it ranks stubs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address. Port 0 picks a free port.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub policy: MatchPolicy,
    /// Stub file loaded by `serve`.
    #[serde(default)]
    pub stubs: Option<PathBuf>,
}

fn default_bind() -> String {
    "127.0.0.1:0".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            policy: MatchPolicy::default(),
            stubs: None,
        }
    }
}

impl ServerConfig {
    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `bind` is not `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                field: "bind",
                reason: e.to_string(),
            }
            .into()
        })
    }
}

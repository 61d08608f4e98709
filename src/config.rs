//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with an environment variable
//! override for the secret key (`PUBSUB_SECRET_KEY`), which should never need
//! to live in the file.
//!
//! # Example
//!
//! ```no_run
//! use pubsub_mock::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod logging;
pub mod server;

use std::path::Path;

use serde::Deserialize;

pub use client::{ClientConfig, HttpConfig};
pub use logging::LoggingConfig;
pub use server::ServerConfig;

use crate::error::{ConfigError, Result};

/// Environment variable that overrides `client.secret_key`.
pub const SECRET_KEY_ENV: &str = "PUBSUB_SECRET_KEY";

/// Main configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Client settings. Optional so a pure `serve` config can omit them.
    #[serde(default)]
    pub client: Option<ClientConfig>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let (Some(client), Ok(secret)) = (config.client.as_mut(), std::env::var(SECRET_KEY_ENV)) {
            client.secret_key = Some(secret);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    fn validate(&self) -> Result<()> {
        if let Some(client) = &self.client {
            client.validate()?;
        }
        self.server.bind_addr()?;
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

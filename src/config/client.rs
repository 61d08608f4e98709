//! Client (dispatcher) configuration.

use serde::Deserialize;

use crate::domain::SignatureVersion;
use crate::error::{ConfigError, Result};

/// HTTP settings for the dispatcher transport.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_http_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

const fn default_http_timeout_ms() -> u64 {
    5000
}

const fn default_http_connect_timeout_ms() -> u64 {
    2000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            connect_timeout_ms: default_http_connect_timeout_ms(),
        }
    }
}

/// Account keys and endpoint for the pub/sub client.
///
/// The secret key is optional: without it requests go out unsigned and
/// carry no `timestamp`. It is normally supplied through
/// `PUBSUB_SECRET_KEY` rather than the config file.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub subscribe_key: String,
    pub publish_key: String,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub auth_key: Option<String>,
    pub uuid: String,
    /// Base URL, e.g. `http://127.0.0.1:8080`.
    pub origin: String,
    #[serde(default)]
    pub signature_version: SignatureVersion,
    #[serde(default)]
    pub http: HttpConfig,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("subscribe_key", &self.subscribe_key)
            .field("publish_key", &self.publish_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("auth_key", &self.auth_key)
            .field("uuid", &self.uuid)
            .field("origin", &self.origin)
            .field("signature_version", &self.signature_version)
            .field("http", &self.http)
            .finish()
    }
}

impl ClientConfig {
    /// Minimal config pointed at `origin`.
    #[must_use]
    pub fn new(
        subscribe_key: impl Into<String>,
        publish_key: impl Into<String>,
        uuid: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            subscribe_key: subscribe_key.into(),
            publish_key: publish_key.into(),
            secret_key: None,
            auth_key: None,
            uuid: uuid.into(),
            origin: origin.into(),
            signature_version: SignatureVersion::default(),
            http: HttpConfig::default(),
        }
    }

    #[must_use]
    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    #[must_use]
    pub fn with_auth_key(mut self, auth_key: impl Into<String>) -> Self {
        self.auth_key = Some(auth_key.into());
        self
    }

    /// Check required fields and value ranges.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.subscribe_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "subscribe_key",
            }
            .into());
        }
        if self.publish_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "publish_key",
            }
            .into());
        }
        if self.uuid.is_empty() {
            return Err(ConfigError::MissingField { field: "uuid" }.into());
        }
        if self.origin.is_empty() {
            return Err(ConfigError::MissingField { field: "origin" }.into());
        }
        if let Err(e) = url::Url::parse(&self.origin) {
            return Err(ConfigError::InvalidValue {
                field: "origin",
                reason: e.to_string(),
            }
            .into());
        }
        if matches!(&self.secret_key, Some(key) if key.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "secret_key",
                reason: "must not be empty when set".to_string(),
            }
            .into());
        }
        if self.http.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn config() -> ClientConfig {
        ClientConfig::new("sub", "pub", "mytestuuid", "http://127.0.0.1:9")
    }

    #[test]
    fn minimal_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn empty_subscribe_key_is_missing() {
        let mut c = config();
        c.subscribe_key.clear();
        assert!(matches!(
            c.validate(),
            Err(Error::Config(ConfigError::MissingField {
                field: "subscribe_key"
            }))
        ));
    }

    #[test]
    fn blank_secret_key_is_rejected() {
        let c = config().with_secret_key("  ");
        assert!(matches!(
            c.validate(),
            Err(Error::Config(ConfigError::InvalidValue {
                field: "secret_key",
                ..
            }))
        ));
    }

    #[test]
    fn unparsable_origin_is_rejected() {
        let mut c = config();
        c.origin = "not a url".into();
        assert!(matches!(
            c.validate(),
            Err(Error::Config(ConfigError::InvalidValue { field: "origin", .. }))
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", config().with_secret_key("hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}

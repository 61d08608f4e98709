//! Request signatures.
//!
//! A signature is an HMAC-SHA256 digest, keyed with the account secret, over
//! a canonical string built from the request. Parameters are held in a
//! `BTreeMap` so the canonical query is always sorted by key, whatever order
//! the caller inserted them in. The `signature` parameter itself is never
//! part of the signed material.
//!
//! The same function signs outgoing requests in the client and pre-computes
//! expected values for stubs in tests.
//!
//! ```
//! use std::collections::BTreeMap;
//! use pubsub_mock::domain::signature::{sign, SigningInput};
//! use pubsub_mock::domain::Method;
//!
//! let mut params = BTreeMap::new();
//! params.insert("uuid".to_string(), "mytestuuid".to_string());
//! params.insert("timestamp".to_string(), "1356998400".to_string());
//!
//! let input = SigningInput {
//!     subscribe_key: "sub-demo",
//!     publish_key: "pub-demo",
//!     method: Method::Get,
//!     path: "/v1/channel-registration/sub-key/sub-demo/channel-group",
//!     params: &params,
//! };
//!
//! let first = sign("secret", &input).unwrap();
//! assert_eq!(first, sign("secret", &input).unwrap());
//! ```

use std::collections::BTreeMap;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use super::encoding::encode_component;
use super::method::Method;
use crate::error::{ConfigError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Name of the query parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "signature";

/// Layout of the signed material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureVersion {
    /// `subscribe_key \n publish_key \n path \n query`, padded base64.
    #[default]
    V1,
    /// `METHOD \n publish_key \n path \n query \n`, `v2.` prefix, unpadded.
    V2,
}

/// Everything that feeds into a signature.
#[derive(Debug, Clone, Copy)]
pub struct SigningInput<'a> {
    pub subscribe_key: &'a str,
    pub publish_key: &'a str,
    pub method: Method,
    pub path: &'a str,
    pub params: &'a BTreeMap<String, String>,
}

impl SigningInput<'_> {
    /// The exact string that gets signed for `version`.
    #[must_use]
    pub fn material(&self, version: SignatureVersion) -> String {
        let query = canonical_query(self.params);
        match version {
            SignatureVersion::V1 => format!(
                "{}\n{}\n{}\n{}",
                self.subscribe_key, self.publish_key, self.path, query
            ),
            SignatureVersion::V2 => format!(
                "{}\n{}\n{}\n{}\n",
                self.method, self.publish_key, self.path, query
            ),
        }
    }
}

/// Sorted `key=value` pairs joined with `&`, excluding the signature itself.
#[must_use]
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(key, _)| key.as_str() != SIGNATURE_PARAM)
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign `input` with `secret_key` using the default layout.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] when the secret key is empty.
pub fn sign(secret_key: &str, input: &SigningInput<'_>) -> Result<String> {
    Signer::new(secret_key)?.sign(input)
}

/// A validated secret key plus the layout it signs with.
#[derive(Clone)]
pub struct Signer {
    secret: String,
    version: SignatureVersion,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &"<redacted>")
            .field("version", &self.version)
            .finish()
    }
}

impl Signer {
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the secret key is blank.
    pub fn new(secret_key: &str) -> Result<Self> {
        if secret_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "secret_key",
            }
            .into());
        }
        Ok(Self {
            secret: secret_key.to_string(),
            version: SignatureVersion::default(),
        })
    }

    #[must_use]
    pub fn with_version(mut self, version: SignatureVersion) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn version(&self) -> SignatureVersion {
        self.version
    }

    /// # Errors
    ///
    /// Fails only if the MAC cannot be keyed, which HMAC never rejects.
    pub fn sign(&self, input: &SigningInput<'_>) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "secret_key",
                reason: e.to_string(),
            }
        })?;
        mac.update(input.material(self.version).as_bytes());
        let digest = mac.finalize().into_bytes();

        Ok(match self.version {
            SignatureVersion::V1 => URL_SAFE.encode(digest),
            SignatureVersion::V2 => format!("v2.{}", URL_SAFE_NO_PAD.encode(digest)),
        })
    }
}

//! Requests as seen by the mock server at match time.

use std::collections::BTreeMap;

use serde::Serialize;

use super::method::Method;

/// One incoming request, decoded for matching.
///
/// Query parameters are stored decoded. When a key repeats, the last value
/// wins, mirroring how the client never sends duplicate keys. The path keeps
/// its wire form; [`PathPattern`](super::PathPattern) decodes it per segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingRequest {
    pub method: Method,
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl IncomingRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    /// Build from a raw path and an optional form-urlencoded query string.
    #[must_use]
    pub fn from_parts(method: Method, path: &str, query: Option<&str>) -> Self {
        let params = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect::<BTreeMap<_, _>>()
            })
            .unwrap_or_default();

        Self {
            method,
            path: path.to_string(),
            params,
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

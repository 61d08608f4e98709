//! Stubs: a request predicate paired with a canned response.
//!
//! A [`Stub`] matches an [`IncomingRequest`] when the method is equal, the
//! path matches its [`PathPattern`] and every required parameter is present
//! in the request with an equal value. Parameters the stub does not name are
//! ignored, so a stub can assert `signature` without pinning `timestamp`.
//!
//! # Example
//!
//! ```
//! use pubsub_mock::domain::{IncomingRequest, Method, Stub};
//!
//! let stub = Stub::builder()
//!     .method(Method::Get)
//!     .path_template("/v1/channel-registration/sub-key/{0}/channel-group/{1}", ["SK", "G"])
//!     .param("add", "CHAN")
//!     .response(r#"{"status":200,"message":"OK","service":"channel-registry","error":false}"#)
//!     .status_code(200)
//!     .build()
//!     .unwrap();
//!
//! let request = IncomingRequest::new(Method::Get, "/v1/channel-registration/sub-key/SK/channel-group/G")
//!     .with_param("add", "CHAN")
//!     .with_param("timestamp", "1356998400");
//!
//! assert!(stub.matches(&request));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::encoding::{decode_component, encode_component};
use super::error::DomainError;
use super::method::Method;
use super::request::IncomingRequest;
use crate::error::Result;

/// Canned response owned by a stub. Copied out on every match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubResponse {
    pub status_code: u16,
    pub body: String,
}

impl StubResponse {
    #[must_use]
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Path a stub matches against.
///
/// Built from a template. Positional placeholders (`{0}`, `{1}`, ...) are
/// substituted when the stub is built; any placeholder still present
/// afterwards matches exactly one non-empty segment.
///
/// Literal segments are held decoded and incoming segments are decoded
/// before comparison, so `team:alpha` matches `team%3Aalpha` on the wire and
/// an encoded `/` stays inside its segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a path without positional substitution.
    pub fn parse(path: &str) -> std::result::Result<Self, DomainError> {
        if path.trim().is_empty() {
            return Err(DomainError::EmptyPath);
        }

        let segments = path
            .split('/')
            .map(|segment| match placeholder_name(segment) {
                Some(name) => Segment::Placeholder(name.to_string()),
                None => Segment::Literal(decode_component(segment).into_owned()),
            })
            .collect();

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    /// Substitute positional placeholders with `args`.
    ///
    /// Each argument fills exactly one segment, whatever characters it holds.
    pub fn render<I, S>(template: &str, args: I) -> std::result::Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if template.trim().is_empty() {
            return Err(DomainError::EmptyPath);
        }
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();

        let mut raw = Vec::new();
        let mut segments = Vec::new();
        for segment in template.split('/') {
            match placeholder_name(segment) {
                Some(name) => match name.parse::<usize>() {
                    Ok(index) => {
                        let arg = args
                            .get(index)
                            .ok_or(DomainError::MissingPathArgument { index })?;
                        raw.push(encode_component(arg));
                        segments.push(Segment::Literal(arg.clone()));
                    }
                    Err(_) => {
                        raw.push(segment.to_string());
                        segments.push(Segment::Placeholder(name.to_string()));
                    }
                },
                None => {
                    raw.push(segment.to_string());
                    segments.push(Segment::Literal(decode_component(segment).into_owned()));
                }
            }
        }

        Ok(Self {
            raw: raw.join("/"),
            segments,
        })
    }

    /// Wire form of the pattern, arguments percent-encoded.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the wire path `path` matches segment for segment.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let mut incoming = path.split('/');
        for segment in &self.segments {
            let Some(actual) = incoming.next() else {
                return false;
            };
            match segment {
                Segment::Literal(expected) if *expected != decode_component(actual) => {
                    return false
                }
                Segment::Placeholder(_) if actual.is_empty() => return false,
                _ => {}
            }
        }
        incoming.next().is_none()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

/// A registered expectation: predicate plus canned response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stub {
    pub method: Method,
    pub path: PathPattern,
    pub params: BTreeMap<String, String>,
    pub response: StubResponse,
}

impl Stub {
    #[must_use]
    pub fn builder() -> StubBuilder {
        StubBuilder::default()
    }

    /// Method equal, path matches and required params are a subset of the
    /// request's params.
    #[must_use]
    pub fn matches(&self, request: &IncomingRequest) -> bool {
        self.method == request.method
            && self.path.matches(&request.path)
            && self
                .params
                .iter()
                .all(|(key, value)| request.params.get(key) == Some(value))
    }

    /// Number of required parameters, used for specificity ranking.
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.params.len()
    }
}

/// Builder mirroring the registration surface tests use.
#[derive(Debug, Default)]
pub struct StubBuilder {
    method: Method,
    path: Option<std::result::Result<PathPattern, DomainError>>,
    params: BTreeMap<String, String>,
    body: String,
    status_code: Option<u16>,
}

impl StubBuilder {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Literal path; named placeholders such as `{group}` act as wildcards.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(PathPattern::parse(path));
        self
    }

    /// Path template with positional `{n}` placeholders filled from `args`.
    #[must_use]
    pub fn path_template<I, S>(mut self, template: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.path = Some(PathPattern::render(template, args));
        self
    }

    /// Require `name=value` in the incoming query.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn response(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Validate and produce the stub.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when the path is missing, a positional
    /// argument is missing, or the status code is outside `100..=599`.
    pub fn build(self) -> Result<Stub> {
        let path = self.path.ok_or(DomainError::EmptyPath)??;
        let status_code = self.status_code.unwrap_or(200);
        if !(100..=599).contains(&status_code) {
            return Err(DomainError::InvalidStatusCode(status_code).into());
        }

        Ok(Stub {
            method: self.method,
            path,
            params: self.params,
            response: StubResponse::new(status_code, self.body),
        })
    }
}

/// On-disk form used by stub files.
#[derive(Debug, Clone, Deserialize)]
pub struct StubDefinition {
    #[serde(default)]
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: String,
}

const fn default_status() -> u16 {
    200
}

impl TryFrom<StubDefinition> for Stub {
    type Error = crate::error::Error;

    fn try_from(def: StubDefinition) -> Result<Self> {
        def.params
            .into_iter()
            .fold(Stub::builder().method(def.method).path(&def.path), |b, (k, v)| {
                b.param(k, v)
            })
            .response(def.body)
            .status_code(def.status)
            .build()
    }
}

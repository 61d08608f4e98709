//! Loading stubs from a TOML file for standalone serving.
//!
//! ```toml
//! [[stubs]]
//! method = "GET"
//! path = "/v1/channel-registration/sub-key/demo/channel-group/my_group"
//! status = 200
//! body = '{"status": 200, "message": "OK", "service": "channel-registry", "error": false}'
//!
//! [stubs.params]
//! add = "my_channel"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::domain::{Stub, StubDefinition};
use crate::error::{ConfigError, Result};

#[derive(Debug, Deserialize)]
struct StubFile {
    #[serde(default)]
    stubs: Vec<StubDefinition>,
}

/// Parse stub definitions from TOML content, preserving file order.
///
/// # Errors
///
/// Returns a parse error for malformed TOML or a domain error for an
/// invalid stub.
pub fn parse_stubs(content: &str) -> Result<Vec<Stub>> {
    let file: StubFile = toml::from_str(content).map_err(ConfigError::Parse)?;
    file.stubs.into_iter().map(Stub::try_from).collect()
}

/// Read and parse a stub file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_stubs<P: AsRef<Path>>(path: P) -> Result<Vec<Stub>> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
    parse_stubs(&content)
}

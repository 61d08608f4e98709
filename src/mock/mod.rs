//! In-process mock of the hosted REST API.
//!
//! - [`registry`] - ordered stubs and the matching policy
//! - [`server`] - axum listener answering from the registry
//! - [`stub_file`] - stub definitions loaded from TOML

pub mod registry;
pub mod server;
pub mod stub_file;

pub use registry::{MatchPolicy, StubRegistry};
pub use server::{MockServer, MockServerBuilder, RecordedRequest, FALLBACK_BODY};
pub use stub_file::{load_stubs, parse_stubs};

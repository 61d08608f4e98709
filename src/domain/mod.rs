//! Transport-agnostic types shared by the mock server and the client.
//!
//! - [`stub`] - stubs, path patterns and canned responses
//! - [`request`] - incoming requests as seen at match time
//! - [`signature`] - canonical request signing
//! - [`encoding`] - RFC 3986 percent-encoding of path segments and query values
//! - [`status`] - completion status handed to callbacks
//! - [`result`] - typed per-operation results

pub mod encoding;
pub mod error;
pub mod method;
pub mod request;
pub mod result;
pub mod signature;
pub mod status;
pub mod stub;

pub use error::DomainError;
pub use method::Method;
pub use request::IncomingRequest;
pub use result::{
    AddChannelsResult, DeleteGroupResult, Envelope, GrantResult, ListChannelsResult,
    ListGroupsResult, OperationResult, Permissions, RemoveChannelsResult, RequestContext,
};
pub use signature::{sign, SignatureVersion, Signer, SigningInput};
pub use status::{Operation, Status, StatusCategory};
pub use stub::{PathPattern, Stub, StubBuilder, StubDefinition, StubResponse};

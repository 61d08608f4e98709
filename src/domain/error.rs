//! Domain validation errors for stubs and requests.
//!
//! These errors are returned by builders and parsers when an input violates
//! a domain invariant, before anything reaches the registry or the wire.
//!
//! # Examples
//!
//! ```
//! use pubsub_mock::domain::error::DomainError;
//! use pubsub_mock::domain::stub::Stub;
//!
//! let result = Stub::builder()
//!     .path_template("/v1/channel-registration/sub-key/{0}/channel-group/{1}", ["demo"])
//!     .build();
//!
//! assert!(matches!(
//!     result,
//!     Err(pubsub_mock::error::Error::Domain(DomainError::MissingPathArgument { index: 1 }))
//! ));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A stub was built without a path.
    #[error("stub path cannot be empty")]
    EmptyPath,

    /// A positional placeholder had no matching argument.
    #[error("path template references argument {index} but it was not supplied")]
    MissingPathArgument {
        /// Index of the unfilled `{n}` placeholder.
        index: usize,
    },

    /// An HTTP method name was not recognised.
    #[error("unsupported HTTP method '{0}'")]
    InvalidMethod(String),

    /// A request parameter could not be accepted.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A status code outside the valid HTTP range.
    #[error("status code {0} is not a valid HTTP status")]
    InvalidStatusCode(u16),
}

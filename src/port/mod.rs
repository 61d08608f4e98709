//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Available Ports
//!
//! - [`Callback`] - Completion of a dispatched operation
//! - [`Clock`], [`IdGenerator`] - Timestamp and request-id sources
//! - [`Transport`] - Outbound request/response exchange

mod callback;
mod clock;
mod transport;

pub use callback::{channel, Callback, ChannelCallback};
pub use clock::{Clock, FixedClock, FixedId, IdGenerator, SystemClock, UuidGenerator};
pub use transport::{Transport, TransportError, TransportRequest, TransportResponse};

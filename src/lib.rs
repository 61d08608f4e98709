//! pubsub-mock - Deterministic test double for a hosted pub/sub REST API.
//!
//! The crate has two halves that meet over HTTP on the loopback interface:
//! an in-process [`mock::MockServer`] that answers from registered stubs,
//! and an asynchronous [`client::PubSubClient`] whose operations report back
//! through callbacks. The [`harness`] module lets tests wait on those
//! callbacks with a deadline instead of sleeping.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with env override for the secret key
//! - [`domain`] - Stubs, requests, signatures, statuses and typed results
//! - [`port`] - Callback, clock, id and transport traits
//! - [`mock`] - Stub registry, matching policy and the axum-backed server
//! - [`client`] - Channel-group and grant operations, dispatched async
//! - [`harness`] - `Latch`, `Probe` and `Fixture` for tests
//! - [`cli`] - `serve` and `sign` commands
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use pubsub_mock::domain::{AddChannelsResult, Method, Stub};
//! use pubsub_mock::harness::{Fixture, Probe, DEFAULT_WAIT};
//!
//! # async fn demo() -> pubsub_mock::error::Result<()> {
//! let fixture = Fixture::start().await?;
//! fixture.mount(
//!     Stub::builder()
//!         .method(Method::Get)
//!         .path("/v1/channel-registration/sub-key/sub-c-mock/channel-group/G")
//!         .param("add", "CHAN")
//!         .response(r#"{"status": 200, "message": "OK", "service": "channel-registry", "error": false}"#),
//! )?;
//!
//! let client = fixture.client()?;
//! let probe = Probe::<AddChannelsResult>::new("add channel to group");
//! client
//!     .add_channels_to_channel_group()
//!     .channels(["CHAN"])
//!     .channel_group("G")
//!     .execute(probe.expect_success());
//!
//! assert!(probe.wait(DEFAULT_WAIT).await?);
//! fixture.teardown().await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod harness;
pub mod mock;
pub mod port;

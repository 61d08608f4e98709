//! Per-test mock server plus a client config pointed at it.

use crate::client::PubSubClient;
use crate::config::ClientConfig;
use crate::domain::StubBuilder;
use crate::error::Result;
use crate::mock::{MatchPolicy, MockServer};
use crate::port::{FixedClock, FixedId};

/// Subscribe key used by fixture clients.
pub const SUBSCRIBE_KEY: &str = "sub-c-mock";
/// Publish key used by fixture clients.
pub const PUBLISH_KEY: &str = "pub-c-mock";
/// Secret key for [`Fixture::signed_config`].
pub const SECRET_KEY: &str = "sec-c-mock";
pub const UUID: &str = "mytestuuid";
pub const AUTH_KEY: &str = "myAuth";
/// `timestamp` sent by fixture clients (2013-01-01T00:00:00Z).
pub const TIMESTAMP: i64 = 1_356_998_400;
/// `requestid` sent by fixture clients.
pub const REQUEST_ID: &str = "myRequestId";

/// Owns one running [`MockServer`] for the duration of a test.
///
/// ```no_run
/// use pubsub_mock::harness::{Fixture, Probe, DEFAULT_WAIT};
/// use pubsub_mock::domain::ListGroupsResult;
///
/// # async fn demo() -> pubsub_mock::error::Result<()> {
/// let fixture = Fixture::start().await?;
/// let client = fixture.client()?;
/// let probe = Probe::<ListGroupsResult>::new("list channel groups");
///
/// client.list_channel_groups().execute(probe.expect_success());
/// let passed = probe.wait(DEFAULT_WAIT).await?;
/// fixture.teardown().await?;
/// # let _ = passed;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Fixture {
    server: MockServer,
    config: ClientConfig,
}

impl Fixture {
    /// Start a server with first-registered matching.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the server cannot bind.
    pub async fn start() -> Result<Self> {
        Self::with_policy(MatchPolicy::default()).await
    }

    /// Start a server with an explicit match policy.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the server cannot bind.
    pub async fn with_policy(policy: MatchPolicy) -> Result<Self> {
        let server = MockServer::builder().policy(policy).start().await?;
        let config = ClientConfig::new(SUBSCRIBE_KEY, PUBLISH_KEY, UUID, server.uri());
        Ok(Self { server, config })
    }

    #[must_use]
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Unsigned config pointed at the server.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        self.config.clone()
    }

    /// Config carrying [`SECRET_KEY`] and [`AUTH_KEY`].
    #[must_use]
    pub fn signed_config(&self) -> ClientConfig {
        self.config
            .clone()
            .with_secret_key(SECRET_KEY)
            .with_auth_key(AUTH_KEY)
    }

    /// Fresh unsigned client with deterministic timestamp and request id.
    ///
    /// # Errors
    ///
    /// See [`PubSubClient::new`].
    pub fn client(&self) -> Result<PubSubClient> {
        self.client_with(self.config())
    }

    /// Fresh client for `config` with deterministic timestamp and request id.
    ///
    /// # Errors
    ///
    /// See [`PubSubClient::new`].
    pub fn client_with(&self, config: ClientConfig) -> Result<PubSubClient> {
        PubSubClient::builder(config)
            .clock(FixedClock(TIMESTAMP))
            .id_generator(FixedId(REQUEST_ID.to_string()))
            .build()
    }

    /// Register a stub on the server.
    ///
    /// # Errors
    ///
    /// Returns the builder's validation error.
    pub fn mount(&self, stub: StubBuilder) -> Result<()> {
        self.server.mount(stub)
    }

    /// Stop the server and wait for it to finish.
    ///
    /// # Errors
    ///
    /// See [`MockServer::stop`].
    pub async fn teardown(self) -> Result<()> {
        self.server.stop().await
    }
}

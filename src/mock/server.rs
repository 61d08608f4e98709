//! HTTP front-end for the stub registry.
//!
//! Every method and path is routed to one fallback handler that decodes the
//! request, asks the registry for a response and records the request in the
//! journal. Unmatched requests get [`FALLBACK_BODY`] with a 404.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::registry::{MatchPolicy, StubRegistry};
use crate::config::ServerConfig;
use crate::domain::{IncomingRequest, Method, Stub, StubBuilder};
use crate::error::{Error, Result};

/// Body returned when no stub matches.
pub const FALLBACK_BODY: &str =
    r#"{"status":404,"error":true,"service":"mock-server","message":"Not Found"}"#;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// One request as it arrived, with whether a stub answered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedRequest {
    pub request: IncomingRequest,
    pub matched: bool,
}

#[derive(Clone)]
struct ServerState {
    registry: Arc<StubRegistry>,
    journal: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn handle(State(state): State<ServerState>, method: axum::http::Method, uri: Uri) -> Response {
    let Ok(method) = method.as_str().parse::<Method>() else {
        warn!(method = %method, path = %uri.path(), "Unsupported method");
        return fallback();
    };

    let request = IncomingRequest::from_parts(method, uri.path(), uri.query());
    let found = state.registry.find(&request);

    if found.is_none() {
        warn!(
            method = %request.method,
            path = %request.path,
            params = ?request.params,
            "No stub matched"
        );
    }

    state.journal.lock().push(RecordedRequest {
        request,
        matched: found.is_some(),
    });

    match found {
        Some(response) => {
            let status =
                StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                response.body,
            )
                .into_response()
        }
        None => fallback(),
    }
}

fn fallback() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "application/json")],
        FALLBACK_BODY,
    )
        .into_response()
}

/// Builder for a [`MockServer`] with explicit settings.
#[derive(Debug)]
pub struct MockServerBuilder {
    bind: SocketAddr,
    policy: MatchPolicy,
    stubs: Vec<Stub>,
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            policy: MatchPolicy::default(),
            stubs: Vec::new(),
        }
    }
}

impl MockServerBuilder {
    /// Builder seeded from configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error if the bind address is invalid.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            bind: config.bind_addr()?,
            policy: config.policy,
            stubs: Vec::new(),
        })
    }

    #[must_use]
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind = addr;
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stubs registered before the first request can arrive.
    #[must_use]
    pub fn stubs(mut self, stubs: impl IntoIterator<Item = Stub>) -> Self {
        self.stubs.extend(stubs);
        self
    }

    /// Bind the listener and start serving in the background.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the address cannot be bound.
    pub async fn start(self) -> Result<MockServer> {
        let registry = Arc::new(StubRegistry::new(self.policy));
        for stub in self.stubs {
            registry.register(stub);
        }

        let state = ServerState {
            registry,
            journal: Arc::new(Mutex::new(Vec::new())),
        };

        let listener = TcpListener::bind(self.bind).await?;
        let address = listener.local_addr()?;
        let router = Router::new().fallback(handle).with_state(state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(err) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %err, "Mock server terminated");
            }
        });

        info!(address = %address, policy = ?self.policy, "Mock server started");

        Ok(MockServer {
            address,
            state,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// In-process HTTP mock server.
///
/// Lives for one fixture: start it in set-up, register stubs per test,
/// stop it in tear-down. Dropping it also shuts the listener down.
pub struct MockServer {
    address: SocketAddr,
    state: ServerState,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Start on a free loopback port with default settings.
    ///
    /// # Errors
    ///
    /// Returns an IO error if no port can be bound.
    pub async fn start() -> Result<Self> {
        Self::builder().start().await
    }

    #[must_use]
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::default()
    }

    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn register(&self, stub: Stub) {
        self.state.registry.register(stub);
    }

    /// Build and register in one step.
    ///
    /// # Errors
    ///
    /// Returns the builder's validation error; nothing is registered then.
    pub fn mount(&self, builder: StubBuilder) -> Result<()> {
        self.register(builder.build()?);
        Ok(())
    }

    #[must_use]
    pub fn registry(&self) -> &StubRegistry {
        &self.state.registry
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn received_requests(&self) -> Vec<RecordedRequest> {
        self.state.journal.lock().clone()
    }

    /// Drop all stubs and the request journal.
    pub fn reset(&self) {
        self.state.registry.clear();
        self.state.journal.lock().clear();
        debug!(address = %self.address, "Mock server reset");
    }

    /// Stop accepting requests and wait for the server task to finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the server task panicked.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(joined) => joined.map_err(|e| Error::Server(e.to_string()))?,
                Err(_) => {
                    warn!(address = %self.address, "Graceful shutdown timed out, aborting");
                    abort.abort();
                }
            }
        }
        info!(address = %self.address, "Mock server stopped");
        Ok(())
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("address", &self.address)
            .field("stubs", &self.state.registry.len())
            .finish()
    }
}

//! Asynchronous channel-group client.
//!
//! Operations are dispatched fire-and-forget: `execute` returns at once, the
//! HTTP exchange runs on the tokio runtime captured at construction, and the
//! caller's [`Callback`] is invoked exactly once with the parsed result and
//! a [`Status`]. Failures (no matching route, transport errors, malformed
//! bodies, invalid input, cancellation) are all delivered through the same
//! callback; nothing is thrown across the asynchronous boundary.
//!
//! # Example
//!
//! ```no_run
//! use pubsub_mock::client::PubSubClient;
//! use pubsub_mock::config::ClientConfig;
//! use pubsub_mock::domain::{AddChannelsResult, Status};
//!
//! # async fn demo() -> pubsub_mock::error::Result<()> {
//! let config = ClientConfig::new("sub-key", "pub-key", "my-uuid", "http://127.0.0.1:8080");
//! let client = PubSubClient::new(config)?;
//!
//! client
//!     .add_channels_to_channel_group()
//!     .channels(["news"])
//!     .channel_group("feeds")
//!     .execute(|result: Option<AddChannelsResult>, status: Status| {
//!         println!("error={} code={} result={result:?}", status.error, status.status_code);
//!     });
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod operation;
mod pending;

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

pub use http::HttpTransport;
pub use operation::{
    AddChannelsToGroup, DeleteChannelGroup, Grant, ListChannelGroups, ListChannelsForGroup,
    RemoveChannelsFromGroup, RequestSpec,
};

use pending::{PendingCalls, Resolution};

use crate::config::ClientConfig;
use crate::domain::{
    DomainError, Envelope, Operation, OperationResult, RequestContext, Signer, SigningInput,
    Status, StatusCategory,
};
use crate::error::{ConfigError, Result};
use crate::port::{
    Callback, Clock, IdGenerator, SystemClock, Transport, TransportError, TransportRequest,
    UuidGenerator,
};

/// Value of the `pnsdk` parameter sent with every request.
pub const SDK_NAME: &str = concat!("PubSubMock-Rust/", env!("CARGO_PKG_VERSION"));

struct ClientInner {
    config: ClientConfig,
    signer: Option<Signer>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    pending: PendingCalls,
    runtime: Handle,
}

/// Async dispatcher for channel-group and access-manager operations.
///
/// Cheap to clone; clones share pending calls and the transport.
#[derive(Clone)]
pub struct PubSubClient {
    inner: Arc<ClientInner>,
}

/// Builder for swapping the clock, id source or transport.
pub struct PubSubClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    runtime: Option<Handle>,
}

impl PubSubClientBuilder {
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Run dispatched work on `handle` instead of the current runtime.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Validate the config and build the client.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if validation fails or no tokio runtime is
    /// available, and [`crate::error::Error::Http`] if the HTTP client cannot
    /// be built.
    pub fn build(self) -> Result<PubSubClient> {
        self.config.validate()?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| ConfigError::InvalidValue {
                field: "runtime",
                reason: e.to_string(),
            })?,
        };

        let signer = match &self.config.secret_key {
            Some(secret) => {
                Some(Signer::new(secret)?.with_version(self.config.signature_version))
            }
            None => None,
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&self.config)?),
        };

        info!(
            origin = %self.config.origin,
            uuid = %self.config.uuid,
            signed = signer.is_some(),
            "Client created"
        );

        Ok(PubSubClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                signer,
                transport,
                clock: self.clock,
                ids: self.ids,
                pending: PendingCalls::default(),
                runtime,
            }),
        })
    }
}

impl PubSubClient {
    /// Client with the system clock, random request ids and HTTP transport.
    ///
    /// # Errors
    ///
    /// See [`PubSubClientBuilder::build`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    #[must_use]
    pub fn builder(config: ClientConfig) -> PubSubClientBuilder {
        PubSubClientBuilder {
            config,
            transport: None,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
            runtime: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub(crate) fn subscribe_key(&self) -> &str {
        &self.inner.config.subscribe_key
    }

    pub(crate) fn signs_requests(&self) -> bool {
        self.inner.signer.is_some()
    }

    pub fn add_channels_to_channel_group(&self) -> AddChannelsToGroup<'_> {
        AddChannelsToGroup::new(self)
    }

    pub fn remove_channels_from_channel_group(&self) -> RemoveChannelsFromGroup<'_> {
        RemoveChannelsFromGroup::new(self)
    }

    pub fn list_channels_for_channel_group(&self) -> ListChannelsForGroup<'_> {
        ListChannelsForGroup::new(self)
    }

    pub fn list_channel_groups(&self) -> ListChannelGroups<'_> {
        ListChannelGroups::new(self)
    }

    pub fn delete_channel_group(&self) -> DeleteChannelGroup<'_> {
        DeleteChannelGroup::new(self)
    }

    pub fn grant(&self) -> Grant<'_> {
        Grant::new(self)
    }

    /// Number of dispatched operations whose callback has not run yet.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Resolve every in-flight operation with a `Cancelled` status and stop
    /// its network exchange. Returns how many callbacks were invoked.
    pub fn end_pending_requests(&self) -> usize {
        let cancelled = self.inner.pending.cancel_all();
        if cancelled > 0 {
            info!(cancelled, "Ended pending requests");
        }
        cancelled
    }

    /// Common parameters, timestamp and signature on top of `spec`.
    ///
    /// # Errors
    ///
    /// Propagates a signing failure.
    pub fn prepare(&self, spec: &RequestSpec) -> Result<TransportRequest> {
        let config = &self.inner.config;
        let mut params = spec.params.clone();
        params.insert("pnsdk".into(), SDK_NAME.into());
        params.insert("uuid".into(), config.uuid.clone());
        params.insert("requestid".into(), self.inner.ids.next_id());
        if let Some(auth) = &config.auth_key {
            params.entry("auth".into()).or_insert_with(|| auth.clone());
        }

        if let Some(signer) = &self.inner.signer {
            params.insert(
                "timestamp".into(),
                self.inner.clock.unix_timestamp().to_string(),
            );
            let signature = signer.sign(&SigningInput {
                subscribe_key: &config.subscribe_key,
                publish_key: &config.publish_key,
                method: spec.method,
                path: &spec.path,
                params: &params,
            })?;
            params.insert("signature".into(), signature);
        }

        Ok(TransportRequest {
            method: spec.method,
            path: spec.path.clone(),
            params,
        })
    }

    /// Dispatch a prepared spec. Returns immediately; `callback` runs once
    /// on completion, failure or cancellation.
    pub fn dispatch<T, C>(&self, spec: RequestSpec, callback: C)
    where
        T: OperationResult,
        C: Callback<T>,
    {
        let operation = spec.operation;
        self.submit(operation, Ok(spec), callback);
    }

    pub(crate) fn submit<T, C>(
        &self,
        operation: Operation,
        spec: std::result::Result<RequestSpec, DomainError>,
        callback: C,
    ) where
        T: OperationResult,
        C: Callback<T>,
    {
        let context = spec
            .as_ref()
            .map(|s| s.context.clone())
            .unwrap_or_default();

        let prepared = spec
            .map_err(|e| e.to_string())
            .and_then(|s| self.prepare(&s).map_err(|e| e.to_string()));

        let call = self.inner.pending.register(
            operation,
            Box::new(move |resolution| {
                let (result, status) = interpret::<T>(operation, &context, resolution);
                debug!(
                    operation = %operation,
                    error = status.error,
                    status_code = status.status_code,
                    has_result = result.is_some(),
                    "Invoking callback"
                );
                Box::new(callback).on_complete(result, status);
            }),
        );

        let inner = Arc::clone(&self.inner);
        let task_call = Arc::clone(&call);
        let handle = self.inner.runtime.spawn(async move {
            // A cancel may land before the abort handle is attached.
            if task_call.is_resolved() {
                debug!(id = task_call.id(), operation = %operation, "Cancelled before send");
                return;
            }
            let resolution = match prepared {
                Ok(request) => match inner.transport.execute(&request).await {
                    Ok(response) => Resolution::Response(response),
                    Err(TransportError::Timeout(message)) => Resolution::Failed(Status::failure(
                        operation,
                        StatusCategory::Timeout,
                        message,
                    )),
                    Err(TransportError::Network(message)) => Resolution::Failed(Status::failure(
                        operation,
                        StatusCategory::Network,
                        message,
                    )),
                },
                Err(message) => {
                    warn!(operation = %operation, reason = %message, "Rejected before dispatch");
                    Resolution::Failed(Status::failure(
                        operation,
                        StatusCategory::BadRequest,
                        message,
                    ))
                }
            };
            inner.pending.complete(&task_call, resolution);
        });
        call.attach(handle.abort_handle());

        debug!(id = call.id(), operation = %operation, "Dispatched");
    }
}

/// Turn a raw resolution into the typed result and status.
fn interpret<T: OperationResult>(
    operation: Operation,
    context: &RequestContext,
    resolution: Resolution,
) -> (Option<T>, Status) {
    let response = match resolution {
        Resolution::Failed(status) => return (None, status),
        Resolution::Response(response) => response,
    };

    let Some(envelope) = Envelope::parse(&response.body) else {
        let mut status = Status::from_response(operation, response.status_code, None, false);
        status.error = true;
        if status.category == StatusCategory::Acknowledgment {
            status.category = StatusCategory::MalformedResponse;
        }
        return (None, status.with_message("response body is not a service envelope"));
    };

    let result = T::from_envelope(&envelope, context);
    let mut status = Status::from_response(
        operation,
        response.status_code,
        envelope.service.clone(),
        envelope.error,
    );
    if status.error {
        status.error_message = envelope.message.clone();
    }
    (result, status)
}

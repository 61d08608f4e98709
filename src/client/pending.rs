//! Bookkeeping for in-flight operations.
//!
//! Each dispatched operation owns a [`PendingCall`] whose resolver can be
//! taken exactly once. The worker task and [`PendingCalls::cancel_all`] race
//! to take it; whichever wins invokes the callback, the other finds the slot
//! empty and does nothing.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::{debug, error};

use crate::domain::{Operation, Status};
use crate::port::TransportResponse;

/// How an operation ended, before result parsing.
#[derive(Debug, Clone)]
pub(crate) enum Resolution {
    Response(TransportResponse),
    Failed(Status),
}

pub(crate) type Resolver = Box<dyn FnOnce(Resolution) + Send>;

pub(crate) struct PendingCall {
    id: u64,
    operation: Operation,
    resolver: Mutex<Option<Resolver>>,
    task: Mutex<Option<AbortHandle>>,
}

impl PendingCall {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Invoke the resolver if nobody has yet. Returns whether this call did.
    ///
    /// A panic inside the callback is caught and logged here so it never
    /// reaches the worker task or the cancelling caller.
    pub(crate) fn resolve(&self, resolution: Resolution) -> bool {
        let Some(resolver) = self.resolver.lock().take() else {
            return false;
        };

        if catch_unwind(AssertUnwindSafe(|| resolver(resolution))).is_err() {
            error!(
                id = self.id,
                operation = %self.operation,
                "Callback panicked; completion still counted"
            );
        }
        true
    }

    /// True once the callback has run or been claimed by a cancel.
    pub(crate) fn is_resolved(&self) -> bool {
        self.resolver.lock().is_none()
    }

    /// Remember the worker so a cancel can abort it. A call cancelled before
    /// its worker was attached aborts the worker here instead.
    pub(crate) fn attach(&self, handle: AbortHandle) {
        let mut task = self.task.lock();
        if self.is_resolved() {
            debug!(id = self.id, "Call already resolved; aborting worker");
            handle.abort();
        } else {
            *task = Some(handle);
        }
    }

    fn cancel(&self) -> bool {
        let resolved = self.resolve(Resolution::Failed(Status::cancelled(self.operation)));
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        resolved
    }
}

/// All outstanding calls of one client.
#[derive(Default)]
pub(crate) struct PendingCalls {
    calls: DashMap<u64, Arc<PendingCall>>,
    next_id: AtomicU64,
}

impl PendingCalls {
    pub(crate) fn register(&self, operation: Operation, resolver: Resolver) -> Arc<PendingCall> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let call = Arc::new(PendingCall {
            id,
            operation,
            resolver: Mutex::new(Some(resolver)),
            task: Mutex::new(None),
        });
        self.calls.insert(id, Arc::clone(&call));
        debug!(id, operation = %operation, "Pending call registered");
        call
    }

    /// Resolve and forget a call from its worker.
    pub(crate) fn complete(&self, call: &PendingCall, resolution: Resolution) -> bool {
        let resolved = call.resolve(resolution);
        self.calls.remove(&call.id());
        resolved
    }

    /// Resolve every outstanding call as cancelled. Returns how many
    /// callbacks this invoked.
    pub(crate) fn cancel_all(&self) -> usize {
        let ids: Vec<u64> = self.calls.iter().map(|entry| *entry.key()).collect();
        ids.into_iter()
            .filter_map(|id| self.calls.remove(&id))
            .filter(|(_, call)| call.cancel())
            .count()
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }
}

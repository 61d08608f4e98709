//! Per-test completion context.
//!
//! A [`Probe`] pairs a [`Latch`] with the outcome of one operation. Tests
//! create one per case and move its callback into the dispatch, so no state
//! is shared across tests.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error};

use super::latch::Latch;
use crate::domain::Status;
use crate::error::HarnessError;
use crate::port::Callback;

/// What a callback received.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub result: Option<T>,
    pub status: Status,
}

struct ProbeState<T> {
    latch: Latch,
    succeeded: AtomicBool,
    outcome: Mutex<Option<Outcome<T>>>,
}

/// Completion tracker for one operation under test.
pub struct Probe<T> {
    state: Arc<ProbeState<T>>,
}

impl<T> Clone for Probe<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Send + 'static> Probe<T> {
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            state: Arc::new(ProbeState {
                latch: Latch::new(operation),
                succeeded: AtomicBool::new(false),
                outcome: Mutex::new(None),
            }),
        }
    }

    /// Callback that runs `check` on the completion and signals this probe.
    ///
    /// The probe counts as succeeded only if `check` returns `true`. A panic
    /// in `check` counts as a failure. The latch is signalled on every path,
    /// including when the callback is dropped without being invoked.
    pub fn callback<F>(&self, check: F) -> ProbeCallback<T, F>
    where
        F: FnOnce(Option<&T>, &Status) -> bool + Send + 'static,
    {
        ProbeCallback {
            state: Arc::clone(&self.state),
            check: Some(check),
        }
    }

    /// Callback that succeeds whenever the status is not an error.
    pub fn expect_success(&self) -> ProbeCallback<T, fn(Option<&T>, &Status) -> bool> {
        self.callback(no_error::<T> as fn(Option<&T>, &Status) -> bool)
    }

    /// Re-arm before the next dispatch.
    pub fn reset(&self) {
        self.state.latch.reset();
        self.state.succeeded.store(false, Ordering::SeqCst);
        *self.state.outcome.lock() = None;
    }

    #[must_use]
    pub fn latch(&self) -> &Latch {
        &self.state.latch
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state.succeeded.load(Ordering::SeqCst)
    }

    /// Wait for the callback, then report whether its check passed.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if the callback never ran.
    pub async fn wait(&self, timeout: Duration) -> Result<bool, HarnessError> {
        self.state.latch.wait(timeout).await?;
        Ok(self.succeeded())
    }

    /// Blocking variant of [`Probe::wait`].
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if the callback never ran.
    pub fn wait_blocking(&self, timeout: Duration) -> Result<bool, HarnessError> {
        self.state.latch.wait_blocking(timeout)?;
        Ok(self.succeeded())
    }

    /// Remove and return the recorded outcome.
    pub fn take_outcome(&self) -> Option<Outcome<T>> {
        self.state.outcome.lock().take()
    }
}

impl<T: Clone + Send + 'static> Probe<T> {
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.state.outcome.lock().clone()
    }
}

fn no_error<T>(_: Option<&T>, status: &Status) -> bool {
    !status.error
}

/// Sets the latch when dropped.
struct Signal(Latch);

impl Drop for Signal {
    fn drop(&mut self) {
        self.0.set();
    }
}

/// [`Callback`] produced by [`Probe::callback`].
pub struct ProbeCallback<T, F> {
    state: Arc<ProbeState<T>>,
    check: Option<F>,
}

impl<T, F> Drop for ProbeCallback<T, F> {
    fn drop(&mut self) {
        if self.check.is_some() {
            debug!(operation = %self.state.latch.operation(), "Callback dropped without completion");
            self.state.latch.set();
        }
    }
}

impl<T, F> Callback<T> for ProbeCallback<T, F>
where
    T: Send + 'static,
    F: FnOnce(Option<&T>, &Status) -> bool + Send + 'static,
{
    fn on_complete(mut self: Box<Self>, result: Option<T>, status: Status) {
        let state = Arc::clone(&self.state);
        let _signal = Signal(state.latch.clone());
        let Some(check) = self.check.take() else {
            return;
        };

        let passed = match catch_unwind(AssertUnwindSafe(|| check(result.as_ref(), &status))) {
            Ok(passed) => passed,
            Err(_) => {
                error!(operation = %state.latch.operation(), "Check panicked");
                false
            }
        };

        state.succeeded.store(passed, Ordering::SeqCst);
        *state.outcome.lock() = Some(Outcome { result, status });
    }
}

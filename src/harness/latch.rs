//! One-shot event with bounded waits.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;
use tracing::warn;

use crate::error::HarnessError;

struct LatchState {
    set: Mutex<bool>,
    cond: Condvar,
    notify: Notify,
}

/// Event that a callback sets and a test waits on with a deadline.
///
/// Clones share the same state. Call [`Latch::reset`] before each dispatch
/// so a wake from a previous operation is not mistaken for the next one.
#[derive(Clone)]
pub struct Latch {
    operation: Arc<str>,
    state: Arc<LatchState>,
}

impl std::fmt::Debug for Latch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Latch")
            .field("operation", &self.operation)
            .field("set", &self.is_set())
            .finish()
    }
}

impl Latch {
    /// `operation` names what is being awaited in timeout errors.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Arc::from(operation.into()),
            state: Arc::new(LatchState {
                set: Mutex::new(false),
                cond: Condvar::new(),
                notify: Notify::new(),
            }),
        }
    }

    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn set(&self) {
        let mut set = self.state.set.lock();
        *set = true;
        self.state.cond.notify_all();
        self.state.notify.notify_waiters();
    }

    pub fn reset(&self) {
        *self.state.set.lock() = false;
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.state.set.lock()
    }

    /// Wait until set or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] naming the operation when the
    /// deadline passes first.
    pub async fn wait(&self, timeout: Duration) -> Result<(), HarnessError> {
        let waiting = async {
            loop {
                let notified = self.state.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.is_set() {
                    return;
                }
                notified.await;
            }
        };

        tokio::time::timeout(timeout, waiting)
            .await
            .map_err(|_| self.timed_out(timeout))
    }

    /// Blocking variant of [`Latch::wait`] for synchronous tests.
    ///
    /// Must not be called from inside an async task.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] when the deadline passes first.
    pub fn wait_blocking(&self, timeout: Duration) -> Result<(), HarnessError> {
        let mut set = self.state.set.lock();
        if !*set {
            self.state
                .cond
                .wait_while_for(&mut set, |set| !*set, timeout);
        }
        if *set {
            Ok(())
        } else {
            Err(self.timed_out(timeout))
        }
    }

    fn timed_out(&self, waited: Duration) -> HarnessError {
        warn!(operation = %self.operation, ?waited, "Wait timed out");
        HarnessError::Timeout {
            operation: self.operation.to_string(),
            waited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[tokio::test]
    async fn wait_returns_once_set() {
        let latch = Latch::new("grant");
        let setter = latch.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            setter.set();
        });

        latch.wait(Duration::from_secs(5)).await.unwrap();
        assert!(latch.is_set());
    }

    #[tokio::test]
    async fn wait_on_already_set_latch_is_immediate() {
        let latch = Latch::new("list");
        latch.set();
        latch.wait(Duration::from_millis(1)).await.unwrap();
    }

    #[tokio::test]
    async fn timeout_names_the_operation() {
        let latch = Latch::new("add channel to group");
        let err = latch.wait(Duration::from_millis(30)).await.unwrap_err();
        assert_eq!(
            err,
            HarnessError::Timeout {
                operation: "add channel to group".into(),
                waited: Duration::from_millis(30),
            }
        );
    }

    #[tokio::test]
    async fn reset_rearms() {
        let latch = Latch::new("remove");
        latch.set();
        latch.reset();
        assert!(!latch.is_set());
        assert!(latch.wait(Duration::from_millis(10)).await.is_err());
    }

    #[test]
    fn blocking_wait_sees_set_from_other_thread() {
        let latch = Latch::new("delete");
        let setter = latch.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            setter.set();
        });

        latch.wait_blocking(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn blocking_wait_times_out() {
        let latch = Latch::new("never");
        let err = latch.wait_blocking(Duration::from_millis(20)).unwrap_err();
        assert!(err.to_string().contains("never"));
    }
}

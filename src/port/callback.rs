//! Completion callback port.

use tokio::sync::oneshot;

use crate::domain::Status;

/// Receives the single completion of a dispatched operation.
///
/// Implemented for any `FnOnce(Option<T>, Status)` closure and for
/// [`ChannelCallback`], so a test can hand in a closure or await a channel.
pub trait Callback<T>: Send + 'static {
    fn on_complete(self: Box<Self>, result: Option<T>, status: Status);
}

impl<T, F> Callback<T> for F
where
    F: FnOnce(Option<T>, Status) + Send + 'static,
{
    fn on_complete(self: Box<Self>, result: Option<T>, status: Status) {
        (*self)(result, status);
    }
}

/// Callback that forwards the completion into a oneshot channel.
pub struct ChannelCallback<T> {
    tx: oneshot::Sender<(Option<T>, Status)>,
}

impl<T: Send + 'static> Callback<T> for ChannelCallback<T> {
    fn on_complete(self: Box<Self>, result: Option<T>, status: Status) {
        // Receiver may have been dropped by a test that stopped caring.
        let _ = self.tx.send((result, status));
    }
}

/// Create a [`ChannelCallback`] and the receiver its completion lands on.
#[must_use]
pub fn channel<T>() -> (ChannelCallback<T>, oneshot::Receiver<(Option<T>, Status)>) {
    let (tx, rx) = oneshot::channel();
    (ChannelCallback { tx }, rx)
}

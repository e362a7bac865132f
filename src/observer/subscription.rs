//! Consumer handle for a running observer.
//!
//! A [`Subscription`] pairs the event stream with the cancellation signal
//! of the background poll task. Cancelling (or dropping) the subscription
//! is the only way to stop that task.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::domain::DeviceEvent;

/// Live event stream from a [`super::DeviceObserver`].
///
/// The poll task waits until the consumer has taken each event before it
/// polls again. A slow consumer therefore slows down polling instead of
/// queueing events.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<DeviceEvent>,
    cancel: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(
        events: mpsc::Receiver<DeviceEvent>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            events,
            cancelled: Box::pin(cancel.clone().cancelled_owned()),
            cancel,
            task: Some(task),
        }
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the stream has ended, either because the
    /// subscription was cancelled or because enumeration failed.
    pub async fn recv(&mut self) -> Option<DeviceEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    /// Stops the background task. Calling it more than once is a no-op.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once [`Subscription::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns a token that cancels this subscription from another task.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels the subscription and waits for the poll task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "observer task did not exit cleanly");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for Subscription {
    type Item = DeviceEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<DeviceEvent>> {
        let this = self.get_mut();
        if this.cancel.is_cancelled() || this.cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(None);
        }
        this.events.poll_recv(cx)
    }
}

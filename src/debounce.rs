//! Trailing-edge debounce over a rapidly-changing input value.
//!
//! [`Debouncer`] converts a stream of input changes (e.g. keystrokes) into
//! single settled values: each [`notify()`](Debouncer::notify) discards the
//! previous quiet-period timer and starts a new one carrying only the newest
//! value. A value is emitted only once the input has stopped changing for
//! the full quiet period — no leading-edge emission, no max-wait cap.
//!
//! Settled values arrive through a bounded `tokio::sync::mpsc` channel
//! wrapped in [`Settled`], so a slow consumer exerts backpressure instead
//! of accumulating unread emissions.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::telemetry;

/// Number of settled values buffered between the debouncer and its consumer.
const SETTLED_BUFFER: usize = 8;

pin_project_lite::pin_project! {
    /// Stream of settled values emitted by a [`Debouncer`].
    ///
    /// Ends (yields `None`) once the debouncer is dropped and any buffered
    /// emissions have been drained.
    pub struct Settled<T> {
        #[pin]
        inner: ReceiverStream<T>,
    }
}

impl<T> Stream for Settled<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.project().inner.poll_next(cx)
    }
}

impl<T> Settled<T> {
    /// Receive the next settled value, or `None` if the debouncer is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.inner.next().await
    }
}

/// Trailing-edge debounce coordinator with a fixed quiet period.
///
/// Debouncing is value-blind: notifying with a value identical to the last
/// settled one still restarts the timer. Dropping the coordinator cancels
/// any pending timer, so no emission can occur after disposal.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use requery::Debouncer;
///
/// # async fn example() {
/// let (mut debouncer, mut settled) = Debouncer::new(Duration::from_millis(500));
/// debouncer.notify("r".to_owned());
/// debouncer.notify("re".to_owned());
/// debouncer.notify("react".to_owned());
/// // 500ms after the last keystroke:
/// assert_eq!(settled.recv().await.as_deref(), Some("react"));
/// # }
/// ```
pub struct Debouncer<T> {
    quiet_period: Duration,
    tx: mpsc::Sender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer and the stream of values it settles into.
    pub fn new(quiet_period: Duration) -> (Self, Settled<T>) {
        let (tx, rx) = mpsc::channel(SETTLED_BUFFER);
        (
            Self {
                quiet_period,
                tx,
                pending: None,
            },
            Settled {
                inner: ReceiverStream::new(rx),
            },
        )
    }

    /// Record the newest value and (re)start the quiet-period timer.
    ///
    /// Any pending timer is discarded along with the value it carried; only
    /// the newest value can be emitted.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context.
    pub fn notify(&mut self, value: T) {
        self.cancel();
        let tx = self.tx.clone();
        let quiet_period = self.quiet_period;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            // Only a delivered value counts as an emission.
            if tx.send(value).await.is_ok() {
                metrics::counter!(telemetry::DEBOUNCE_EMISSIONS_TOTAL).increment(1);
            }
        }));
    }

    /// Discard any pending timer without emitting.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        // No ghost emission after disposal.
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

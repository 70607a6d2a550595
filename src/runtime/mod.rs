//! Thin async runtime layer over tokio.
//!
//! Adapters only see these helpers, so the scheduling of deferred commands
//! lives in one place.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// A boxed future type, used where trait objects must return futures.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error returned when a timeout expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation timed out")
    }
}

impl std::error::Error for TimedOut {}

/// Sleep for the specified duration.
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await
}

/// Run a future with a timeout.
///
/// Returns `Err(TimedOut)` if the timeout expires before the future completes.
pub async fn timeout<F, T>(duration: Duration, future: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimedOut)
}

/// Run `future` after `delay` on a background task.
///
/// Fire and forget: the task cannot be cancelled and its completion is not
/// reported to the caller.
pub fn spawn_after<F>(delay: Duration, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    drop(tokio::spawn(async move {
        sleep(delay).await;
        future.await;
    }));
}

/// A measurement of monotonically increasing time.
pub use tokio::time::Instant;

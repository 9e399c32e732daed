//! Load phase - consumes items and performs side effects.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// The Load phase - consumes items and performs side effects.
///
/// Lifecycle hooks:
/// - `initialize()` is called once before processing any items
/// - `load()` is called for each item in the stream
/// - `finalize()` is called once after the last item, with the pipeline result
///
/// # Example
///
/// ```rust
/// use wikiwerk::{FnLoad, Load};
/// use anyhow::Result;
///
/// async fn forward(record: String) -> Result<()> {
///     println!("forwarding {record}");
///     Ok(())
/// }
///
/// let loader = FnLoad(forward);
/// ```
pub trait Load<Input> {
    /// Prepare the sink before the first item. Does nothing by default.
    fn initialize(&self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Load a single item
    fn load(&self, item: Input) -> impl Future<Output = Result<()>> + Send;

    /// Release the sink after the last item. Does nothing by default.
    fn finalize(&self, _result: &Result<()>) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

/// Wrapper that implements [`Load`] for async functions.
pub struct FnLoad<F>(pub F);

impl<F, Fut, Input> Load<Input> for FnLoad<F>
where
    F: Fn(Input) -> Fut + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    fn load(&self, item: Input) -> impl Future<Output = Result<()>> + Send {
        (self.0)(item)
    }
}

/// Decorator that pauses for a fixed interval after every load.
///
/// The pause follows every `load()` that returns `Ok`, regardless of what the
/// inner sink did with the item. It is an unconditional rate limit, not
/// backpressure. A zero interval disables the pause.
pub struct Throttle<L> {
    inner: L,
    interval: Duration,
}

impl<L> Throttle<L> {
    pub fn new(inner: L, interval: Duration) -> Self {
        Self { inner, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<L, Input> Load<Input> for Throttle<L>
where
    L: Load<Input> + Sync,
    Input: Send,
{
    fn initialize(&self) -> impl Future<Output = Result<()>> + Send {
        self.inner.initialize()
    }

    fn load(&self, item: Input) -> impl Future<Output = Result<()>> + Send {
        let interval = self.interval;
        let forward = self.inner.load(item);

        async move {
            forward.await?;
            if !interval.is_zero() {
                tracing::trace!(?interval, "throttling before next item");
                tokio::time::sleep(interval).await;
            }
            Ok(())
        }
    }

    fn finalize(&self, result: &Result<()>) -> impl Future<Output = Result<()>> + Send {
        self.inner.finalize(result)
    }
}

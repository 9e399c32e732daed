//! Extract phase - produces streams of items from input sources.
//!
//! - [`Extract`] - the extractor trait
//! - [`FnExtract`] - wrap a function as an extractor
//! - [`FilterExtract`] - drop extracted items failing a predicate
//! - [`TakeExtractor`] - stop after n items
//! - [`ExtractExt`] - `filter()` / `take()` combinators

use anyhow::Result;
use futures::stream::BoxStream;
use tokio_stream::{adapters::Take, Stream};

/// The Extract phase - produces a stream of items from an input source.
///
/// Each item is wrapped in a `Result`; an `Err` item is fatal to a running
/// [`EtlPipeline`](crate::EtlPipeline).
///
/// # Example
///
/// ```rust
/// use wikiwerk::{iter_ok, Extract, FnExtract};
/// use anyhow::Result;
///
/// fn frames(_url: String) -> Result<impl tokio_stream::Stream<Item = Result<String>> + Send> {
///     Ok(iter_ok(vec!["frame-1".to_string(), "frame-2".to_string()]))
/// }
///
/// let extractor = FnExtract(frames);
/// ```
pub trait Extract<Input, Output> {
    /// The stream type produced by this extractor
    type StreamType: Stream<Item = Result<Output>> + Send;

    /// Open the source described by `input` and return its item stream
    fn extract(&self, input: Input) -> Result<Self::StreamType>;
}

/// Take combinator for extractors.
///
/// Created by [`ExtractExt::take`]; ends the stream after `n` items.
pub struct TakeExtractor<E> {
    inner: E,
    n: usize,
}

impl<E> TakeExtractor<E> {
    pub fn new(inner: E, n: usize) -> Self {
        Self { inner, n }
    }
}

impl<Input, Output, E> Extract<Input, Output> for TakeExtractor<E>
where
    E: Extract<Input, Output>,
{
    type StreamType = Take<E::StreamType>;

    fn extract(&self, input: Input) -> Result<Self::StreamType> {
        let stream = self.inner.extract(input)?;
        Ok(tokio_stream::StreamExt::take(stream, self.n))
    }
}

/// Decorator that drops extracted items failing a predicate.
///
/// Errors always pass through so the pipeline still sees them.
///
/// # Example
///
/// ```rust
/// use wikiwerk::{iter_ok, ExtractExt, FnExtract};
/// use anyhow::Result;
///
/// fn numbers(_: ()) -> Result<impl tokio_stream::Stream<Item = Result<i32>> + Send> {
///     Ok(iter_ok(vec![1, 2, 3, 4]))
/// }
///
/// let evens = FnExtract(numbers).filter(|n: &i32| n % 2 == 0);
/// ```
pub struct FilterExtract<E, P> {
    inner: E,
    predicate: P,
}

impl<E, P> FilterExtract<E, P> {
    pub fn new(inner: E, predicate: P) -> Self {
        Self { inner, predicate }
    }
}

impl<E, P, Input, Output> Extract<Input, Output> for FilterExtract<E, P>
where
    E: Extract<Input, Output>,
    E::StreamType: 'static,
    P: Fn(&Output) -> bool + Clone + Send + Sync + 'static,
    Output: Send + 'static,
{
    type StreamType = BoxStream<'static, Result<Output>>;

    fn extract(&self, input: Input) -> Result<Self::StreamType> {
        let stream = self.inner.extract(input)?;
        let predicate = self.predicate.clone();

        Ok(Box::pin(tokio_stream::StreamExt::filter_map(
            stream,
            move |item| match item {
                Ok(value) if predicate(&value) => Some(Ok(value)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            },
        )))
    }
}

/// Combinators available on every extractor.
pub trait ExtractExt<Input, Output>: Extract<Input, Output> + Sized {
    /// Limit the extracted stream to at most n items.
    fn take(self, n: usize) -> TakeExtractor<Self> {
        TakeExtractor::new(self, n)
    }

    /// Keep only the extracted items matching `predicate`.
    fn filter<P>(self, predicate: P) -> FilterExtract<Self, P>
    where
        P: Fn(&Output) -> bool,
    {
        FilterExtract::new(self, predicate)
    }
}

impl<T, Input, Output> ExtractExt<Input, Output> for T where T: Extract<Input, Output> {}

/// Wrapper that implements [`Extract`] for functions returning a stream.
pub struct FnExtract<F>(pub F);

impl<F, Input, Output, S> Extract<Input, Output> for FnExtract<F>
where
    F: Fn(Input) -> Result<S>,
    S: Stream<Item = Result<Output>> + Send + 'static,
{
    type StreamType = S;

    fn extract(&self, input: Input) -> Result<Self::StreamType> {
        (self.0)(input)
    }
}

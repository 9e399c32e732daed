//! Transform phase - maps each input item to a stream of output items.
//!
//! A transform may emit nothing (the item is dropped), one item, or an error
//! item that stops the pipeline.

use anyhow::Result;
use futures::stream::BoxStream;
use std::{marker::PhantomData, pin::pin};
use tokio_stream::{Stream, StreamExt};

/// The Transform phase - maps input items to output streams.
///
/// The stream type is a GAT so transforms can borrow from `self` for the
/// lifetime of the stream they return.
///
/// # Example
///
/// ```rust
/// use wikiwerk::{iter_ok, FnTransform};
/// use anyhow::Result;
///
/// fn split_words(line: String) -> Result<impl tokio_stream::Stream<Item = Result<String>> + Send> {
///     Ok(iter_ok(line.split_whitespace().map(str::to_string).collect()))
/// }
///
/// let transformer = FnTransform(split_words);
/// ```
pub trait Transform<Input, Output> {
    /// The stream type produced by this transformer
    type Stream<'a>: Stream<Item = Result<Output>> + Send + 'a
    where
        Self: 'a,
        Input: 'a,
        Output: 'a;

    /// Transform an input into a stream of outputs
    fn transform<'a>(&'a self, input: Input) -> Result<Self::Stream<'a>>
    where
        Input: 'a,
        Output: 'a;

    /// Feed every output of `self` into `next`.
    ///
    /// ```rust
    /// use wikiwerk::{once_ok, AtMostOne, FnTransform, Transform};
    /// use anyhow::Result;
    ///
    /// fn double(n: i32) -> Result<AtMostOne<i32>> {
    ///     Ok(once_ok(n * 2))
    /// }
    ///
    /// fn add_ten(n: i32) -> Result<AtMostOne<i32>> {
    ///     Ok(once_ok(n + 10))
    /// }
    ///
    /// let composed = FnTransform(double).and_then(FnTransform(add_ten));
    /// // 5 -> 10 -> 20
    /// ```
    fn and_then<T2, Output2>(self, next: T2) -> Compose<Self, T2, Output>
    where
        Self: Sized,
        T2: Transform<Output, Output2>,
    {
        Compose {
            first: self,
            second: next,
            _phantom: PhantomData,
        }
    }

    /// Drop outputs that do not satisfy `predicate`. Errors pass through.
    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        Self: Sized,
        P: Fn(&Output) -> bool,
    {
        Filter {
            transform: self,
            predicate,
        }
    }
}

/// Filter combinator, created by [`Transform::filter`].
pub struct Filter<T, P> {
    pub transform: T,
    pub predicate: P,
}

impl<T, P, Input, Output> Transform<Input, Output> for Filter<T, P>
where
    T: Transform<Input, Output>,
    P: Fn(&Output) -> bool + Sync,
    Output: Send,
{
    type Stream<'a>
        = BoxStream<'a, Result<Output>>
    where
        Self: 'a,
        Input: 'a,
        Output: 'a;

    fn transform<'a>(&'a self, input: Input) -> Result<Self::Stream<'a>>
    where
        Input: 'a,
        Output: 'a,
    {
        let stream = self.transform.transform(input)?;
        let predicate = &self.predicate;

        Ok(Box::pin(stream.filter_map(move |item| match item {
            Ok(value) if predicate(&value) => Some(Ok(value)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })))
    }
}

/// Sequential composition of two transformers, created by [`Transform::and_then`].
///
/// `Mid` is the item type passed from `first` to `second`.
pub struct Compose<T1, T2, Mid> {
    pub first: T1,
    pub second: T2,
    _phantom: PhantomData<Mid>,
}

impl<T1, T2, Input, Mid, Output> Transform<Input, Output> for Compose<T1, T2, Mid>
where
    T1: Transform<Input, Mid>,
    T2: Transform<Mid, Output> + Sync,
    Mid: Send,
    Output: Send,
{
    type Stream<'a>
        = BoxStream<'a, Result<Output>>
    where
        Self: 'a,
        Input: 'a,
        Output: 'a;

    fn transform<'a>(&'a self, input: Input) -> Result<Self::Stream<'a>>
    where
        Input: 'a,
        Output: 'a,
    {
        let outer = self.first.transform(input)?;
        let second = &self.second;

        Ok(Box::pin(async_stream::stream! {
            let mut outer = pin!(outer);
            while let Some(mid) = outer.next().await {
                let inner = match mid.and_then(|mid| second.transform(mid)) {
                    Ok(inner) => inner,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };
                let mut inner = pin!(inner);
                while let Some(output) = inner.next().await {
                    yield output;
                }
            }
        }))
    }
}

/// Wrapper that implements [`Transform`] for functions returning a stream.
pub struct FnTransform<F>(pub F);

impl<F, Input, Output, S> Transform<Input, Output> for FnTransform<F>
where
    F: Fn(Input) -> Result<S> + Sync,
    S: Stream<Item = Result<Output>> + Send + 'static,
{
    type Stream<'a>
        = S
    where
        Self: 'a,
        Input: 'a,
        Output: 'a;

    fn transform<'a>(&'a self, input: Input) -> Result<Self::Stream<'a>>
    where
        Input: 'a,
        Output: 'a,
    {
        (self.0)(input)
    }
}

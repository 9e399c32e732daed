//! # wikiwerk
//!
//! A small stream-based ETL (Extract, Transform, Load) framework.
//!
//! - **Extract**: sources that produce streams of items
//! - **Transform**: steps that map each item to zero or more outputs
//! - **Load**: sinks that consume items and perform side effects
//!
//! ```rust
//! use wikiwerk::{iter_ok, once_ok, AtMostOne, EtlPipeline, FnExtract, FnLoad, FnTransform};
//! use anyhow::Result;
//!
//! fn extract_data(_: ()) -> Result<impl tokio_stream::Stream<Item = Result<i32>> + Send> {
//!     Ok(iter_ok(vec![1, 2, 3]))
//! }
//!
//! fn transform_data(n: i32) -> Result<AtMostOne<i32>> {
//!     Ok(once_ok(n * 2))
//! }
//!
//! async fn load_data(n: i32) -> Result<()> {
//!     println!("Loaded: {}", n);
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = EtlPipeline::new(
//!         FnExtract(extract_data),
//!         FnTransform(transform_data),
//!         FnLoad(load_data),
//!     );
//!     pipeline.run(()).await.unwrap();
//! }
//! ```

pub mod extract;
pub mod load;
pub mod pipeline;
pub mod transform;

pub mod prelude;

pub use extract::{Extract, ExtractExt, FilterExtract, FnExtract, TakeExtractor};
pub use load::{FnLoad, Load, Throttle};
pub use pipeline::{EtlPipeline, RunStats};
pub use transform::{Compose, Filter, FnTransform, Transform};

pub use tokio_stream;

use anyhow::Result;
use tokio_stream::Stream;

/// Stream of zero or one results, the usual output of a per-item transform.
pub type AtMostOne<T> = tokio_stream::Iter<std::option::IntoIter<Result<T>>>;

/// A stream containing a single `Ok(value)`.
///
/// ```rust
/// use wikiwerk::once_ok;
/// use tokio_stream::StreamExt;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let results: Vec<_> = once_ok(42).collect().await;
/// assert_eq!(results[0].as_ref().unwrap(), &42);
/// # });
/// ```
pub fn once_ok<T>(value: T) -> AtMostOne<T> {
    tokio_stream::iter(Some(Ok(value)))
}

/// A stream containing a single `Err`, which stops a running pipeline.
pub fn once_err<T>(error: anyhow::Error) -> AtMostOne<T> {
    tokio_stream::iter(Some(Err(error)))
}

/// An empty stream: the input item is dropped.
pub fn none<T>() -> AtMostOne<T> {
    tokio_stream::iter(None)
}

/// A stream of `Ok` items built from a vector.
pub fn iter_ok<T>(values: Vec<T>) -> impl Stream<Item = Result<T>> + Send
where
    T: Send,
{
    tokio_stream::iter(values.into_iter().map(Ok))
}

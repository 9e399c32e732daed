//! ETL pipeline implementation.

use anyhow::Result;
use std::pin::pin;
use tokio_stream::StreamExt;

use crate::{Extract, Load, Transform};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Items produced by the extractor
    pub extracted: u64,
    /// Items handed to the loader
    pub loaded: u64,
}

/// Complete ETL pipeline combining Extract, Transform, and Load phases.
///
/// Items are pulled one at a time: each extracted item is fully transformed
/// and loaded before the next one is read from the source.
///
/// # Example
///
/// ```rust
/// use wikiwerk::{iter_ok, once_ok, AtMostOne, EtlPipeline, FnExtract, FnLoad, FnTransform};
/// use anyhow::Result;
///
/// fn extract(_: ()) -> Result<impl tokio_stream::Stream<Item = Result<i32>> + Send> {
///     Ok(iter_ok(vec![1, 2]))
/// }
///
/// fn transform(n: i32) -> Result<AtMostOne<i32>> {
///     Ok(once_ok(n * 2))
/// }
///
/// async fn load(n: i32) -> Result<()> {
///     println!("{}", n);
///     Ok(())
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let pipeline = EtlPipeline::new(FnExtract(extract), FnTransform(transform), FnLoad(load));
/// let stats = pipeline.run(()).await.unwrap();
/// assert_eq!(stats.loaded, 2);
/// # });
/// ```
pub struct EtlPipeline<E, T, L> {
    pub extract: E,
    pub transform: T,
    pub load: L,
}

impl<E, T, L> EtlPipeline<E, T, L> {
    pub fn new(extract: E, transform: T, load: L) -> Self {
        Self {
            extract,
            transform,
            load,
        }
    }

    /// Execute the pipeline until the extracted stream ends.
    ///
    /// The first error from any phase stops the run. The loader is finalized
    /// with the outcome either way, and that outcome is returned.
    pub async fn run<Input, Mid, Output>(&self, input: Input) -> Result<RunStats>
    where
        E: Extract<Input, Mid>,
        T: Transform<Mid, Output> + Sync,
        L: Load<Output>,
        Mid: Send,
    {
        self.load.initialize().await?;

        let mut stats = RunStats::default();
        let result: Result<()> = async {
            let stream = self.extract.extract(input)?;
            let mut stream = pin!(stream);

            while let Some(mid) = stream.next().await {
                stats.extracted += 1;
                let transformed = self.transform.transform(mid?)?;
                let mut transformed = pin!(transformed);

                while let Some(output) = transformed.next().await {
                    self.load.load(output?).await?;
                    stats.loaded += 1;
                }
            }

            Ok(())
        }
        .await;

        self.load.finalize(&result).await?;
        tracing::debug!(
            extracted = stats.extracted,
            loaded = stats.loaded,
            ok = result.is_ok(),
            "pipeline finished"
        );
        result.map(|()| stats)
    }
}

//! The ingestion loop.

use anyhow::{Context, Result};
use std::sync::Arc;
use wikiwerk_ksql::prelude::*;
use wikiwerk_sse::prelude::*;

use crate::change::{ChangeMapper, ChangeRecord, UserTypes};
use crate::config::Config;
use crate::namespace::NamespaceTable;
use crate::sink::JsonLinesLoad;
use crate::transform::change_transform;

/// Reads the feed and forwards every edit to the configured sink.
///
/// A run lasts until the feed closes, fails, or `--max-events` messages have
/// been read. There is no reconnect.
pub struct Ingestor {
    config: Config,
    mapper: ChangeMapper,
}

impl Ingestor {
    pub fn new(config: Config) -> Self {
        let mapper = ChangeMapper::new(Arc::new(NamespaceTable::wikipedia()), UserTypes::default());
        Self { config, mapper }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ksql_client(&self) -> Result<KsqlClient> {
        KsqlClient::with_config(&self.config.ksql_url, self.config.ksql_config())
            .context("Failed to create ksqlDB client")
    }

    /// Run against the configured feed and sink.
    pub async fn run(&self) -> Result<RunStats> {
        let extract = SseExtract::with_config(self.config.sse_config())
            .filter(SseMessage::is_message)
            .take(self.config.max_events.unwrap_or(usize::MAX));

        if self.config.dry_run {
            self.run_with(extract, JsonLinesLoad::stdout()).await
        } else {
            let load = KsqlLoad::new(self.ksql_client()?, self.config.stream.as_str());
            self.run_with(extract, load).await
        }
    }

    /// Run with a caller-supplied extractor and sink.
    ///
    /// The sink is wrapped in the configured throttle.
    pub async fn run_with<E, L>(&self, extract: E, load: L) -> Result<RunStats>
    where
        E: Extract<String, SseMessage>,
        L: Load<ChangeRecord> + Sync,
    {
        let pipeline = EtlPipeline::new(
            extract,
            change_transform(self.mapper.clone(), self.config.on_missing_field),
            Throttle::new(load, self.config.throttle()),
        );

        tracing::info!(feed_url = %self.config.feed_url, "starting ingestion");
        let stats = pipeline.run(self.config.feed_url.clone()).await?;
        tracing::info!(
            messages = stats.extracted,
            forwarded = stats.loaded,
            "feed ended"
        );
        Ok(stats)
    }
}

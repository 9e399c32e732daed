//! Command line and environment configuration.
//!
//! Every flag can also be set through a `WIKIWERK_*` environment variable.
//! With no arguments the ingester reads the public Wikimedia feed and writes
//! into `Wikipedia_STREAM` on a local ksqlDB server, pausing two seconds after
//! every record.

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::time::Duration;
use wikiwerk_ksql::KsqlConfig;
use wikiwerk_sse::SseConfig;

use crate::transform::MissingFieldPolicy;

pub const DEFAULT_FEED_URL: &str = "https://stream.wikimedia.org/v2/stream/recentchange";
pub const DEFAULT_KSQL_URL: &str = "http://localhost:8088";
pub const DEFAULT_STREAM: &str = "Wikipedia_STREAM";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable, multi-line
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "wikiwerk")]
#[command(version, about = "Forward Wikipedia edits from the recent-change feed into ksqlDB", long_about = None)]
pub struct Config {
    /// SSE feed of recent changes
    #[arg(long, env = "WIKIWERK_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Base URL of the ksqlDB server
    #[arg(long, env = "WIKIWERK_KSQL_URL", default_value = DEFAULT_KSQL_URL)]
    pub ksql_url: String,

    /// ksqlDB stream the records are inserted into
    #[arg(long, env = "WIKIWERK_STREAM", default_value = DEFAULT_STREAM)]
    pub stream: String,

    /// Pause after every forwarded record, in milliseconds
    #[arg(long, env = "WIKIWERK_THROTTLE_MS", default_value_t = 2000)]
    pub throttle_ms: u64,

    /// Stop after this many feed messages (unlimited when unset)
    #[arg(long, env = "WIKIWERK_MAX_EVENTS")]
    pub max_events: Option<usize>,

    /// How to handle edit events lacking a field
    #[arg(long, env = "WIKIWERK_ON_MISSING_FIELD", value_enum, default_value_t = MissingFieldPolicy::Skip)]
    pub on_missing_field: MissingFieldPolicy,

    /// Print records to stdout instead of sending them to ksqlDB
    #[arg(long, env = "WIKIWERK_DRY_RUN")]
    pub dry_run: bool,

    /// Connect timeout for the feed, in seconds
    #[arg(long, env = "WIKIWERK_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Give up when the feed is silent this long, in seconds
    #[arg(long, env = "WIKIWERK_IDLE_TIMEOUT_SECS")]
    pub idle_timeout_secs: Option<u64>,

    /// Talk HTTP/2 to ksqlDB without negotiation
    #[arg(long, env = "WIKIWERK_KSQL_HTTP2")]
    pub ksql_http2: bool,

    /// User-Agent sent to the feed
    #[arg(long, env = "WIKIWERK_USER_AGENT", default_value = concat!("wikiwerk/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "WIKIWERK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "WIKIWERK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    /// Reject settings that cannot work.
    pub fn validate(&self) -> Result<()> {
        check_url("feed URL", &self.feed_url)?;
        check_url("ksqlDB URL", &self.ksql_url)?;

        if self.stream.trim().is_empty() {
            bail!("Stream name cannot be empty");
        }

        if self.max_events == Some(0) {
            bail!("--max-events must be at least 1");
        }

        Ok(())
    }

    pub fn sse_config(&self) -> SseConfig {
        SseConfig {
            connect_timeout_secs: Some(self.connect_timeout_secs),
            idle_timeout_secs: self.idle_timeout_secs,
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn ksql_config(&self) -> KsqlConfig {
        KsqlConfig {
            http2_prior_knowledge: self.ksql_http2,
            ..KsqlConfig::default()
        }
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Log the effective settings
    pub fn log_config(&self) {
        tracing::info!(
            feed_url = %self.feed_url,
            ksql_url = %self.ksql_url,
            stream = %self.stream,
            throttle_ms = self.throttle_ms,
            max_events = ?self.max_events,
            on_missing_field = ?self.on_missing_field,
            dry_run = self.dry_run,
            "Ingester configuration"
        );
    }
}

fn check_url(what: &str, url: &str) -> Result<()> {
    if url.trim().is_empty() {
        bail!("{what} cannot be empty");
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("{what} must be an http(s) URL, got {url}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("wikiwerk").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);

        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.ksql_url, DEFAULT_KSQL_URL);
        assert_eq!(config.stream, "Wikipedia_STREAM");
        assert_eq!(config.throttle(), Duration::from_secs(2));
        assert_eq!(config.max_events, None);
        assert_eq!(config.on_missing_field, MissingFieldPolicy::Skip);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.dry_run);
        assert!(config.user_agent.starts_with("wikiwerk/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--ksql-url",
            "http://ksql:8088",
            "--throttle-ms",
            "0",
            "--max-events",
            "5",
            "--on-missing-field",
            "fail-fast",
            "--idle-timeout-secs",
            "30",
            "--ksql-http2",
            "--log-format",
            "json",
        ]);

        assert_eq!(config.throttle(), Duration::ZERO);
        assert_eq!(config.max_events, Some(5));
        assert_eq!(config.on_missing_field, MissingFieldPolicy::FailFast);
        assert_eq!(config.sse_config().idle_timeout_secs, Some(30));
        assert!(config.ksql_config().http2_prior_knowledge);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let config = parse(&["--feed-url", "ftp://example.org/feed"]);
        assert!(config.validate().unwrap_err().to_string().contains("http(s)"));

        let config = parse(&["--ksql-url", ""]);
        assert!(config.validate().unwrap_err().to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_rejects_empty_stream_and_zero_limit() {
        assert!(parse(&["--stream", " "]).validate().is_err());
        assert!(parse(&["--max-events", "0"]).validate().is_err());
    }

    #[test]
    fn test_unknown_policy_is_a_parse_error() {
        let result = Config::try_parse_from(["wikiwerk", "--on-missing-field", "retry"]);
        assert!(result.is_err());
    }
}

//! # Server-sent event extractor
//!
//! [`SseExtract`] connects to an SSE endpoint and yields every frame that
//! carries data as an [`SseMessage`]. Payloads are left as raw text: decoding
//! them is up to the pipeline's transform step, so a malformed payload can be
//! dropped without tearing down the connection.
//!
//! ```rust,no_run
//! use wikiwerk::{Extract, ExtractExt};
//! use wikiwerk_sse::{SseConfig, SseExtract, SseMessage};
//!
//! let extractor = SseExtract::with_config(SseConfig::default()).filter(SseMessage::is_message);
//! let stream = extractor.extract("https://stream.wikimedia.org/v2/stream/recentchange".to_string());
//! ```
//!
//! The connection is never re-established: when the server closes the
//! response the stream ends, and when the transport fails the stream yields
//! one error and ends.

use anyhow::{anyhow, Context, Result};
use futures::stream::BoxStream;
use reqwest::header::ACCEPT;
use sse_stream::SseStream;
use std::time::Duration;
use tokio_stream::StreamExt;
use wikiwerk::Extract;

pub mod prelude;

/// Event type of frames that carry no `event:` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// One SSE frame with a non-empty `data:` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    /// The `event:` field, or [`DEFAULT_EVENT_TYPE`] when absent
    pub event_type: String,
    /// The `data:` field, with multi-line data joined by the decoder
    pub data: String,
    /// The `id:` field, if present
    pub id: Option<String>,
}

impl SseMessage {
    /// A `message` frame carrying `data`.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            data: data.into(),
            id: None,
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    /// Whether this is a plain `message` frame.
    pub fn is_message(&self) -> bool {
        self.event_type == DEFAULT_EVENT_TYPE
    }
}

/// Connection settings for [`SseExtract`].
#[derive(Debug, Clone)]
pub struct SseConfig {
    /// TCP/TLS connect timeout in seconds (None for no timeout)
    pub connect_timeout_secs: Option<u64>,
    /// Longest silence tolerated between frames (None to wait forever)
    pub idle_timeout_secs: Option<u64>,
    /// `User-Agent` header sent with the request
    pub user_agent: String,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: Some(10),
            idle_timeout_secs: None,
            user_agent: concat!("wikiwerk-sse/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Extractor for server-sent event streams. The extract input is the URL.
#[derive(Debug, Clone, Default)]
pub struct SseExtract {
    config: SseConfig,
}

impl SseExtract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SseConfig {
        &self.config
    }

    fn client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(self.config.user_agent.clone());

        if let Some(secs) = self.config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        builder.build().context("Failed to build HTTP client")
    }
}

impl Extract<String, SseMessage> for SseExtract {
    type StreamType = BoxStream<'static, Result<SseMessage>>;

    fn extract(&self, url: String) -> Result<Self::StreamType> {
        let client = self.client()?;
        let idle_timeout = self.config.idle_timeout_secs.map(Duration::from_secs);

        let stream = async_stream::stream! {
            let response = match client.get(&url).header(ACCEPT, "text/event-stream").send().await {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(anyhow!("Failed to connect to SSE endpoint {}: {}", url, e));
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(anyhow!(
                    "SSE endpoint {} returned error status: {}",
                    url,
                    response.status()
                ));
                return;
            }

            tracing::info!(%url, status = %response.status(), "connected to SSE feed");

            let frames = SseStream::from_byte_stream(response.bytes_stream());
            let mut frames = std::pin::pin!(frames);

            loop {
                let next = match idle_timeout {
                    Some(limit) => match tokio::time::timeout(limit, frames.next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            yield Err(anyhow!("SSE feed {} was idle for {:?}", url, limit));
                            return;
                        }
                    },
                    None => frames.next().await,
                };

                let frame = match next {
                    Some(Ok(frame)) => frame,
                    Some(Err(e)) => {
                        yield Err(anyhow!("SSE stream error: {}", e));
                        return;
                    }
                    None => break,
                };

                // comments, retry hints and keep-alives carry no data
                let data = match frame.data {
                    Some(data) if !data.is_empty() => data,
                    _ => continue,
                };

                yield Ok(SseMessage {
                    event_type: frame.event.unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
                    data,
                    id: frame.id,
                });
            }

            tracing::info!(%url, "SSE feed closed by server");
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_defaults_to_message_event_type() {
        let msg = SseMessage::new("{}");
        assert!(msg.is_message());
        assert_eq!(msg.id, None);
    }

    #[test]
    fn test_other_event_types_are_not_messages() {
        let msg = SseMessage::new("{}").with_event_type("canary");
        assert!(!msg.is_message());
        assert_eq!(msg.data, "{}");
    }

    #[test]
    fn test_default_config() {
        let config = SseConfig::default();
        assert_eq!(config.connect_timeout_secs, Some(10));
        assert_eq!(config.idle_timeout_secs, None);
        assert!(config.user_agent.starts_with("wikiwerk-sse/"));
    }

    #[test]
    fn test_extract_is_lazy() {
        // nothing is dialed until the stream is polled
        let extractor = SseExtract::with_config(SseConfig {
            connect_timeout_secs: None,
            ..SseConfig::default()
        });
        assert!(extractor.extract("http://127.0.0.1:9/never".to_string()).is_ok());
        assert_eq!(extractor.config().connect_timeout_secs, None);
    }
}

//! # ksqlDB sink
//!
//! A thin client for the parts of the ksqlDB REST API the ingester needs, and
//! [`KsqlLoad`], a loader that writes each pipeline item as a row into a
//! ksqlDB stream.
//!
//! ## Inserts
//!
//! `POST /inserts-stream` takes a newline-delimited body: a header object
//! naming the target stream, then one JSON object per row.
//!
//! ```text
//! {"target":"Wikipedia_STREAM"}
//! {"domain":"en.wikipedia.org","title":"Test",...}
//! ```
//!
//! The server answers with one acknowledgement per row, again one JSON object
//! per line (`{"status":"ok","seq":0}` or an error object).
//!
//! ## Example
//!
//! ```rust,no_run
//! use serde::Serialize;
//! use wikiwerk_ksql::KsqlClient;
//!
//! #[derive(Serialize)]
//! struct Row {
//!     title: String,
//! }
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = KsqlClient::new("http://localhost:8088")?;
//! let response = client
//!     .inserts_stream("Wikipedia_STREAM", &[Row { title: "Test".into() }])
//!     .await?;
//! println!("{:?}", response.acks);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;
use wikiwerk::Load;

pub mod prelude;

pub const INSERTS_STREAM_PATH: &str = "/inserts-stream";
pub const INFO_PATH: &str = "/info";
pub const DELIMITED_CONTENT_TYPE: &str = "application/vnd.ksqlapi.delimited.v1";

/// HTTP settings for [`KsqlClient`].
#[derive(Debug, Clone)]
pub struct KsqlConfig {
    /// Whole-request timeout in seconds (None for no timeout)
    pub request_timeout_secs: Option<u64>,
    /// Speak HTTP/2 without upgrade negotiation, as ksqlDB prefers for inserts
    pub http2_prior_knowledge: bool,
}

impl Default for KsqlConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: Some(30),
            http2_prior_knowledge: false,
        }
    }
}

/// Server metadata returned by `GET /info`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub version: String,
    #[serde(default)]
    pub kafka_cluster_id: Option<String>,
    #[serde(default)]
    pub ksql_service_id: Option<String>,
    #[serde(default)]
    pub server_status: Option<String>,
}

#[derive(Deserialize)]
struct InfoEnvelope {
    #[serde(rename = "KsqlServerInfo")]
    server_info: ServerInfo,
}

/// One acknowledgement line from `/inserts-stream`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InsertAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl InsertAck {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }
}

/// Outcome of one `/inserts-stream` call.
#[derive(Debug, Clone)]
pub struct InsertsResponse {
    pub status: StatusCode,
    pub acks: Vec<InsertAck>,
}

impl InsertsResponse {
    /// True when the HTTP status is 2xx and every ack reports `ok`.
    pub fn is_success(&self) -> bool {
        self.status.is_success() && self.acks.iter().all(InsertAck::is_ok)
    }
}

/// Build the newline-delimited `/inserts-stream` request body.
pub fn encode_inserts_body<T: Serialize>(target: &str, rows: &[T]) -> Result<String> {
    let mut body = serde_json::to_string(&serde_json::json!({ "target": target }))?;
    body.push('\n');
    for row in rows {
        body.push_str(&serde_json::to_string(row).context("Failed to serialize row")?);
        body.push('\n');
    }
    Ok(body)
}

/// Parse an `/inserts-stream` response body. Lines that are not JSON objects are ignored.
pub fn parse_acks(body: &str) -> Vec<InsertAck> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

/// Client for a ksqlDB server's REST API.
#[derive(Debug, Clone)]
pub struct KsqlClient {
    http: reqwest::Client,
    base_url: String,
}

impl KsqlClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(base_url, KsqlConfig::default())
    }

    pub fn with_config(base_url: impl Into<String>, config: KsqlConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if config.http2_prior_knowledge {
            builder = builder.http2_prior_knowledge();
        }

        let http = builder.build().context("Failed to build HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the server's version and status.
    pub async fn server_info(&self) -> Result<ServerInfo> {
        let url = format!("{}{}", self.base_url, INFO_PATH);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach ksqlDB at {url}"))?
            .error_for_status()
            .with_context(|| format!("ksqlDB rejected {url}"))?;

        let envelope: InfoEnvelope = response
            .json()
            .await
            .context("Failed to decode ksqlDB server info")?;
        Ok(envelope.server_info)
    }

    /// Insert `rows` into the stream `target`.
    ///
    /// Transport failures are errors. A non-2xx status is not: it is returned
    /// in [`InsertsResponse::status`] together with whatever acks the server sent.
    pub async fn inserts_stream<T: Serialize>(
        &self,
        target: &str,
        rows: &[T],
    ) -> Result<InsertsResponse> {
        let url = format!("{}{}", self.base_url, INSERTS_STREAM_PATH);
        let body = encode_inserts_body(target, rows)?;
        tracing::debug!(%url, target_stream = target, rows = rows.len(), %body, "inserting rows");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, DELIMITED_CONTENT_TYPE)
            .header(ACCEPT, DELIMITED_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach ksqlDB at {url}"))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read ksqlDB inserts response")?;

        Ok(InsertsResponse {
            status,
            acks: parse_acks(&text),
        })
    }
}

/// Loader that inserts every item as a single-row batch into a ksqlDB stream.
///
/// The server's answer is logged and otherwise ignored; only a transport
/// failure fails the load.
pub struct KsqlLoad<T> {
    client: KsqlClient,
    target: String,
    _phantom: PhantomData<fn(T)>,
}

impl<T> KsqlLoad<T> {
    pub fn new(client: KsqlClient, target: impl Into<String>) -> Self {
        Self {
            client,
            target: target.into(),
            _phantom: PhantomData,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl<T> Load<T> for KsqlLoad<T>
where
    T: Serialize + Send + Sync,
{
    fn load(&self, item: T) -> impl Future<Output = Result<()>> + Send {
        async move {
            let row = serde_json::to_string(&item).context("Failed to serialize row")?;
            let rows = [item];
            let response = self.client.inserts_stream(&self.target, &rows).await?;

            if response.is_success() {
                tracing::info!(
                    target_stream = %self.target,
                    %row,
                    status = %response.status,
                    acks = ?response.acks,
                    "row inserted"
                );
            } else {
                tracing::warn!(
                    target_stream = %self.target,
                    %row,
                    status = %response.status,
                    acks = ?response.acks,
                    "ksqlDB did not accept row"
                );
            }
            Ok(())
        }
    }
}

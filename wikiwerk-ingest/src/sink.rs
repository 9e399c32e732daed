//! Local sinks.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::future::Future;
use std::io::{Stdout, Write};
use std::sync::Mutex;
use wikiwerk::Load;

/// Load step that writes each item as one line of JSON.
///
/// Used for dry runs in place of the ksqlDB sink. Writes to stdout unless
/// built with [`JsonLinesLoad::new`].
pub struct JsonLinesLoad<W = Stdout> {
    out: Mutex<W>,
}

impl JsonLinesLoad<Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonLinesLoad<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|_| anyhow!("JSON lines writer was poisoned"))
    }

    fn write_line<T: Serialize>(&self, item: &T) -> Result<()> {
        let line = serde_json::to_string(item).context("Failed to serialize record")?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("JSON lines writer was poisoned"))?;
        writeln!(out, "{line}").context("Failed to write record")?;
        out.flush().context("Failed to flush record")
    }
}

impl<T, W> Load<T> for JsonLinesLoad<W>
where
    T: Serialize,
    W: Write + Send,
{
    fn load(&self, item: T) -> impl Future<Output = Result<()>> + Send {
        let written = self.write_line(&item);
        if written.is_ok() {
            tracing::debug!("record written");
        }
        std::future::ready(written)
    }
}

//! Prelude module for convenient imports.
//!
//! Re-exports the SSE extractor together with the wikiwerk prelude:
//!
//! ```rust
//! use wikiwerk_sse::prelude::*;
//! ```

pub use crate::{SseConfig, SseExtract, SseMessage, DEFAULT_EVENT_TYPE};
pub use tokio_stream::{Stream, StreamExt};
pub use wikiwerk::prelude::*;

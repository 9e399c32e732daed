//! # wikiwerk-ingest
//!
//! Forwards page edits from the Wikimedia recent-change feed into a ksqlDB
//! stream:
//!
//! ```text
//! SSE feed -> message frames -> JSON -> type == "edit" -> ChangeRecord -> ksqlDB -> pause
//! ```
//!
//! The `wikiwerk` binary wires [`Ingestor`] to the command line.

pub mod change;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod namespace;
pub mod sink;
pub mod transform;

pub use change::{ChangeError, ChangeMapper, ChangeRecord, RawChangeEvent, UserTypes};
pub use config::{Config, LogFormat};
pub use ingest::Ingestor;
pub use namespace::{NamespaceTable, UNKNOWN_NAMESPACE};
pub use sink::JsonLinesLoad;
pub use transform::{change_transform, ChangeTransform, MapChange, MissingFieldPolicy, ParseChange};

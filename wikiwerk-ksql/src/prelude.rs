//! Commonly used items from wikiwerk-ksql.
//!
//! ```rust
//! use wikiwerk_ksql::prelude::*;
//! ```

pub use crate::{InsertAck, InsertsResponse, KsqlClient, KsqlConfig, KsqlLoad, ServerInfo};

//! Prelude module for convenient imports.
//!
//! ```rust
//! use wikiwerk::prelude::*;
//! ```

pub use crate::extract::{Extract, ExtractExt, FilterExtract, FnExtract, TakeExtractor};
pub use crate::load::{FnLoad, Load, Throttle};
pub use crate::pipeline::{EtlPipeline, RunStats};
pub use crate::transform::{Compose, Filter, FnTransform, Transform};
pub use crate::{iter_ok, none, once_err, once_ok, AtMostOne};

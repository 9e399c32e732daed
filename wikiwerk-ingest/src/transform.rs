//! Transform steps between the SSE feed and the sink.
//!
//! - [`ParseChange`] - SSE frame to [`RawChangeEvent`], dropping malformed JSON
//! - [`MapChange`] - edit event to [`ChangeRecord`]
//! - [`change_transform`] - both of the above with the edit filter in between

use anyhow::Result;
use clap::ValueEnum;
use wikiwerk::{none, once_err, once_ok, AtMostOne, Compose, Filter, Transform};
use wikiwerk_sse::SseMessage;

use crate::change::{ChangeError, ChangeMapper, ChangeRecord, RawChangeEvent};

/// What to do with an edit event that lacks a field the record needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MissingFieldPolicy {
    /// Log a warning and drop the event
    #[default]
    Skip,
    /// Stop the run with the error
    FailFast,
}

/// Decodes the data of an SSE frame.
///
/// A payload that is not JSON is logged at debug level and dropped, so one bad
/// frame never ends the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseChange;

impl Transform<SseMessage, RawChangeEvent> for ParseChange {
    type Stream<'a>
        = AtMostOne<RawChangeEvent>
    where
        Self: 'a,
        SseMessage: 'a,
        RawChangeEvent: 'a;

    fn transform<'a>(&'a self, input: SseMessage) -> Result<Self::Stream<'a>>
    where
        SseMessage: 'a,
        RawChangeEvent: 'a,
    {
        match RawChangeEvent::parse(&input.data) {
            Ok(event) => Ok(once_ok(event)),
            Err(e) => {
                tracing::debug!(error = %e, id = ?input.id, "dropping malformed event");
                Ok(none())
            }
        }
    }
}

/// Maps edit events to records with a [`ChangeMapper`].
#[derive(Debug, Clone)]
pub struct MapChange {
    mapper: ChangeMapper,
    policy: MissingFieldPolicy,
}

impl MapChange {
    pub fn new(mapper: ChangeMapper, policy: MissingFieldPolicy) -> Self {
        Self { mapper, policy }
    }

    pub fn policy(&self) -> MissingFieldPolicy {
        self.policy
    }
}

impl Transform<RawChangeEvent, ChangeRecord> for MapChange {
    type Stream<'a>
        = AtMostOne<ChangeRecord>
    where
        Self: 'a,
        RawChangeEvent: 'a,
        ChangeRecord: 'a;

    fn transform<'a>(&'a self, input: RawChangeEvent) -> Result<Self::Stream<'a>>
    where
        RawChangeEvent: 'a,
        ChangeRecord: 'a,
    {
        match self.mapper.map_change(&input) {
            Ok(record) => Ok(once_ok(record)),
            Err(e @ ChangeError::MissingField(_)) if self.policy == MissingFieldPolicy::Skip => {
                tracing::warn!(error = %e, "skipping incomplete edit event");
                Ok(none())
            }
            Err(e) => Ok(once_err(e.into())),
        }
    }
}

/// Predicate type of the edit filter.
pub type EditPredicate = fn(&RawChangeEvent) -> bool;

/// The full per-frame transform: parse, keep edits, map.
pub type ChangeTransform = Compose<Filter<ParseChange, EditPredicate>, MapChange, RawChangeEvent>;

/// Build the per-frame transform used by the ingester.
///
/// Non-edit events, including those without a `type`, are dropped before
/// mapping and never reach the sink.
pub fn change_transform(mapper: ChangeMapper, policy: MissingFieldPolicy) -> ChangeTransform {
    ParseChange
        .filter(RawChangeEvent::is_edit as EditPredicate)
        .and_then(MapChange::new(mapper, policy))
}

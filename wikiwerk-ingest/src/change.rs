//! Recent-change events and the record forwarded for each edit.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::namespace::{NamespaceTable, UNKNOWN_NAMESPACE};

/// Event `type` of page edits.
pub const EDIT_TYPE: &str = "edit";

/// Why a single event could not be turned into a record.
#[derive(Debug, Error)]
pub enum ChangeError {
    /// The SSE data field is not JSON
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A consumed field is absent or has the wrong JSON type
    #[error("missing or mistyped field `{0}`")]
    MissingField(&'static str),
}

/// A decoded recent-change event, kept untyped.
///
/// Fields are only looked up when the mapper reads them, so a payload that
/// parses but lacks a field still makes it past parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChangeEvent(Value);

impl RawChangeEvent {
    /// Decode an SSE data field.
    pub fn parse(data: &str) -> Result<Self, ChangeError> {
        Ok(Self(serde_json::from_str(data)?))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The event's `type` field, if it is a string.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Whether this is a page edit. Events without a `type` are not.
    pub fn is_edit(&self) -> bool {
        self.kind() == Some(EDIT_TYPE)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn field(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    fn str_field(&self, pointer: &str, name: &'static str) -> Result<&str, ChangeError> {
        self.field(pointer)
            .and_then(Value::as_str)
            .ok_or(ChangeError::MissingField(name))
    }

    fn int_field(&self, pointer: &str, name: &'static str) -> Result<i64, ChangeError> {
        self.field(pointer)
            .and_then(Value::as_i64)
            .ok_or(ChangeError::MissingField(name))
    }

    fn bool_field(&self, pointer: &str, name: &'static str) -> Result<bool, ChangeError> {
        self.field(pointer)
            .and_then(Value::as_bool)
            .ok_or(ChangeError::MissingField(name))
    }
}

/// The object forwarded to the sink for every edit.
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub domain: String,
    pub namespace_type: String,
    pub title: String,
    pub timestamp: String,
    pub user_name: String,
    pub user_type: String,
    pub old_length: i64,
    pub new_length: i64,
}

/// Labels for the `bot` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTypes {
    pub bot: String,
    pub human: String,
}

impl UserTypes {
    pub fn label(&self, is_bot: bool) -> &str {
        if is_bot {
            &self.bot
        } else {
            &self.human
        }
    }
}

impl Default for UserTypes {
    fn default() -> Self {
        Self {
            bot: "bot".to_string(),
            human: "human".to_string(),
        }
    }
}

/// Maps raw events to [`ChangeRecord`]s.
///
/// Holds the lookups it needs; cloning is cheap and shares the namespace table.
#[derive(Debug, Clone)]
pub struct ChangeMapper {
    namespaces: Arc<NamespaceTable>,
    user_types: UserTypes,
}

impl ChangeMapper {
    pub fn new(namespaces: Arc<NamespaceTable>, user_types: UserTypes) -> Self {
        Self {
            namespaces,
            user_types,
        }
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Build the record for one event.
    ///
    /// The timestamp is passed through as the feed sent it.
    pub fn map_change(&self, event: &RawChangeEvent) -> Result<ChangeRecord, ChangeError> {
        // codes that are absent, not integers, or not in the table all map to "unknown"
        let namespace_type = event
            .field("/namespace")
            .and_then(Value::as_i64)
            .map_or(UNKNOWN_NAMESPACE, |code| self.namespaces.resolve(code));
        let is_bot = event.bool_field("/bot", "bot")?;

        Ok(ChangeRecord {
            domain: event.str_field("/meta/domain", "meta.domain")?.to_string(),
            namespace_type: namespace_type.to_string(),
            title: event.str_field("/title", "title")?.to_string(),
            timestamp: event.str_field("/meta/dt", "meta.dt")?.to_string(),
            user_name: event.str_field("/user", "user")?.to_string(),
            user_type: self.user_types.label(is_bot).to_string(),
            old_length: event.int_field("/length/old", "length.old")?,
            new_length: event.int_field("/length/new", "length.new")?,
        })
    }
}

impl Default for ChangeMapper {
    fn default() -> Self {
        Self::new(Arc::new(NamespaceTable::wikipedia()), UserTypes::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edit(namespace: i64, bot: bool) -> RawChangeEvent {
        RawChangeEvent::from_value(json!({
            "type": "edit",
            "namespace": namespace,
            "bot": bot,
            "title": "Test",
            "user": "alice",
            "length": {"old": 100, "new": 120},
            "meta": {"domain": "en.wikipedia.org", "dt": "2024-01-01T00:00:00Z"}
        }))
    }

    #[test]
    fn test_maps_edit_to_exact_record() {
        let record = ChangeMapper::default().map_change(&edit(0, false)).unwrap();
        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(
            json,
            r#"{"domain":"en.wikipedia.org","namespaceType":"main namespace","title":"Test","timestamp":"2024-01-01T00:00:00Z","userName":"alice","userType":"human","oldLength":100,"newLength":120}"#
        );
    }

    #[test]
    fn test_user_type_is_total_over_bot_flag() {
        let mapper = ChangeMapper::default();
        assert_eq!(mapper.map_change(&edit(0, true)).unwrap().user_type, "bot");
        assert_eq!(mapper.map_change(&edit(0, false)).unwrap().user_type, "human");
    }

    #[test]
    fn test_namespace_resolution() {
        let mapper = ChangeMapper::default();
        assert_eq!(mapper.map_change(&edit(-2, false)).unwrap().namespace_type, "Media");
        assert_eq!(mapper.map_change(&edit(104, false)).unwrap().namespace_type, "unknown");
    }

    #[test]
    fn test_unusable_namespace_resolves_unknown() {
        let mapper = ChangeMapper::default();

        for namespace in [json!("0"), Value::Null, json!(1.5), json!(u64::MAX)] {
            let mut value = edit(0, false).as_value().clone();
            value["namespace"] = namespace.clone();
            let record = mapper
                .map_change(&RawChangeEvent::from_value(value))
                .unwrap_or_else(|e| panic!("namespace {namespace}: {e}"));
            assert_eq!(record.namespace_type, UNKNOWN_NAMESPACE);
        }

        let mut value = edit(0, false).as_value().clone();
        value.as_object_mut().unwrap().remove("namespace");
        let record = mapper.map_change(&RawChangeEvent::from_value(value)).unwrap();
        assert_eq!(record.namespace_type, "unknown");
        assert_eq!(record.title, "Test");
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let mapper = ChangeMapper::default();
        let event = edit(14, true);
        let first = serde_json::to_vec(&mapper.map_change(&event).unwrap()).unwrap();
        let second = serde_json::to_vec(&mapper.map_change(&event).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_timestamp_passes_through_unparsed() {
        let mut value = edit(0, false).as_value().clone();
        value["meta"]["dt"] = json!("not really a date");
        let record = ChangeMapper::default()
            .map_change(&RawChangeEvent::from_value(value))
            .unwrap();
        assert_eq!(record.timestamp, "not really a date");
    }

    #[test]
    fn test_missing_length_is_reported() {
        let mut value = edit(0, false).as_value().clone();
        value.as_object_mut().unwrap().remove("length");

        let err = ChangeMapper::default()
            .map_change(&RawChangeEvent::from_value(value))
            .unwrap_err();
        assert!(matches!(err, ChangeError::MissingField("length.old")));
    }

    #[test]
    fn test_mistyped_field_is_reported() {
        let mut value = edit(0, false).as_value().clone();
        value["bot"] = json!("yes");

        let err = ChangeMapper::default()
            .map_change(&RawChangeEvent::from_value(value))
            .unwrap_err();
        assert!(matches!(err, ChangeError::MissingField("bot")));
    }

    #[test]
    fn test_parse_and_kind() {
        let event = RawChangeEvent::parse(r#"{"type":"log","namespace":0}"#).unwrap();
        assert_eq!(event.kind(), Some("log"));
        assert!(!event.is_edit());

        let untyped = RawChangeEvent::parse(r#"{"namespace":0}"#).unwrap();
        assert_eq!(untyped.kind(), None);
        assert!(!untyped.is_edit());
    }

    #[test]
    fn test_parse_rejects_malformed_payload() {
        let err = RawChangeEvent::parse("{not json").unwrap_err();
        assert!(matches!(err, ChangeError::Malformed(_)));
        assert!(err.to_string().starts_with("malformed event payload"));
    }

    #[test]
    fn test_custom_user_type_labels() {
        let mapper = ChangeMapper::new(
            Arc::new(NamespaceTable::wikipedia()),
            UserTypes {
                bot: "automated".to_string(),
                human: "person".to_string(),
            },
        );
        assert_eq!(mapper.map_change(&edit(0, true)).unwrap().user_type, "automated");
        assert_eq!(mapper.namespaces().resolve(1), "Talk");
    }
}

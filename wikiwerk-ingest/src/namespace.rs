//! Wikipedia namespace codes.
//!
//! See <https://en.wikipedia.org/wiki/Wikipedia:Namespace#Programming>.

use std::collections::HashMap;

/// Label for codes the table does not know.
pub const UNKNOWN_NAMESPACE: &str = "unknown";

const KNOWN_NAMESPACES: &[(i64, &str)] = &[
    (-2, "Media"),
    (-1, "Special"),
    (0, "main namespace"),
    (1, "Talk"),
    (2, "User"),
    (3, "User Talk"),
    (4, "Wikipedia"),
    (5, "Wikipedia Talk"),
    (6, "File"),
    (7, "File Talk"),
    (8, "MediaWiki"),
    (9, "MediaWiki Talk"),
    (10, "Template"),
    (11, "Template Talk"),
    (12, "Help"),
    (13, "Help Talk"),
    (14, "Category"),
    (15, "Category Talk"),
    (100, "Portal"),
    (101, "Portal Talk"),
    (108, "Book"),
    (109, "Book Talk"),
    (118, "Draft"),
    (119, "Draft Talk"),
    (446, "Education Program"),
    (447, "Education Program Talk"),
    (710, "TimedText"),
    (711, "TimedText Talk"),
    (828, "Module"),
    (829, "Module Talk"),
    (2300, "Gadget"),
    (2301, "Gadget Talk"),
    (2302, "Gadget definition"),
    (2303, "Gadget definition Talk"),
];

/// Immutable lookup from namespace code to its label.
#[derive(Debug, Clone)]
pub struct NamespaceTable {
    labels: HashMap<i64, &'static str>,
}

impl NamespaceTable {
    /// The table of namespaces in use on Wikipedia.
    pub fn wikipedia() -> Self {
        Self {
            labels: KNOWN_NAMESPACES.iter().copied().collect(),
        }
    }

    /// Label for `code`, or [`UNKNOWN_NAMESPACE`].
    pub fn resolve(&self, code: i64) -> &'static str {
        self.labels.get(&code).copied().unwrap_or(UNKNOWN_NAMESPACE)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &'static str)> + '_ {
        self.labels.iter().map(|(code, label)| (*code, *label))
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::wikipedia()
    }
}

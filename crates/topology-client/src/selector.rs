//! Equality-based label selectors

use std::collections::BTreeMap;
use std::fmt;

/// Conjunction of `key=value` label predicates
///
/// Keys are kept sorted so the rendered selector string is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    labels: BTreeMap<String, String>,
}

impl LabelSelector {
    /// Empty selector (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `key=value` predicate
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// True when every predicate is satisfied by `labels`
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        self.labels.iter().all(|(key, value)| {
            labels
                .and_then(|l| l.get(key))
                .is_some_and(|actual| actual == value)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .labels
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        f.write_str(&rendered.join(","))
    }
}

//! Entities captured by a successful (or tolerated) slot match.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A successful slot capture.
///
/// Wildcards begin *open* (`is_wildcard && text.is_empty()`) and are closed
/// by a subsequent literal match or by the end-of-match closing pass; see
/// the matcher's closing semantics. [`MatchEntity::is_wildcard_open`] is
/// `true` only for a wildcard that has not yet been closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntity {
    pub name: String,
    pub value: JsonValue,
    pub text: String,
    pub is_wildcard: bool,
    pub is_wildcard_open: bool,
}

impl MatchEntity {
    pub fn literal(name: impl Into<String>, value: JsonValue, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            text: text.into(),
            is_wildcard: false,
            is_wildcard_open: false,
        }
    }

    pub fn open_wildcard(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: JsonValue::String(String::new()),
            text: String::new(),
            is_wildcard: true,
            is_wildcard_open: true,
        }
    }

    /// Closes an open wildcard by appending `additional_text` and syncing
    /// `value` to the resulting text. No-op on an already-closed entity.
    pub fn close_wildcard(&mut self, additional_text: &str) {
        if !self.is_wildcard_open {
            return;
        }
        self.text.push_str(additional_text);
        self.value = JsonValue::String(self.text.clone());
        self.is_wildcard_open = false;
    }
}

/// A slot that failed to capture cleanly but was tolerated because
/// `allow_unmatched_entities` was set on the active [`MatchSettings`].
///
/// [`MatchSettings`]: recognizer's matcher settings type (see `recognizer-engine`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnmatchedEntity {
    /// A text or wildcard slot list that produced no match; accumulates
    /// text the same way an open wildcard does until closed.
    UnmatchedText {
        name: String,
        text: String,
        is_open: bool,
    },
    /// A range slot list whose parsed integer fell outside the range.
    UnmatchedRange { name: String, value: i64 },
}

impl UnmatchedEntity {
    pub fn open_text(name: impl Into<String>) -> Self {
        UnmatchedEntity::UnmatchedText {
            name: name.into(),
            text: String::new(),
            is_open: true,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UnmatchedEntity::UnmatchedText { name, .. } => name,
            UnmatchedEntity::UnmatchedRange { name, .. } => name,
        }
    }

    /// Appends text to an open [`UnmatchedEntity::UnmatchedText`] and closes it.
    pub fn close_text(&mut self, additional_text: &str) {
        if let UnmatchedEntity::UnmatchedText { text, is_open, .. } = self {
            if *is_open {
                text.push_str(additional_text);
                *is_open = false;
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, UnmatchedEntity::UnmatchedText { is_open: true, .. })
    }
}

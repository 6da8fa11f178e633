//! The intents container: templates grouped under named intents, plus the
//! recognizer-wide and per-intent-data overrides that parameterize matching.
//!
//! Nothing here parses template source or loads data from disk; an external
//! loader (out of scope) is expected to construct these types directly, or
//! via `serde` deserialization of whatever on-disk format it chooses.

use crate::expression::Expression;
use crate::slots::SlotList;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Top-level container: zero or more named intents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Intents {
    pub intents: IndexMap<String, Intent>,
    /// Slot lists available to every template, unless shadowed by a caller override.
    pub slot_lists: IndexMap<String, SlotList>,
    /// Expansion rules (`RuleReference` targets) available to every template.
    pub expansion_rules: IndexMap<String, Expression>,
    /// Words stripped from input before matching, longest first.
    pub skip_words: Vec<String>,
    pub settings: RecognizeSettings,
}

impl Intents {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Recognizer-wide behavior toggles carried alongside the intents data.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RecognizeSettings {
    pub ignore_whitespace: bool,
}

/// One named intent: an ordered list of template variants (`IntentData`),
/// each describing an alternative way of expressing the same intent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    pub data: Vec<IntentData>,
}

impl Intent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Vec::new(),
        }
    }
}

/// One template variant within an [`Intent`]: its sentences, fixed slot
/// defaults, context predicates, and any private overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentData {
    pub sentences: Vec<Expression>,
    /// Default entity values applied when not already present after matching.
    pub slots: IndexMap<String, JsonValue>,
    pub requires_context: IndexMap<String, Option<JsonValue>>,
    pub excludes_context: IndexMap<String, Option<JsonValue>>,
    pub response: Option<String>,
    /// Expansion rules visible only to this intent-data's sentences, shadowing
    /// the recognizer-wide rules of the same name.
    pub expansion_rules: IndexMap<String, Expression>,
}

impl IntentData {
    pub fn new(sentences: Vec<Expression>) -> Self {
        Self {
            sentences,
            ..Default::default()
        }
    }
}

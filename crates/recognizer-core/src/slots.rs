//! Slot lists: the three ways a [`crate::expression::Expression::ListReference`]
//! can resolve a captured span into a value.

use crate::expression::Expression;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One named slot list, as referenced by `ListReference::list_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SlotList {
    Text(TextSlotList),
    Range(RangeSlotList),
    Wildcard(WildcardSlotList),
}

/// A finite, ordered collection of text alternatives.
///
/// Order matters: values are tried in declaration order, and the first
/// matching value wins for a given branch (ties are resolved by the
/// matcher's enumeration order, not by this type).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextSlotList {
    pub values: Vec<TextSlotValue>,
}

/// A single alternative within a [`TextSlotList`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSlotValue {
    /// The sub-grammar that must match for this alternative to be chosen.
    pub text_in: Expression,
    /// The opaque value emitted as the entity's `value` on a match.
    pub value_out: JsonValue,
    /// Context keys merged into `intent_context` on a match. Overlay keys
    /// shadow any prior value under the same key.
    pub context_overlay: IndexMap<String, JsonValue>,
}

impl TextSlotValue {
    pub fn new(text_in: Expression, value_out: JsonValue) -> Self {
        Self {
            text_in,
            value_out,
            context_overlay: IndexMap::new(),
        }
    }
}

/// An integer interval, inclusive on both ends, stepped by `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSlotList {
    pub start: i64,
    pub stop: i64,
    pub step: u32,
}

impl RangeSlotList {
    pub fn new(start: i64, stop: i64, step: u32) -> Self {
        assert!(step >= 1, "RangeSlotList step must be at least 1");
        Self { start, stop, step }
    }

    /// Whether `value` falls within `[start, stop]` on the `step` lattice.
    pub fn contains(&self, value: i64) -> bool {
        value >= self.start
            && value <= self.stop
            && (value - self.start).rem_euclid(self.step as i64) == 0
    }
}

/// An open-ended capture, bounded by whatever literal text follows it in
/// the template. Carries no values of its own: the captured text itself
/// becomes the entity's `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WildcardSlotList;

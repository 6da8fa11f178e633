//! The matcher's settings and per-branch state snapshot.

use recognizer_core::entity::{MatchEntity, UnmatchedEntity};
use recognizer_core::expression::Expression;
use recognizer_core::slots::SlotList;
use recognizer_core::text::strip_punctuation;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::cell::Cell;

/// Settings shared (read-only, except for the fuel counter) across one
/// matching call. Borrows the resolved slot lists and expansion rules so
/// the driver doesn't need to clone them per template.
pub struct MatchSettings<'a> {
    pub slot_lists: &'a IndexMap<String, SlotList>,
    pub expansion_rules: &'a IndexMap<String, Expression>,
    pub ignore_whitespace: bool,
    pub allow_unmatched_entities: bool,
    fuel: Option<Cell<u32>>,
}

impl<'a> MatchSettings<'a> {
    pub fn new(
        slot_lists: &'a IndexMap<String, SlotList>,
        expansion_rules: &'a IndexMap<String, Expression>,
        ignore_whitespace: bool,
        allow_unmatched_entities: bool,
    ) -> Self {
        Self {
            slot_lists,
            expansion_rules,
            ignore_whitespace,
            allow_unmatched_entities,
            fuel: None,
        }
    }

    /// Bounds the number of matcher steps this settings instance will permit
    /// before every further call fails with [`crate::error::EngineError::FuelExhausted`].
    pub fn with_fuel(mut self, steps: u32) -> Self {
        self.fuel = Some(Cell::new(steps));
        self
    }

    /// Consumes one unit of fuel, if a budget is set.
    pub(crate) fn consume_fuel(&self) -> crate::error::Result<()> {
        if let Some(cell) = &self.fuel {
            let remaining = cell.get();
            if remaining == 0 {
                return Err(crate::error::EngineError::FuelExhausted);
            }
            cell.set(remaining - 1);
        }
        Ok(())
    }
}

/// A snapshot of matcher progress: text remaining, entities captured so
/// far, accumulated intent context, and (in tolerant mode) unmatched
/// entities. Every fork during backtracking clones this rather than
/// sharing mutable state with sibling branches.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchContext {
    pub text: String,
    pub entities: Vec<MatchEntity>,
    pub intent_context: IndexMap<String, JsonValue>,
    pub is_start_of_word: bool,
    pub unmatched_entities: Vec<UnmatchedEntity>,
}

impl MatchContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entities: Vec::new(),
            intent_context: IndexMap::new(),
            is_start_of_word: true,
            unmatched_entities: Vec::new(),
        }
    }

    pub fn with_intent_context(text: impl Into<String>, intent_context: IndexMap<String, JsonValue>) -> Self {
        Self {
            intent_context,
            ..Self::new(text)
        }
    }

    /// The last entity, if it is an open (uncompleted) wildcard.
    pub fn open_wildcard(&self) -> Option<&MatchEntity> {
        self.entities
            .last()
            .filter(|entity| entity.is_wildcard && entity.is_wildcard_open)
    }

    /// The last unmatched entity, if it is an open (uncompleted) text capture.
    pub fn open_unmatched(&self) -> Option<&UnmatchedEntity> {
        self.unmatched_entities.last().filter(|entity| entity.is_open())
    }

    /// Marks every entity's wildcard as closed. Mirrors the reference
    /// matcher's behavior of closing *all* open wildcards on a word
    /// boundary, not just the most recent one.
    pub fn close_all_wildcards(&mut self) {
        for entity in &mut self.entities {
            entity.is_wildcard_open = false;
        }
    }

    /// Marks every open unmatched text entity as closed.
    pub fn close_all_unmatched_text(&mut self) {
        for entity in &mut self.unmatched_entities {
            if let UnmatchedEntity::UnmatchedText { is_open, .. } = entity {
                *is_open = false;
            }
        }
    }

    /// Runs the end-of-match closing pass: if text remains after trimming,
    /// feed it to the last open unmatched entity, else the last open
    /// wildcard. Returns whether this context is a complete match afterward.
    pub fn close_and_check(&mut self) -> bool {
        let trailing = self.text.trim();
        if !trailing.is_empty() {
            let trailing = trailing.to_string();
            if let Some(UnmatchedEntity::UnmatchedText { text, is_open, .. }) =
                self.unmatched_entities.last_mut().filter(|e| e.is_open())
            {
                text.push_str(&trailing);
                *is_open = false;
                self.text.clear();
            } else if let Some(entity) = self
                .entities
                .last_mut()
                .filter(|e| e.is_wildcard && e.is_wildcard_open)
            {
                entity.close_wildcard(&trailing);
                self.text.clear();
            }
        }

        self.is_match()
    }

    /// True if no text is left that isn't whitespace/punctuation, and every
    /// wildcard/unmatched-text entity is non-empty.
    pub fn is_match(&self) -> bool {
        let remaining = strip_punctuation(&self.text);
        if !remaining.trim().is_empty() {
            return false;
        }

        for entity in &self.entities {
            if entity.is_wildcard && entity.text.trim().is_empty() {
                return false;
            }
        }

        for entity in &self.unmatched_entities {
            if let UnmatchedEntity::UnmatchedText { text, .. } = entity {
                if text.trim().is_empty() {
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_wildcard_requires_last_entity() {
        let mut ctx = MatchContext::new("hey jude");
        ctx.entities.push(MatchEntity::open_wildcard("song"));
        assert!(ctx.open_wildcard().is_some());
        ctx.entities.last_mut().unwrap().is_wildcard_open = false;
        assert!(ctx.open_wildcard().is_none());
    }

    #[test]
    fn is_match_rejects_leftover_words() {
        let ctx = MatchContext::new("left over");
        assert!(!ctx.is_match());
    }

    #[test]
    fn is_match_accepts_trailing_punctuation() {
        let ctx = MatchContext::new(" . ");
        assert!(ctx.is_match());
    }

    #[test]
    fn close_and_check_closes_trailing_wildcard() {
        let mut ctx = MatchContext::new("hey jude");
        ctx.entities.push(MatchEntity::open_wildcard("song"));
        assert!(ctx.close_and_check());
        assert_eq!(ctx.entities[0].text, "hey jude");
        assert!(!ctx.entities[0].is_wildcard_open);
    }
}

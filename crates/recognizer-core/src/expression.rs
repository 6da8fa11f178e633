//! The grammar expression tree matched against input text.
//!
//! An [`Expression`] is produced by an external template parser (out of
//! scope here) and consumed by `recognizer-engine`'s matcher. The variants
//! mirror the shape of a sentence template: literal text, grouping and
//! alternation, and the two kinds of named substitution (slot lists and
//! rules).

use serde::{Deserialize, Serialize};

/// One node of a sentence template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal text, matched verbatim (modulo whitespace/punctuation rules).
    /// An empty chunk is a no-op placeholder.
    TextChunk(String),
    /// A group ("all must match") or alternative ("any may match") of sub-expressions.
    Sequence(SequenceKind, Vec<Expression>),
    /// A named slot capture: binds `slot_name` to a value drawn from the
    /// slot list `list_name`.
    ListReference {
        slot_name: String,
        list_name: String,
    },
    /// A named sub-grammar expansion, resolved by name against the active
    /// expansion rules.
    RuleReference(String),
}

impl Expression {
    /// Shorthand for an empty [`Expression::TextChunk`], used to encode
    /// optionality inside an [`SequenceKind::Alternative`].
    pub fn empty() -> Self {
        Expression::TextChunk(String::new())
    }

    /// `true` for a chunk whose text is empty.
    pub fn is_empty_chunk(&self) -> bool {
        matches!(self, Expression::TextChunk(text) if text.is_empty())
    }
}

/// Distinguishes "all items must match" from "any one item may match".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceKind {
    Group,
    Alternative,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chunk_is_recognized() {
        assert!(Expression::empty().is_empty_chunk());
        assert!(!Expression::TextChunk("a".into()).is_empty_chunk());
    }
}

//! A convenience entry point for matching one sentence expression without
//! an [`Intents`] collection or context predicates.

use crate::context::{MatchContext, MatchSettings};
use crate::error::Result;
use crate::matcher::match_expression;
use indexmap::IndexMap;
use recognizer_core::expression::Expression;
use recognizer_core::intents::RecognizeSettings;
use recognizer_core::slots::SlotList;
use recognizer_core::text::{normalize_text, WHITESPACE};

/// Options for [`is_match`], mirroring the subset of [`crate::recognize::RecognizeOptions`]
/// relevant to a single template.
#[derive(Debug, Clone, Default)]
pub struct SingleMatchOptions {
    pub slot_lists: IndexMap<String, SlotList>,
    pub expansion_rules: IndexMap<String, Expression>,
    pub skip_words: Vec<String>,
    pub settings: RecognizeSettings,
    pub allow_unmatched_entities: bool,
}

/// Returns the first completed [`MatchContext`] for `sentence` against `text`, if any.
pub fn is_match(text: &str, sentence: &Expression, options: &SingleMatchOptions) -> Result<Option<MatchContext>> {
    let mut normalized = normalize_text(text).trim().to_string();

    if !options.skip_words.is_empty() {
        normalized = crate::recognize::remove_skip_words(
            &normalized,
            &options.skip_words.iter().map(String::as_str).collect::<Vec<_>>(),
            options.settings.ignore_whitespace,
        );
    }

    if options.settings.ignore_whitespace {
        normalized = WHITESPACE.replace_all(&normalized, "").into_owned();
    } else {
        normalized.push(' ');
    }

    let settings = MatchSettings::new(
        &options.slot_lists,
        &options.expansion_rules,
        options.settings.ignore_whitespace,
        options.allow_unmatched_entities,
    );

    let seed = MatchContext::new(normalized);
    for mut candidate in match_expression(&settings, seed, sentence)? {
        if candidate.close_and_check() {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recognizer_core::expression::SequenceKind;

    #[test]
    fn matches_plain_sentence() {
        let sentence = Expression::Sequence(
            SequenceKind::Alternative,
            vec![
                Expression::TextChunk("hello".into()),
                Expression::TextChunk("hi".into()),
            ],
        );
        let options = SingleMatchOptions::default();
        let result = is_match("hi", &sentence, &options).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn rejects_non_matching_sentence() {
        let sentence = Expression::TextChunk("hello".into());
        let options = SingleMatchOptions::default();
        let result = is_match("goodbye", &sentence, &options).unwrap();
        assert!(result.is_none());
    }
}

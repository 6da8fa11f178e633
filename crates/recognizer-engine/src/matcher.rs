//! The non-deterministic expression matcher.
//!
//! `match_expression` enumerates every way `expression` can consume a
//! prefix of `context.text`, returning one [`MatchContext`] per successful
//! branch. The search space is collected eagerly into a `Vec`: branches are
//! cheap (bounded by template depth and input length) and an eager
//! collection keeps the control flow of wildcard-splitting and closing
//! straightforward, at the cost of not short-circuiting unexplored
//! branches once a caller has enough results — the matcher's contract
//! permits this (see the recognizer driver for where a caller takes only
//! the first result).

use crate::context::{MatchContext, MatchSettings};
use crate::error::{EngineError, Result};
use recognizer_core::entity::{MatchEntity, UnmatchedEntity};
use recognizer_core::expression::{Expression, SequenceKind};
use recognizer_core::slots::SlotList;
use recognizer_core::text::{remove_whitespace, strip_punctuation, NUMBER_START};
use serde_json::Value as JsonValue;

pub fn match_expression(
    settings: &MatchSettings,
    context: MatchContext,
    expression: &Expression,
) -> Result<Vec<MatchContext>> {
    settings.consume_fuel()?;

    match expression {
        Expression::TextChunk(text) => match_text_chunk(settings, context, text),
        Expression::Sequence(kind, items) => match_sequence(settings, context, *kind, items),
        Expression::ListReference { slot_name, list_name } => {
            match_list_reference(settings, context, slot_name, list_name)
        }
        Expression::RuleReference(rule_name) => match_rule_reference(settings, context, rule_name),
    }
}

fn find_from(haystack: &str, needle: &str, start: usize) -> Option<usize> {
    if needle.is_empty() || start > haystack.len() {
        return None;
    }
    haystack.get(start..)?.find(needle).map(|idx| idx + start)
}

fn match_text_chunk(
    settings: &MatchSettings,
    context: MatchContext,
    raw_chunk_text: &str,
) -> Result<Vec<MatchContext>> {
    if raw_chunk_text.is_empty() {
        // An empty chunk is a placeholder: it never consumes input.
        return Ok(vec![context]);
    }

    let (chunk_text, context_text) = if settings.ignore_whitespace {
        (remove_whitespace(raw_chunk_text), remove_whitespace(&context.text))
    } else if context.is_start_of_word {
        (
            raw_chunk_text.trim_start().to_string(),
            context.text.trim_start().to_string(),
        )
    } else {
        (raw_chunk_text.to_string(), context.text.clone())
    };

    let is_context_text_empty = context_text.trim().is_empty();

    if let Some(wildcard) = context.open_wildcard() {
        if wildcard.text.trim().is_empty() {
            return match_open_empty_wildcard(settings, context, raw_chunk_text, &chunk_text, &context_text);
        }
    }

    if context_text.starts_with(chunk_text.as_str()) {
        let remaining = context_text[chunk_text.len()..].to_string();
        let is_chunk_word = !chunk_text.is_empty() && chunk_text.chars().any(|c| !c.is_whitespace());

        let mut next = context;
        next.text = remaining;
        next.is_start_of_word = raw_chunk_text.ends_with(' ');
        if is_chunk_word {
            next.close_all_wildcards();
            next.close_all_unmatched_text();
        }
        return Ok(vec![next]);
    }

    if is_context_text_empty && !chunk_text.is_empty() && chunk_text.trim().is_empty() {
        return Ok(vec![context]);
    }

    // Retry against the punctuation-stripped view of the raw (unadjusted) text.
    let mut stripped = strip_punctuation(&context.text);
    let mut starts = stripped.starts_with(chunk_text.as_str());
    if !starts && context.is_start_of_word {
        stripped = stripped.trim_start().to_string();
        starts = stripped.starts_with(chunk_text.as_str());
    }

    if starts {
        let remaining = stripped.get(chunk_text.len()..).unwrap_or_default().to_string();
        let mut next = context;
        next.text = remaining;
        return Ok(vec![next]);
    }

    if context.open_wildcard().is_some() {
        return Ok(extend_open_wildcard(context, &chunk_text, &stripped).into_iter().collect());
    }

    if settings.allow_unmatched_entities && context.open_unmatched().is_some() {
        return Ok(extend_open_unmatched(context, &chunk_text, &stripped)
            .into_iter()
            .collect());
    }

    Ok(vec![])
}

/// The last entity is an open wildcard with no text yet: search for every
/// later occurrence of `chunk_text` and fork once per occurrence, closing
/// the wildcard to the text that precedes it.
fn match_open_empty_wildcard(
    settings: &MatchSettings,
    context: MatchContext,
    raw_chunk_text: &str,
    chunk_text: &str,
    context_text: &str,
) -> Result<Vec<MatchContext>> {
    if chunk_text.trim().is_empty() {
        let mut next = context;
        next.text = context_text.to_string();
        next.is_start_of_word = true;
        return Ok(vec![next]);
    }

    let first = match context_text.find(chunk_text) {
        Some(0) => find_from(context_text, chunk_text, 1),
        other => other,
    };
    let Some(mut idx) = first else {
        return Ok(vec![]);
    };

    let mut results = Vec::new();
    loop {
        let wildcard_text = context_text[..idx].to_string();
        let mut entities = context.entities.clone();
        if let Some(last) = entities.last_mut() {
            last.text = wildcard_text.clone();
            last.value = JsonValue::String(wildcard_text.clone());
            last.is_wildcard_open = false;
        }

        let forked = MatchContext {
            text: context_text[idx..].to_string(),
            entities,
            intent_context: context.intent_context.clone(),
            is_start_of_word: true,
            unmatched_entities: context.unmatched_entities.clone(),
        };
        results.extend(match_text_chunk(settings, forked, raw_chunk_text)?);

        match find_from(context_text, chunk_text, idx + 1) {
            Some(next_idx) => idx = next_idx,
            None => break,
        }
    }

    Ok(results)
}

fn extend_open_wildcard(context: MatchContext, chunk_text: &str, stripped: &str) -> Option<MatchContext> {
    let skip_idx = stripped.find(chunk_text)?;
    let added = &stripped[..skip_idx];

    let mut entities = context.entities.clone();
    let last = entities.last_mut()?;
    last.text.push_str(added);
    if last.text.is_empty() {
        return None;
    }
    last.value = JsonValue::String(last.text.clone());

    let cut = skip_idx + chunk_text.len();
    let remaining = context.text.get(cut..).unwrap_or_default().to_string();

    Some(MatchContext {
        text: remaining,
        entities,
        intent_context: context.intent_context.clone(),
        is_start_of_word: true,
        unmatched_entities: context.unmatched_entities.clone(),
    })
}

fn extend_open_unmatched(context: MatchContext, chunk_text: &str, stripped: &str) -> Option<MatchContext> {
    let skip_idx = stripped.find(chunk_text)?;
    let added = &stripped[..skip_idx];

    let mut unmatched = context.unmatched_entities.clone();
    let UnmatchedEntity::UnmatchedText { text, .. } = unmatched.last_mut()? else {
        return None;
    };
    text.push_str(added);
    if text.is_empty() {
        return None;
    }

    let cut = skip_idx + chunk_text.len();
    let remaining = context.text.get(cut..).unwrap_or_default().to_string();

    Some(MatchContext {
        text: remaining,
        entities: context.entities.clone(),
        intent_context: context.intent_context.clone(),
        is_start_of_word: true,
        unmatched_entities: unmatched,
    })
}

fn match_sequence(
    settings: &MatchSettings,
    context: MatchContext,
    kind: SequenceKind,
    items: &[Expression],
) -> Result<Vec<MatchContext>> {
    match kind {
        SequenceKind::Alternative => {
            let mut results = Vec::new();
            for item in items {
                results.extend(match_expression(settings, context.clone(), item)?);
            }
            Ok(results)
        }
        SequenceKind::Group => {
            let mut candidates = vec![context];
            for item in items {
                if candidates.is_empty() {
                    break;
                }
                let mut next = Vec::new();
                for candidate in candidates {
                    next.extend(match_expression(settings, candidate, item)?);
                }
                candidates = next;
            }
            Ok(candidates)
        }
    }
}

fn match_list_reference(
    settings: &MatchSettings,
    context: MatchContext,
    slot_name: &str,
    list_name: &str,
) -> Result<Vec<MatchContext>> {
    let slot_list = settings
        .slot_lists
        .get(list_name)
        .ok_or_else(|| EngineError::MissingList(list_name.to_string()))?;

    if context.text.is_empty() {
        return Ok(vec![]);
    }

    match slot_list {
        SlotList::Text(text_list) => match_text_slot_list(settings, context, slot_name, text_list),
        SlotList::Range(range) => match_range_slot_list(settings, context, slot_name, *range),
        SlotList::Wildcard(_) => Ok(vec![match_wildcard_slot_list(context, slot_name)]),
    }
}

fn match_text_slot_list(
    settings: &MatchSettings,
    context: MatchContext,
    slot_name: &str,
    text_list: &recognizer_core::slots::TextSlotList,
) -> Result<Vec<MatchContext>> {
    let mut results = Vec::new();
    let mut has_matches = false;

    for value in &text_list.values {
        let seed = MatchContext {
            text: context.text.clone(),
            entities: context.entities.clone(),
            intent_context: context.intent_context.clone(),
            is_start_of_word: context.is_start_of_word,
            unmatched_entities: context.unmatched_entities.clone(),
        };

        for value_context in match_expression(settings, seed, &value.text_in)? {
            has_matches = true;
            let consumed_len = context.text.len() - value_context.text.len();
            let consumed_text = if value_context.text.is_empty() {
                context.text.clone()
            } else {
                context.text[..consumed_len].to_string()
            };

            let mut entities = context.entities.clone();
            entities.push(MatchEntity::literal(slot_name, value.value_out.clone(), consumed_text));

            // Mirrors `recognize.py`'s two-branch merge: an overlay on this
            // slot value wins over context.intent_context, but absent that,
            // the context produced by matching `value.text_in` itself (e.g. a
            // nested ListReference's own overlay) is what survives, not the
            // context this slot list started from.
            let intent_context = if value.context_overlay.is_empty() {
                value_context.intent_context.clone()
            } else {
                let mut merged = context.intent_context.clone();
                for (key, val) in &value.context_overlay {
                    merged.insert(key.clone(), val.clone());
                }
                merged
            };

            results.push(MatchContext {
                text: value_context.text,
                entities,
                intent_context,
                is_start_of_word: context.is_start_of_word,
                unmatched_entities: context.unmatched_entities.clone(),
            });
        }
    }

    if !has_matches && settings.allow_unmatched_entities {
        let mut next = context;
        next.unmatched_entities.push(UnmatchedEntity::open_text(slot_name));
        next.close_all_wildcards();
        results.push(next);
    }

    Ok(results)
}

fn match_range_slot_list(
    settings: &MatchSettings,
    context: MatchContext,
    slot_name: &str,
    range: recognizer_core::slots::RangeSlotList,
) -> Result<Vec<MatchContext>> {
    let Some(captures) = NUMBER_START.captures(&context.text) else {
        if settings.allow_unmatched_entities {
            let mut next = context;
            next.unmatched_entities.push(UnmatchedEntity::open_text(slot_name));
            next.close_all_wildcards();
            return Ok(vec![next]);
        }
        return Ok(vec![]);
    };

    let number_text = captures.get(1).expect("group 1 always present").as_str();
    let Ok(value) = number_text.trim().parse::<i64>() else {
        return Ok(vec![]);
    };

    if range.contains(value) {
        let mut entities = context.entities.clone();
        let token = context.text.split_whitespace().next().unwrap_or_default().to_string();
        entities.push(MatchEntity::literal(slot_name, JsonValue::from(value), token));

        Ok(vec![MatchContext {
            text: context.text[number_text.len()..].to_string(),
            entities,
            intent_context: context.intent_context.clone(),
            is_start_of_word: context.is_start_of_word,
            unmatched_entities: context.unmatched_entities.clone(),
        }])
    } else if settings.allow_unmatched_entities {
        let mut unmatched = context.unmatched_entities.clone();
        unmatched.push(UnmatchedEntity::UnmatchedRange {
            name: slot_name.to_string(),
            value,
        });
        Ok(vec![MatchContext {
            text: context.text[number_text.len()..].to_string(),
            entities: context.entities.clone(),
            intent_context: context.intent_context.clone(),
            is_start_of_word: context.is_start_of_word,
            unmatched_entities: unmatched,
        }])
    } else {
        Ok(vec![])
    }
}

fn match_wildcard_slot_list(mut context: MatchContext, slot_name: &str) -> MatchContext {
    context.close_all_unmatched_text();
    context.entities.push(MatchEntity::open_wildcard(slot_name));
    context
}

fn match_rule_reference(settings: &MatchSettings, context: MatchContext, rule_name: &str) -> Result<Vec<MatchContext>> {
    let rule = settings
        .expansion_rules
        .get(rule_name)
        .ok_or_else(|| EngineError::MissingRule(rule_name.to_string()))?;
    match_expression(settings, context, rule)
}

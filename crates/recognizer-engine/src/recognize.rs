//! The recognizer driver: dispatches a normalized utterance against a
//! collection of intents, applying context predicates and assembling
//! [`RecognizeResult`]s from completed [`MatchContext`]s.

use crate::context::{MatchContext, MatchSettings};
use crate::error::Result;
use crate::matcher::match_expression;
use indexmap::IndexMap;
use recognizer_core::entity::{MatchEntity, UnmatchedEntity};
use recognizer_core::expression::Expression;
use recognizer_core::intents::{Intent, IntentData, Intents};
use recognizer_core::slots::SlotList;
use recognizer_core::text::{normalize_text, normalize_whitespace, MISSING_ENTITY, WHITESPACE};
use serde_json::Value as JsonValue;

/// Behavior toggles and overrides for one [`recognize`]/[`recognize_all`] call.
///
/// Mirrors the teacher's builder-with-defaults idiom: construct with
/// [`RecognizeOptions::default`] and chain the `with_*` setters that apply.
#[derive(Debug, Clone, Default)]
pub struct RecognizeOptions {
    pub slot_lists: IndexMap<String, SlotList>,
    pub expansion_rules: IndexMap<String, Expression>,
    pub skip_words: Vec<String>,
    pub intent_context: IndexMap<String, JsonValue>,
    pub default_response: Option<String>,
    pub allow_unmatched_entities: bool,
    pub fuel: Option<u32>,
}

impl RecognizeOptions {
    pub fn new() -> Self {
        Self {
            default_response: Some("default".to_string()),
            ..Default::default()
        }
    }

    pub fn with_slot_lists(mut self, slot_lists: IndexMap<String, SlotList>) -> Self {
        self.slot_lists = slot_lists;
        self
    }

    pub fn with_expansion_rules(mut self, expansion_rules: IndexMap<String, Expression>) -> Self {
        self.expansion_rules = expansion_rules;
        self
    }

    pub fn with_skip_words(mut self, skip_words: Vec<String>) -> Self {
        self.skip_words = skip_words;
        self
    }

    pub fn with_intent_context(mut self, intent_context: IndexMap<String, JsonValue>) -> Self {
        self.intent_context = intent_context;
        self
    }

    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = Some(response.into());
        self
    }

    pub fn with_allow_unmatched_entities(mut self, allow: bool) -> Self {
        self.allow_unmatched_entities = allow;
        self
    }

    pub fn with_fuel(mut self, steps: u32) -> Self {
        self.fuel = Some(steps);
        self
    }
}

/// One completed recognition: the matched intent/intent-data, the entities
/// extracted, and the context accumulated during matching.
#[derive(Debug, Clone)]
pub struct RecognizeResult<'a> {
    pub intent: &'a Intent,
    pub intent_data: &'a IntentData,
    pub entities: IndexMap<String, MatchEntity>,
    pub entities_list: Vec<MatchEntity>,
    pub response: Option<String>,
    pub context: IndexMap<String, JsonValue>,
    pub unmatched_entities: IndexMap<String, UnmatchedEntity>,
    pub unmatched_entities_list: Vec<UnmatchedEntity>,
}

/// Returns the first recognized result, or `None` if nothing matched.
pub fn recognize<'a>(text: &str, intents: &'a Intents, options: &RecognizeOptions) -> Result<Option<RecognizeResult<'a>>> {
    Ok(recognize_all(text, intents, options)?.into_iter().next())
}

/// Returns every recognized result, in template declaration order.
pub fn recognize_all<'a>(
    text: &str,
    intents: &'a Intents,
    options: &RecognizeOptions,
) -> Result<Vec<RecognizeResult<'a>>> {
    let mut normalized = normalize_text(text).trim().to_string();

    let mut skip_words: Vec<&str> = options.skip_words.iter().map(String::as_str).collect();
    skip_words.extend(intents.skip_words.iter().map(String::as_str));
    if !skip_words.is_empty() {
        normalized = remove_skip_words(&normalized, &skip_words, intents.settings.ignore_whitespace);
    }

    if intents.settings.ignore_whitespace {
        normalized = WHITESPACE.replace_all(&normalized, "").into_owned();
    } else {
        // Artificial word boundary so the final template literal can match a word.
        normalized.push(' ');
    }

    let mut slot_lists = intents.slot_lists.clone();
    for (name, list) in &options.slot_lists {
        slot_lists.insert(name.clone(), list.clone());
    }

    let mut expansion_rules = intents.expansion_rules.clone();
    for (name, rule) in &options.expansion_rules {
        expansion_rules.insert(name.clone(), rule.clone());
    }

    let mut results = Vec::new();

    for intent in intents.intents.values() {
        for intent_data in &intent.data {
            if !options.intent_context.is_empty() && should_skip_pre_filter(intent_data, &options.intent_context) {
                continue;
            }

            let mut local_rules = expansion_rules.clone();
            for (name, rule) in &intent_data.expansion_rules {
                local_rules.insert(name.clone(), rule.clone());
            }

            let mut local_settings = MatchSettings::new(
                &slot_lists,
                &local_rules,
                intents.settings.ignore_whitespace,
                options.allow_unmatched_entities,
            );
            if let Some(fuel) = options.fuel {
                local_settings = local_settings.with_fuel(fuel);
            }

            for sentence in &intent_data.sentences {
                let seed = MatchContext::with_intent_context(normalized.clone(), options.intent_context.clone());
                let candidates = match_expression(&local_settings, seed, sentence)?;

                for mut candidate in candidates {
                    if !candidate.close_and_check() {
                        continue;
                    }

                    if should_skip_post_match(intent_data, &mut candidate, options.allow_unmatched_entities) {
                        continue;
                    }

                    append_fixed_slots(intent_data, &mut candidate);

                    results.push(build_result(
                        intent,
                        intent_data,
                        candidate,
                        options.default_response.as_deref(),
                    ));
                }
            }
        }
    }

    Ok(results)
}

pub(crate) fn remove_skip_words(text: &str, skip_words: &[&str], ignore_whitespace: bool) -> String {
    let mut ordered: Vec<&str> = skip_words.to_vec();
    ordered.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));

    let mut result = text.to_string();
    for skip_word in ordered {
        let normalized_word = normalize_text(skip_word);
        if normalized_word.is_empty() {
            continue;
        }
        if ignore_whitespace {
            result = result.replace(&normalized_word, "");
        } else {
            let pattern = format!(r"\b{}\b", regex::escape(&normalized_word));
            if let Ok(re) = regex::Regex::new(&pattern) {
                result = re.replace_all(&result, "").into_owned();
            }
        }
    }

    if !ignore_whitespace {
        result = normalize_whitespace(&result).trim().to_string();
    }

    result
}

fn is_non_string_collection(value: &JsonValue) -> bool {
    value.is_array()
}

fn collection_contains(collection: &JsonValue, actual: Option<&JsonValue>) -> bool {
    match (collection.as_array(), actual) {
        (Some(items), Some(actual)) => items.contains(actual),
        _ => false,
    }
}

/// Pre-filter: skip sentence templates that can't possibly match given only
/// the context the caller provided before matching starts.
fn should_skip_pre_filter(intent_data: &IntentData, intent_context: &IndexMap<String, JsonValue>) -> bool {
    for (required_key, required_value) in &intent_data.requires_context {
        let Some(required_value) = required_value else {
            continue; // None is a wildcard: any value (or none yet) is fine.
        };
        let Some(actual_value) = intent_context.get(required_key) else {
            continue; // Not yet known; decide at post-match time instead.
        };

        let matches = if is_non_string_collection(required_value) {
            collection_contains(required_value, Some(actual_value))
        } else {
            actual_value == required_value
        };
        if !matches {
            return true;
        }
    }

    // NOTE: iterates `excludes_context`, not `requires_context` — the reference
    // implementation this crate is modeled on has a transcription bug here that
    // reads the wrong map; this does not replicate it.
    for (excluded_key, excluded_value) in &intent_data.excludes_context {
        let Some(excluded_value) = excluded_value else {
            continue;
        };
        let Some(actual_value) = intent_context.get(excluded_key) else {
            continue;
        };

        let excluded = if is_non_string_collection(excluded_value) {
            collection_contains(excluded_value, Some(actual_value))
        } else {
            actual_value == excluded_value
        };
        if excluded {
            return true;
        }
    }

    false
}

/// Post-match: verify excludes/requires against the final intent context,
/// synthesizing missing-entity placeholders in tolerant mode rather than
/// failing the match outright.
fn should_skip_post_match(intent_data: &IntentData, candidate: &mut MatchContext, allow_unmatched_entities: bool) -> bool {
    for (context_key, context_value) in &intent_data.excludes_context {
        let actual_value = candidate.intent_context.get(context_key);
        if let Some(context_value) = context_value {
            if actual_value == Some(context_value) {
                return true;
            }
            if is_non_string_collection(context_value) && collection_contains(context_value, actual_value) {
                return true;
            }
        }
    }

    for (context_key, context_value) in &intent_data.requires_context {
        let mut actual_value = candidate.intent_context.get(context_key).cloned();

        if allow_unmatched_entities && actual_value.is_none() {
            let unmatched_text = candidate.unmatched_entities.iter().find_map(|entity| match entity {
                UnmatchedEntity::UnmatchedText { name, text, .. } if name == context_key => Some(text.clone()),
                _ => None,
            });
            if let Some(text) = unmatched_text {
                actual_value = Some(JsonValue::String(text));
            }
        }

        let satisfied = match context_value {
            Some(expected) if actual_value.as_ref() == Some(expected) => true,
            None => actual_value.is_some(),
            Some(expected) if is_non_string_collection(expected) => {
                collection_contains(expected, actual_value.as_ref())
            }
            _ => false,
        };

        if satisfied {
            continue;
        }

        if allow_unmatched_entities {
            let already_unmatched = candidate
                .unmatched_entities
                .iter()
                .any(|entity| entity.name() == context_key);
            if !already_unmatched {
                candidate.unmatched_entities.push(UnmatchedEntity::UnmatchedText {
                    name: context_key.clone(),
                    text: MISSING_ENTITY.to_string(),
                    is_open: false,
                });
            }
        } else {
            return true;
        }
    }

    false
}

fn append_fixed_slots(intent_data: &IntentData, candidate: &mut MatchContext) {
    let existing: std::collections::HashSet<&str> =
        candidate.entities.iter().map(|e| e.name.as_str()).collect();
    for (slot_name, slot_value) in &intent_data.slots {
        if !existing.contains(slot_name.as_str()) {
            candidate
                .entities
                .push(MatchEntity::literal(slot_name.clone(), slot_value.clone(), ""));
        }
    }
}

fn build_result<'a>(
    intent: &'a Intent,
    intent_data: &'a IntentData,
    candidate: MatchContext,
    default_response: Option<&str>,
) -> RecognizeResult<'a> {
    let response = intent_data
        .response
        .clone()
        .or_else(|| default_response.map(str::to_string));

    let mut entities = IndexMap::new();
    for entity in &candidate.entities {
        entities.insert(entity.name.clone(), entity.clone());
    }

    let mut unmatched_entities = IndexMap::new();
    for entity in &candidate.unmatched_entities {
        unmatched_entities.insert(entity.name().to_string(), entity.clone());
    }

    RecognizeResult {
        intent,
        intent_data,
        entities,
        entities_list: candidate.entities,
        response,
        context: candidate.intent_context,
        unmatched_entities,
        unmatched_entities_list: candidate.unmatched_entities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recognizer_core::expression::SequenceKind;
    use recognizer_core::slots::{TextSlotList, TextSlotValue};

    fn light_intents() -> Intents {
        let mut intents = Intents::new();

        let mut slot_lists = IndexMap::new();
        slot_lists.insert(
            "names".to_string(),
            SlotList::Text(TextSlotList {
                values: vec![TextSlotValue::new(
                    Expression::TextChunk("kitchen light".into()),
                    JsonValue::String("light.kitchen".into()),
                )],
            }),
        );
        intents.slot_lists = slot_lists;

        let sentence = Expression::Sequence(
            SequenceKind::Group,
            vec![
                Expression::TextChunk("turn on the ".into()),
                Expression::ListReference {
                    slot_name: "name".into(),
                    list_name: "names".into(),
                },
            ],
        );

        let mut intent = Intent::new("HassTurnOn");
        intent.data.push(IntentData::new(vec![sentence]));
        intents.intents.insert("HassTurnOn".to_string(), intent);
        intents
    }

    #[test]
    fn recognizes_simple_template() {
        let intents = light_intents();
        let options = RecognizeOptions::new();
        let result = recognize("turn on the kitchen light", &intents, &options).unwrap();
        let result = result.expect("expected a match");
        assert_eq!(result.intent.name, "HassTurnOn");
        assert_eq!(
            result.entities["name"].value,
            JsonValue::String("light.kitchen".into())
        );
        assert_eq!(result.response.as_deref(), Some("default"));
    }

    #[test]
    fn context_predicate_prefilter_skips_non_matching_area() {
        let mut intents = light_intents();
        intents.intents["HassTurnOn"].data[0]
            .requires_context
            .insert("area".to_string(), Some(JsonValue::String("kitchen".into())));

        let mut ctx = IndexMap::new();
        ctx.insert("area".to_string(), JsonValue::String("bedroom".into()));
        let options = RecognizeOptions::new().with_intent_context(ctx);

        let result = recognize("turn on the kitchen light", &intents, &options).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn context_predicate_prefilter_allows_matching_area() {
        let mut intents = light_intents();
        intents.intents["HassTurnOn"].data[0]
            .requires_context
            .insert("area".to_string(), Some(JsonValue::String("kitchen".into())));

        let mut ctx = IndexMap::new();
        ctx.insert("area".to_string(), JsonValue::String("kitchen".into()));
        let options = RecognizeOptions::new().with_intent_context(ctx);

        let result = recognize("turn on the kitchen light", &intents, &options).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn skip_words_are_removed_longest_first() {
        let intents = light_intents();
        let options = RecognizeOptions::new().with_skip_words(vec!["please".to_string()]);
        let result = recognize("turn on the kitchen light please", &intents, &options).unwrap();
        assert!(result.is_some());
    }

    fn turn_on_alternative_intents() -> Intents {
        let mut intents = Intents::new();

        let mut slot_lists = IndexMap::new();
        slot_lists.insert(
            "names".to_string(),
            SlotList::Text(TextSlotList {
                values: vec![TextSlotValue::new(
                    Expression::TextChunk("kitchen light".into()),
                    JsonValue::String("light.kitchen".into()),
                )],
            }),
        );
        intents.slot_lists = slot_lists;

        // (turn on|switch on) [the] {name}
        let sentence = Expression::Sequence(
            SequenceKind::Group,
            vec![
                Expression::Sequence(
                    SequenceKind::Alternative,
                    vec![
                        Expression::TextChunk("turn on ".into()),
                        Expression::TextChunk("switch on ".into()),
                    ],
                ),
                Expression::Sequence(
                    SequenceKind::Alternative,
                    vec![Expression::TextChunk("the ".into()), Expression::empty()],
                ),
                Expression::ListReference {
                    slot_name: "name".into(),
                    list_name: "names".into(),
                },
            ],
        );

        let mut intent = Intent::new("HassTurnOn");
        intent.data.push(IntentData::new(vec![sentence]));
        intents.intents.insert("HassTurnOn".to_string(), intent);
        intents
    }

    #[test]
    fn alternative_and_optional_group_both_phrasings_match() {
        let intents = turn_on_alternative_intents();
        let options = RecognizeOptions::new();

        let without_article = recognize("turn on kitchen light", &intents, &options)
            .unwrap()
            .expect("expected a match without the optional article");
        let with_article = recognize("switch on the kitchen light", &intents, &options)
            .unwrap()
            .expect("expected a match with the optional article");

        assert_eq!(
            without_article.entities["name"].value,
            JsonValue::String("light.kitchen".into())
        );
        assert_eq!(
            without_article.entities["name"].value,
            with_article.entities["name"].value
        );
    }

    fn brightness_intents() -> Intents {
        let mut intents = Intents::new();

        let mut slot_lists = IndexMap::new();
        slot_lists.insert(
            "names".to_string(),
            SlotList::Text(TextSlotList {
                values: vec![TextSlotValue::new(
                    Expression::TextChunk("kitchen light".into()),
                    JsonValue::String("light.kitchen".into()),
                )],
            }),
        );
        slot_lists.insert(
            "brightness".to_string(),
            SlotList::Range(recognizer_core::slots::RangeSlotList::new(0, 100, 1)),
        );
        intents.slot_lists = slot_lists;

        // set {name} to {brightness}
        let sentence = Expression::Sequence(
            SequenceKind::Group,
            vec![
                Expression::TextChunk("set ".into()),
                Expression::ListReference {
                    slot_name: "name".into(),
                    list_name: "names".into(),
                },
                Expression::TextChunk(" to ".into()),
                Expression::ListReference {
                    slot_name: "brightness".into(),
                    list_name: "brightness".into(),
                },
            ],
        );

        let mut intent = Intent::new("HassSetBrightness");
        intent.data.push(IntentData::new(vec![sentence]));
        intents.intents.insert("HassSetBrightness".to_string(), intent);
        intents
    }

    #[test]
    fn out_of_range_brightness_fails_in_strict_mode() {
        let intents = brightness_intents();
        let options = RecognizeOptions::new();
        let result = recognize("set kitchen light to 150", &intents, &options).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn out_of_range_brightness_yields_unmatched_range_in_tolerant_mode() {
        let intents = brightness_intents();
        let options = RecognizeOptions::new().with_allow_unmatched_entities(true);
        let result = recognize("set kitchen light to 150", &intents, &options)
            .unwrap()
            .expect("tolerant mode should still produce a result");
        assert!(matches!(
            result.unmatched_entities["brightness"],
            UnmatchedEntity::UnmatchedRange { value: 150, .. }
        ));
        assert!(!result.entities.contains_key("brightness"));
    }

    #[test]
    fn in_range_brightness_matches_in_strict_mode() {
        let intents = brightness_intents();
        let options = RecognizeOptions::new();
        let result = recognize("set kitchen light to 42", &intents, &options)
            .unwrap()
            .expect("expected a match");
        assert_eq!(result.entities["name"].value, JsonValue::String("light.kitchen".into()));
        assert_eq!(result.entities["brightness"].value, JsonValue::from(42));
    }

    fn song_device_intents() -> Intents {
        let mut intents = Intents::new();

        let mut slot_lists = IndexMap::new();
        slot_lists.insert("song".to_string(), SlotList::Wildcard(recognizer_core::slots::WildcardSlotList));
        slot_lists.insert(
            "devices".to_string(),
            SlotList::Text(TextSlotList {
                values: vec![TextSlotValue::new(
                    Expression::TextChunk("living room".into()),
                    JsonValue::String("living room".into()),
                )],
            }),
        );
        intents.slot_lists = slot_lists;

        // play {song} on {device}
        let sentence = Expression::Sequence(
            SequenceKind::Group,
            vec![
                Expression::TextChunk("play ".into()),
                Expression::ListReference {
                    slot_name: "song".into(),
                    list_name: "song".into(),
                },
                Expression::TextChunk(" on ".into()),
                Expression::ListReference {
                    slot_name: "device".into(),
                    list_name: "devices".into(),
                },
            ],
        );

        let mut intent = Intent::new("HassPlayMedia");
        intent.data.push(IntentData::new(vec![sentence]));
        intents.intents.insert("HassPlayMedia".to_string(), intent);
        intents
    }

    #[test]
    fn wildcard_bounded_by_following_literal_captures_song_title() {
        let intents = song_device_intents();
        let options = RecognizeOptions::new();
        let result = recognize("play hey jude on living room", &intents, &options)
            .unwrap()
            .expect("expected a match");
        let song = result.entities["song"].value.as_str().unwrap().trim().to_string();
        assert_eq!(song, "hey jude");
        assert_eq!(result.entities["device"].value, JsonValue::String("living room".into()));
    }

    #[test]
    fn rule_reference_end_to_end_has_no_entities() {
        let mut intents = Intents::new();
        intents.expansion_rules.insert(
            "greet".to_string(),
            Expression::Sequence(
                SequenceKind::Alternative,
                vec![
                    Expression::TextChunk("hello".into()),
                    Expression::TextChunk("hi".into()),
                ],
            ),
        );

        let sentence = Expression::Sequence(
            SequenceKind::Group,
            vec![Expression::RuleReference("greet".into()), Expression::TextChunk(" world".into())],
        );
        let mut intent = Intent::new("Greeting");
        intent.data.push(IntentData::new(vec![sentence]));
        intents.intents.insert("Greeting".to_string(), intent);

        let options = RecognizeOptions::new();
        let result = recognize("hi world", &intents, &options).unwrap().expect("expected a match");
        assert!(result.entities_list.is_empty());
    }

    #[test]
    fn empty_input_yields_no_results_against_a_nonempty_template() {
        let intents = light_intents();
        let options = RecognizeOptions::new();
        let result = recognize("", &intents, &options).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn template_with_only_an_empty_alternative_matches_only_empty_input() {
        let mut intents = Intents::new();
        let sentence = Expression::Sequence(SequenceKind::Alternative, vec![Expression::empty()]);
        let mut intent = Intent::new("Noop");
        intent.data.push(IntentData::new(vec![sentence]));
        intents.intents.insert("Noop".to_string(), intent);

        let options = RecognizeOptions::new();
        assert!(recognize("", &intents, &options).unwrap().is_some());
        assert!(recognize("anything", &intents, &options).unwrap().is_none());
    }
}

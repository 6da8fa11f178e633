//! Text normalization helpers shared by the matcher and the driver.
//!
//! These are deliberately small: the heavy lifting of Unicode normalization
//! is delegated to `unicode-normalization`, and the fixed punctuation/number
//! patterns are compiled once via `regex`.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Leading signed integer, e.g. `-12` at the start of a string.
pub static NUMBER_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*-?[0-9]+)").expect("valid regex"));

/// Sentence-ending punctuation the matcher is allowed to skip over.
pub static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.。,，?¿？؟!！;；:：]+").expect("valid regex"));

/// Any run of Unicode whitespace.
pub static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Placeholder text used for a required context key with no observed value.
pub const MISSING_ENTITY: &str = "<missing>";

/// Canonical form used for equality between input text and template literals.
///
/// NFC-normalizes and case-folds `text`, so `recognize(normalize_text(x))`
/// and `recognize(x)` agree per the external contract this crate relies on.
pub fn normalize_text(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

/// Collapses runs of whitespace to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Strips [`PUNCTUATION`] from `text`.
pub fn strip_punctuation(text: &str) -> String {
    PUNCTUATION.replace_all(text, "").into_owned()
}

/// Removes every whitespace character from `text` (used when `ignore_whitespace` is set).
pub fn remove_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, "").into_owned()
}

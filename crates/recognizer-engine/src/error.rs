//! Errors surfaced by matching and recognition.

/// Errors that can occur while matching an expression or recognizing an intent.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// A `{list}` reference named a slot list that wasn't provided.
    #[error("missing slot list {{{0}}}")]
    MissingList(String),

    /// A `<rule>` reference named an expansion rule that wasn't provided.
    #[error("missing expansion rule <{0}>")]
    MissingRule(String),

    /// The step-fuel budget (see [`crate::context::MatchSettings::with_fuel`]) ran out
    /// before enumeration finished.
    #[error("match execution limit exceeded")]
    FuelExhausted,
}

/// Result type for matching and recognition.
pub type Result<T> = std::result::Result<T, EngineError>;

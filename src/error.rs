//! Error types for the fact-find agent

use thiserror::Error;

/// Result type alias for fact-find operations
pub type Result<T> = std::result::Result<T, FactFindError>;

#[derive(Error, Debug)]
pub enum FactFindError {

    // =============================
    // Conversation Errors
    // =============================

    /// A goal section was present in the model answer but lacked a
    /// required sub-field. Aborts the whole turn.
    #[error("Missing goal field: {goal}.{field}")]
    MissingGoalField {
        goal: &'static str,
        field: &'static str,
    },

    #[error("Conversation has no messages to respond to")]
    EmptyConversation,

    // =============================
    // Model / Configuration Errors
    // =============================

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

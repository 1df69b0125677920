//! Error types for the financial document analyzer

use thiserror::Error;

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {

    // =============================
    // Core Pipeline Errors
    // =============================

    /// A numeric token could not be parsed. Recoverable: extraction skips
    /// the token and moves on.
    #[error("Value parse error: {0}")]
    ParseError(String),

    /// The query decomposer failed. Recoverable: the pipeline falls back to
    /// the original query as its only sub-question.
    #[error("Decomposition error: {0}")]
    DecompositionError(String),

    /// The retriever failed. Fatal for the request.
    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    /// The narrative generator failed or returned empty text. Fatal for the
    /// request.
    #[error("Narrative error: {0}")]
    NarrativeError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

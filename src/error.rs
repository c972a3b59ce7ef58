//! Error types for the client priority engine

use crate::sources::SourceKind;
use thiserror::Error;

/// Result type alias for ranking operations
pub type Result<T> = std::result::Result<T, RankingError>;

#[derive(Error, Debug)]
pub enum RankingError {

    // =============================
    // Core Ranking Errors
    // =============================

    /// The advisor's client roster could not be loaded. This is the only
    /// failure that reaches the caller of a ranking request.
    #[error("Client roster unavailable: {0}")]
    Roster(String),

    #[error("Signal source {kind} failed: {message}")]
    Source { kind: SourceKind, message: String },

    #[error("Signal source {0} timed out")]
    SourceTimeout(SourceKind),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Invalid AI ranking response: {0}")]
    InvalidAiResponse(String),

    #[error("AI ranking contained no usable entries")]
    EmptyAiRanking,

    #[error("AI reranking timed out")]
    AiTimeout,

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("UUID parse error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

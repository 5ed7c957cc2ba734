//! Error types for NEURA

use thiserror::Error;

/// Core NEURA errors
///
/// Nothing in the classification-to-state pipeline is fatal. These errors are
/// raised at the edges (parsing, inference, configuration) and are
/// logged and absorbed by the runtime loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeuraError {
    // Parsing errors
    #[error("Unknown emotion label: {0}")]
    UnknownEmotion(String),

    #[error("Unknown achievement id: {0}")]
    UnknownAchievement(String),

    // Inference errors
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for NEURA operations
pub type NeuraResult<T> = Result<T, NeuraError>;

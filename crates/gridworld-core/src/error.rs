//! Error types for the gridworld core library

use thiserror::Error;

/// Core error type for gridworld RL operations
#[derive(Error, Debug)]
pub enum RLError {
    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Agent-related errors, including calls made in the wrong episode phase
    #[error("Agent error: {0}")]
    Agent(String),

    /// Invalid action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Missing, malformed or out-of-range configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;

//! Error types for the engine
//!
//! Failures coming from the rules layer are wrapped rather than swallowed:
//! an oracle that rejects a move it reported as legal is a contract
//! violation between the two crates.

use chess_core::ChessError;
use thiserror::Error;

/// Errors that can occur while selecting moves or loading configuration
#[derive(Error, Debug)]
pub enum EngineError {
    /// The rules layer rejected an operation
    #[error("Rules oracle failure: {0}")]
    Oracle(#[from] ChessError),

    /// Chosen move is no longer legal in the supplied position
    #[error("Move {mv} is not legal in the supplied position")]
    StaleMove { mv: String },

    /// Configuration values out of range
    #[error("Invalid engine configuration: {0}")]
    Config(String),

    #[error("Could not parse engine configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Background move task ended without sending a result
    #[error("Background move search was dropped before finishing")]
    TaskDropped,
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

//! Errors raised by the rules layer.

use thiserror::Error;

use crate::Position;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// FEN string could not be parsed
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    /// Move is not legal in the current position
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    /// No piece on the source square
    #[error("No piece at {0}")]
    NoPieceAt(Position),

    /// Square name could not be parsed
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("No move to undo")]
    NothingToUndo,
}

pub type ChessResult<T> = Result<T, ChessError>;

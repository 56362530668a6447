// Core chess game logic modules
pub mod board;
pub mod error;
pub mod fen;
pub mod piece;
pub mod position;
pub mod moves;
pub mod status;

// Re-export main types for convenience
pub use board::{Board, CastlingRights};
pub use error::{ChessError, ChessResult};
pub use fen::STARTING_FEN;
pub use piece::{Piece, Color, PieceType};
pub use position::Position;
pub use moves::{Move, MoveType};
pub use status::{DrawReason, GameStatus};

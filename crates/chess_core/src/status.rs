use crate::{
    board::Board,
    piece::{Color, PieceType},
};

/// Halfmoves without a capture or pawn move before the fifty-move rule applies.
pub const FIFTY_MOVE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    FiftyMove,
    InsufficientMaterial,
    ThreefoldRepetition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }

    pub fn is_checkmate(&self) -> bool {
        matches!(self, GameStatus::Checkmate { .. })
    }

    /// Stalemate or any rule-based draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, GameStatus::Stalemate | GameStatus::Draw(_))
    }
}

impl Board {
    pub fn status(&self) -> GameStatus {
        let turn = self.current_turn();
        if !self.has_legal_move() {
            return if self.is_in_check(turn) {
                GameStatus::Checkmate { winner: turn.opposite() }
            } else {
                GameStatus::Stalemate
            };
        }
        if self.has_insufficient_material() {
            GameStatus::Draw(DrawReason::InsufficientMaterial)
        } else if self.is_fifty_move_draw() {
            GameStatus::Draw(DrawReason::FiftyMove)
        } else if self.is_threefold_repetition() {
            GameStatus::Draw(DrawReason::ThreefoldRepetition)
        } else {
            GameStatus::Ongoing
        }
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_in_check(self.current_turn()) && !self.has_legal_move()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_in_check(self.current_turn()) && !self.has_legal_move()
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock() >= FIFTY_MOVE_LIMIT
    }

    /// The current position occurred at least twice before, counting only
    /// positions since the last capture or pawn move.
    pub fn is_threefold_repetition(&self) -> bool {
        let current = self.snapshot();
        let window = self.halfmove_clock() as usize;
        let seen = self
            .history
            .iter()
            .rev()
            .take(window)
            .filter(|entry| entry.before == current)
            .count();
        seen >= 2
    }

    pub fn has_insufficient_material(&self) -> bool {
        let mut knights = 0;
        let mut bishop_squares = Vec::new();

        for (pos, piece) in self.get_all_pieces() {
            match piece.piece_type {
                PieceType::King => {}
                PieceType::Pawn | PieceType::Rook | PieceType::Queen => return false,
                PieceType::Knight => knights += 1,
                PieceType::Bishop => bishop_squares.push(pos.is_light()),
            }
        }

        // King vs King, or a single minor piece
        if knights + bishop_squares.len() <= 1 {
            return true;
        }

        // Only bishops, all on the same square color
        knights == 0 && bishop_squares.iter().all(|&light| light == bishop_squares[0])
    }
}

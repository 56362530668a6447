use chess_core::{Board, ChessResult, Color, GameStatus, Move, Piece, Position};

/// Everything the engine needs from a rules implementation.
///
/// The engine never generates or validates moves itself; it enumerates,
/// applies and takes back moves through this trait and restores every
/// position it touches. `apply_move` must reject anything that is not in
/// `legal_moves()`.
pub trait RulesOracle: Clone {
    /// Legal moves for the side to move, in a stable enumeration order.
    fn legal_moves(&self) -> Vec<Move>;

    fn legal_moves_from(&self, square: Position) -> Vec<Move>;

    fn apply_move(&mut self, mv: Move) -> ChessResult<()>;

    /// Takes back the most recent `apply_move`.
    fn undo(&mut self) -> ChessResult<Move>;

    fn status(&self) -> GameStatus;

    fn turn(&self) -> Color;

    /// 8x8 grid indexed `[rank - 1][file - 1]`.
    fn board_squares(&self) -> [[Option<Piece>; 8]; 8];

    /// Canonical key: placement, side to move, castling and en passant.
    fn position_key(&self) -> String;
}

impl RulesOracle for Board {
    fn legal_moves(&self) -> Vec<Move> {
        Board::legal_moves(self)
    }

    fn legal_moves_from(&self, square: Position) -> Vec<Move> {
        self.get_valid_moves(square)
    }

    fn apply_move(&mut self, mv: Move) -> ChessResult<()> {
        self.make_move(mv)
    }

    fn undo(&mut self) -> ChessResult<Move> {
        self.undo_move()
    }

    fn status(&self) -> GameStatus {
        Board::status(self)
    }

    fn turn(&self) -> Color {
        self.current_turn()
    }

    fn board_squares(&self) -> [[Option<Piece>; 8]; 8] {
        *self.squares()
    }

    fn position_key(&self) -> String {
        Board::position_key(self)
    }
}

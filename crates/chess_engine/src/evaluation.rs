use chess_core::{piece::{Color, Piece, PieceType}, GameStatus, Position};

use crate::oracle::RulesOracle;

/// Score reported for a checkmated side. Finite, so comparisons and
/// negation never overflow.
pub const MATE_UPPER: i32 = 100_000;

// Standard piece values used in chess engines, measured in centipawns (100 = 1 pawn)
pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;
pub const KING_VALUE: i32 = 20000;

/// Non-king piece count at which the phase saturates at 1 (full middlegame).
pub const PHASE_PIECES: i32 = 30;

// Piece-square tables, White's perspective, a8 first (index = (8 - rank) * 8 + file - 1).
// Black reads the vertically mirrored entry. Each piece has a middlegame (MG)
// and endgame (EG) table.

const PAWN_MG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

// Passed-pawn races dominate the endgame: reward advancement, not the centre
const PAWN_EG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    80, 80, 80, 80, 80, 80, 80, 80,
    50, 50, 50, 50, 50, 50, 50, 50,
    30, 30, 30, 30, 30, 30, 30, 30,
    20, 20, 20, 20, 20, 20, 20, 20,
    10, 10, 10, 10, 10, 10, 10, 10,
    10, 10, 10, 10, 10, 10, 10, 10,
     0,  0,  0,  0,  0,  0,  0,  0,
];

const KNIGHT_MG: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

const KNIGHT_EG: [i32; 64] = [
    -40,-30,-20,-20,-20,-20,-30,-40,
    -30,-10,  0,  5,  5,  0,-10,-30,
    -20,  5, 10, 15, 15, 10,  5,-20,
    -20,  5, 15, 20, 20, 15,  5,-20,
    -20,  5, 15, 20, 20, 15,  5,-20,
    -20,  5, 10, 15, 15, 10,  5,-20,
    -30,-10,  0,  5,  5,  0,-10,-30,
    -40,-30,-20,-20,-20,-20,-30,-40,
];

const BISHOP_MG: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

const BISHOP_EG: [i32; 64] = [
    -15,-10,-10,-10,-10,-10,-10,-15,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10,  0, 10, 15, 15, 10,  0,-10,
    -10,  0, 10, 15, 15, 10,  0,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -15,-10,-10,-10,-10,-10,-10,-15,
];

const ROOK_MG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

const ROOK_EG: [i32; 64] = [
    10, 10, 10, 10, 10, 10, 10, 10,
    15, 15, 15, 15, 15, 15, 15, 15,
     5,  5,  5,  5,  5,  5,  5,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
];

const QUEEN_MG: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

const QUEEN_EG: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  5,  5,  5,  5,  0,-10,
    -10,  5, 10, 10, 10, 10,  5,-10,
     -5,  5, 10, 15, 15, 10,  5, -5,
     -5,  5, 10, 15, 15, 10,  5, -5,
    -10,  5, 10, 10, 10, 10,  5,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

// King safety: stay behind the pawns, castled
const KING_MG: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

// King activity: head for the centre once the board empties
const KING_EG: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
];

/// Evaluates a chess position and returns a score from White's perspective.
/// Positive scores favor White, negative scores favor Black.
pub fn evaluate_position<P: RulesOracle>(position: &P) -> i32 {
    match position.status() {
        GameStatus::Checkmate { .. } => {
            // The side to move is the one mated
            return match position.turn() {
                Color::White => -MATE_UPPER,
                Color::Black => MATE_UPPER,
            };
        }
        GameStatus::Stalemate | GameStatus::Draw(_) => return 0,
        GameStatus::Ongoing => {}
    }

    static_score(&position.board_squares())
}

/// Material plus blended piece-square bonus over a raw board, ignoring
/// game status.
pub fn static_score(squares: &[[Option<Piece>; 8]; 8]) -> i32 {
    let phase = phase_weight(squares);
    let mut score = 0;

    for (rank_idx, row) in squares.iter().enumerate() {
        for (file_idx, cell) in row.iter().enumerate() {
            let Some(piece) = cell else {
                continue;
            };
            let pos = Position {
                rank: rank_idx as u8 + 1,
                file: file_idx as u8 + 1,
            };
            let value = get_piece_value(piece.piece_type)
                + get_position_bonus(piece.piece_type, piece.color, pos, phase);
            if piece.color == Color::White {
                score += value;
            } else {
                score -= value;
            }
        }
    }

    score
}

/// Non-king pieces on the board, capped at [`PHASE_PIECES`].
pub fn phase_weight(squares: &[[Option<Piece>; 8]; 8]) -> i32 {
    let pieces = squares
        .iter()
        .flatten()
        .flatten()
        .filter(|piece| piece.piece_type != PieceType::King)
        .count() as i32;
    pieces.min(PHASE_PIECES)
}

/// Game phase in `[0, 1]`: 1 with a full board, 0 with bare kings.
pub fn game_phase<P: RulesOracle>(position: &P) -> f64 {
    f64::from(phase_weight(&position.board_squares())) / f64::from(PHASE_PIECES)
}

/// Returns the base material value of a piece
pub fn get_piece_value(piece_type: PieceType) -> i32 {
    match piece_type {
        PieceType::Pawn => PAWN_VALUE,
        PieceType::Knight => KNIGHT_VALUE,
        PieceType::Bishop => BISHOP_VALUE,
        PieceType::Rook => ROOK_VALUE,
        PieceType::Queen => QUEEN_VALUE,
        PieceType::King => KING_VALUE,
    }
}

/// Positional bonus for a piece, blending the middlegame and endgame tables
/// by `phase` (a [`phase_weight`] value).
pub fn get_position_bonus(piece_type: PieceType, color: Color, pos: Position, phase: i32) -> i32 {
    let idx = table_index(color, pos);
    let (mg, eg) = match piece_type {
        PieceType::Pawn => (PAWN_MG[idx], PAWN_EG[idx]),
        PieceType::Knight => (KNIGHT_MG[idx], KNIGHT_EG[idx]),
        PieceType::Bishop => (BISHOP_MG[idx], BISHOP_EG[idx]),
        PieceType::Rook => (ROOK_MG[idx], ROOK_EG[idx]),
        PieceType::Queen => (QUEEN_MG[idx], QUEEN_EG[idx]),
        PieceType::King => (KING_MG[idx], KING_EG[idx]),
    };
    let phase = phase.clamp(0, PHASE_PIECES);
    (mg * phase + eg * (PHASE_PIECES - phase)) / PHASE_PIECES
}

fn table_index(color: Color, pos: Position) -> usize {
    let file_idx = pos.file as usize - 1;
    match color {
        Color::White => (8 - pos.rank as usize) * 8 + file_idx,
        Color::Black => (pos.rank as usize - 1) * 8 + file_idx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Board;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    #[test]
    fn start_position_is_balanced() {
        assert_eq!(evaluate_position(&Board::new()), 0);
    }

    #[test]
    fn checkmated_white_scores_negative_mate() {
        let mut position = Board::new();
        for code in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            position.make_move_uci(code).unwrap();
        }
        assert_eq!(evaluate_position(&position), -MATE_UPPER);
    }

    #[test]
    fn checkmated_black_scores_positive_mate() {
        // Scholar's mate
        let position = board("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4");
        assert_eq!(evaluate_position(&position), MATE_UPPER);
    }

    #[test]
    fn draws_score_zero() {
        assert_eq!(evaluate_position(&board("k7/8/1Q6/8/8/8/8/1K6 b - - 0 1")), 0);
        assert_eq!(evaluate_position(&board("4k3/8/8/8/8/8/8/4KN2 w - - 0 1")), 0);
        assert_eq!(evaluate_position(&board("4k3/8/8/8/8/8/8/R3K3 w - - 100 80")), 0);
    }

    #[test]
    fn king_and_queen_versus_king_is_winning() {
        for fen in [
            "4k3/8/8/8/8/8/8/3QK3 w - - 0 1",
            "7k/8/8/8/3Q4/8/8/K7 b - - 0 1",
            "k7/8/8/8/8/8/8/6QK w - - 0 1",
        ] {
            let score = evaluate_position(&board(fen));
            assert!(score > QUEEN_VALUE - 150, "{} scored {}", fen, score);
            assert!(score < MATE_UPPER);
        }
    }

    #[test]
    fn mirrored_position_negates_score() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/8/8/8/8/8/8/3QK3 w - - 0 1",
            "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
        ] {
            let position = board(fen);
            assert_eq!(
                evaluate_position(&position),
                -evaluate_position(&position.mirrored()),
                "{}",
                fen
            );
        }
    }

    #[test]
    fn evaluation_is_repeatable() {
        let position = board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let first = evaluate_position(&position);
        for _ in 0..5 {
            assert_eq!(evaluate_position(&position), first);
        }
    }

    #[test]
    fn phase_tracks_piece_count() {
        assert_eq!(game_phase(&Board::new()), 1.0);
        assert_eq!(game_phase(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1")), 0.0);

        let mut position = Board::new();
        let mut last = phase_weight(position.squares());
        for code in ["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5a2", "a1a2"] {
            position.make_move_uci(code).unwrap();
            let now = phase_weight(position.squares());
            assert!(now <= last);
            last = now;
        }
        assert_eq!(last, PHASE_PIECES - 4);
    }

    #[test]
    fn king_prefers_centre_in_endgame() {
        let e4 = Position::from_algebraic("e4").unwrap();
        let g1 = Position::from_algebraic("g1").unwrap();
        assert!(get_position_bonus(PieceType::King, Color::White, g1, PHASE_PIECES)
            > get_position_bonus(PieceType::King, Color::White, e4, PHASE_PIECES));
        assert!(get_position_bonus(PieceType::King, Color::White, e4, 0)
            > get_position_bonus(PieceType::King, Color::White, g1, 0));
    }

    #[test]
    fn black_reads_mirrored_table() {
        let e2 = Position::from_algebraic("e2").unwrap();
        let e7 = Position::from_algebraic("e7").unwrap();
        for piece_type in PieceType::ALL {
            for phase in [0, 12, PHASE_PIECES] {
                assert_eq!(
                    get_position_bonus(piece_type, Color::White, e2, phase),
                    get_position_bonus(piece_type, Color::Black, e7, phase)
                );
            }
        }
    }
}

// Fixed-depth minimax with alpha-beta pruning. The position is mutated in
// place and every move is taken back before returning, so callers always get
// their position back unchanged.
use std::cmp::Reverse;

use chess_core::{Color, Move};
use log::{debug, error};

use crate::{
    error::{EngineError, EngineResult},
    evaluation::{evaluate_position, get_piece_value, MATE_UPPER},
    oracle::RulesOracle,
};

/// Initial window bound. One past the mate score so a mated line still
/// improves on "nothing found yet".
pub const SCORE_BOUND: i32 = MATE_UPPER + 1;

/// Counters collected during one search call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub cutoffs: u64,
}

/// Outcome of a root search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootResult {
    pub best_move: Move,
    pub score: i32,
    pub stats: SearchStats,
}

/// Minimax value of `position` searched `depth` plies deep, from White's
/// point of view. `maximizing` is true when White is to move.
pub fn search<P: RulesOracle>(
    position: &mut P,
    depth: u8,
    alpha: i32,
    beta: i32,
    maximizing: bool,
) -> EngineResult<i32> {
    let mut stats = SearchStats::default();
    alpha_beta(position, depth, alpha, beta, maximizing, &mut stats)
}

/// Picks the best move for the side to move.
///
/// Root moves are tried in the oracle's enumeration order and a move only
/// replaces the current best on a strictly better score, so ties go to the
/// first move enumerated. Alpha-beta bounds are shared across root moves.
/// A `depth` of 0 behaves like 1. Returns `None` when there is no legal move.
pub fn search_root<P: RulesOracle>(position: &mut P, depth: u8) -> EngineResult<Option<RootResult>> {
    let moves = position.legal_moves();
    if moves.is_empty() {
        return Ok(None);
    }

    let maximizing = position.turn() == Color::White;
    let child_depth = depth.saturating_sub(1);
    let mut alpha = -SCORE_BOUND;
    let mut beta = SCORE_BOUND;
    let mut best: Option<(Move, i32)> = None;
    let mut stats = SearchStats::default();

    for mv in moves {
        let value = explore(position, mv, |pos| {
            alpha_beta(pos, child_depth, alpha, beta, !maximizing, &mut stats)
        })?;

        let improves = match best {
            None => true,
            Some((_, score)) if maximizing => value > score,
            Some((_, score)) => value < score,
        };
        if improves {
            best = Some((mv, value));
        }

        if maximizing {
            alpha = alpha.max(value);
        } else {
            beta = beta.min(value);
        }
        if beta <= alpha {
            stats.cutoffs += 1;
            break;
        }
    }

    if let Some((mv, score)) = best {
        debug!(
            "depth {} best {} score {} ({} nodes, {} cutoffs)",
            depth, mv, score, stats.nodes, stats.cutoffs
        );
    }

    Ok(best.map(|(best_move, score)| RootResult { best_move, score, stats }))
}

fn alpha_beta<P: RulesOracle>(
    position: &mut P,
    depth: u8,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    stats: &mut SearchStats,
) -> EngineResult<i32> {
    stats.nodes += 1;

    if depth == 0 {
        return Ok(evaluate_position(position));
    }

    let mut moves = position.legal_moves();
    if moves.is_empty() || position.status().is_over() {
        return Ok(evaluate_position(position));
    }
    order_moves(&mut moves);

    if maximizing {
        let mut best = -SCORE_BOUND;
        for mv in moves {
            let value = explore(position, mv, |pos| {
                alpha_beta(pos, depth - 1, alpha, beta, false, stats)
            })?;
            best = best.max(value);
            alpha = alpha.max(value);
            if beta <= alpha {
                stats.cutoffs += 1;
                break; // Beta cutoff
            }
        }
        Ok(best)
    } else {
        let mut best = SCORE_BOUND;
        for mv in moves {
            let value = explore(position, mv, |pos| {
                alpha_beta(pos, depth - 1, alpha, beta, true, stats)
            })?;
            best = best.min(value);
            beta = beta.min(value);
            if beta <= alpha {
                stats.cutoffs += 1;
                break; // Alpha cutoff
            }
        }
        Ok(best)
    }
}

// Applies `mv`, runs `f` on the child position and takes the move back
// before looking at the result, so errors from `f` still leave the
// position restored.
fn explore<P, F>(position: &mut P, mv: Move, f: F) -> EngineResult<i32>
where
    P: RulesOracle,
    F: FnOnce(&mut P) -> EngineResult<i32>,
{
    if let Err(err) = position.apply_move(mv) {
        error!("Oracle rejected its own legal move {}: {}", mv, err);
        return Err(EngineError::Oracle(err));
    }
    let result = f(position);
    if let Err(err) = position.undo() {
        error!("Oracle failed to undo {}: {}", mv, err);
        return Err(EngineError::Oracle(err));
    }
    result
}

/// Captures first, most valuable victim first. The sort is stable, so
/// quiet moves keep the oracle's order.
pub fn order_moves(moves: &mut [Move]) {
    moves.sort_by_key(|mv| Reverse(mv.captured.map_or(0, get_piece_value)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{Board, ChessError, ChessResult, GameStatus, Piece, Position};

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    // Plain minimax, no pruning, no ordering.
    fn reference(position: &mut Board, depth: u8, maximizing: bool) -> i32 {
        if depth == 0 || position.status().is_over() {
            return evaluate_position(position);
        }
        let mut best = if maximizing { -SCORE_BOUND } else { SCORE_BOUND };
        for mv in position.legal_moves() {
            position.make_move(mv).unwrap();
            let value = reference(position, depth - 1, !maximizing);
            position.undo_move().unwrap();
            best = if maximizing { best.max(value) } else { best.min(value) };
        }
        best
    }

    fn reference_root(position: &mut Board, depth: u8) -> (Move, i32) {
        let maximizing = position.current_turn() == Color::White;
        let mut best: Option<(Move, i32)> = None;
        for mv in position.legal_moves() {
            position.make_move(mv).unwrap();
            let value = reference(position, depth - 1, !maximizing);
            position.undo_move().unwrap();
            let improves = match best {
                None => true,
                Some((_, score)) => if maximizing { value > score } else { value < score },
            };
            if improves {
                best = Some((mv, value));
            }
        }
        best.unwrap()
    }

    #[test]
    fn pruning_matches_exhaustive_minimax() {
        let cases = [
            ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 3),
            ("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 2),
            ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 3),
            ("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3", 2),
            ("6k1/5ppp/8/8/8/8/5PPP/R5K1 b - - 0 1", 3),
        ];
        for (fen, depth) in cases {
            let mut position = board(fen);
            let expected = reference_root(&mut position, depth);
            let found = search_root(&mut position, depth).unwrap().unwrap();
            assert_eq!((found.best_move, found.score), expected, "{}", fen);

            let maximizing = position.current_turn() == Color::White;
            assert_eq!(
                search(&mut position, depth, -SCORE_BOUND, SCORE_BOUND, maximizing).unwrap(),
                reference(&mut position, depth, maximizing),
                "{}",
                fen
            );
        }
    }

    #[test]
    fn search_leaves_position_untouched() {
        let mut position =
            board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let before = position.to_fen();
        search(&mut position, 3, -SCORE_BOUND, SCORE_BOUND, true).unwrap();
        assert_eq!(position.to_fen(), before);
        assert_eq!(position.ply_count(), 0);
        search_root(&mut position, 2).unwrap();
        assert_eq!(position.to_fen(), before);
        assert_eq!(position.ply_count(), 0);
    }

    #[test]
    fn finds_mate_in_one_for_white() {
        let mut position = board("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1");
        for depth in [1, 2] {
            let result = search_root(&mut position, depth).unwrap().unwrap();
            assert_eq!(result.best_move.to_uci(), "a1a8");
            assert_eq!(result.score, MATE_UPPER);
        }
    }

    #[test]
    fn finds_mate_in_one_for_black() {
        let mut position = board("r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1");
        let result = search_root(&mut position, 2).unwrap().unwrap();
        assert_eq!(result.best_move.to_uci(), "a8a1");
        assert_eq!(result.score, -MATE_UPPER);
    }

    #[test]
    fn takes_a_hanging_queen() {
        let mut position = board("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1");
        let result = search_root(&mut position, 2).unwrap().unwrap();
        assert_eq!(result.best_move.to_uci(), "d2d5");
        assert!(result.score > 0);
    }

    #[test]
    fn ties_go_to_first_enumerated_move() {
        // One ply from the start both knight developments gain the same bonus
        let mut position = Board::new();
        assert!(!position.status().is_over());
        let scored: Vec<(Move, i32)> = position
            .legal_moves()
            .into_iter()
            .map(|mv| {
                position.make_move(mv).unwrap();
                let score = evaluate_position(&position);
                position.undo_move().unwrap();
                (mv, score)
            })
            .collect();
        let best = scored.iter().map(|&(_, score)| score).max().unwrap();
        let tied: Vec<Move> = scored
            .iter()
            .filter(|&&(_, score)| score == best)
            .map(|&(mv, _)| mv)
            .collect();
        assert!(tied.len() >= 2, "expected several equal moves, got {:?}", tied);

        let result = search_root(&mut position, 1).unwrap().unwrap();
        assert_eq!(result.score, best);
        assert_eq!(result.best_move, tied[0]);
        assert_eq!(result.best_move.to_uci(), "b1c3");
    }

    #[test]
    fn no_moves_means_no_result() {
        let mut mated = board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert!(search_root(&mut mated, 3).unwrap().is_none());
        assert_eq!(
            search(&mut mated, 3, -SCORE_BOUND, SCORE_BOUND, true).unwrap(),
            -MATE_UPPER
        );
    }

    #[test]
    fn depth_zero_is_static_evaluation() {
        let mut position = board("4k3/8/8/3q4/8/8/3R4/4K3 w - - 0 1");
        assert_eq!(
            search(&mut position, 0, -SCORE_BOUND, SCORE_BOUND, true).unwrap(),
            evaluate_position(&position)
        );
    }

    #[test]
    fn captures_are_ordered_first() {
        let position = board("4k3/8/8/3q4/2P5/1n6/3R4/4K3 w - - 0 1");
        let mut moves = position.legal_moves();
        order_moves(&mut moves);
        assert_eq!(moves[0].captured, Some(chess_core::PieceType::Queen));
        let first_quiet = moves.iter().position(|mv| !mv.is_capture()).unwrap();
        assert!(moves[first_quiet..].iter().all(|mv| !mv.is_capture()));
    }

    #[derive(Clone)]
    struct RefusingOracle {
        board: Board,
        refuse: &'static str,
    }

    impl RulesOracle for RefusingOracle {
        fn legal_moves(&self) -> Vec<Move> {
            self.board.legal_moves()
        }
        fn legal_moves_from(&self, square: Position) -> Vec<Move> {
            self.board.get_valid_moves(square)
        }
        fn apply_move(&mut self, mv: Move) -> ChessResult<()> {
            if mv.to_uci() == self.refuse {
                return Err(ChessError::IllegalMove(mv.to_uci()));
            }
            self.board.make_move(mv)
        }
        fn undo(&mut self) -> ChessResult<Move> {
            self.board.undo_move()
        }
        fn status(&self) -> GameStatus {
            self.board.status()
        }
        fn turn(&self) -> Color {
            self.board.current_turn()
        }
        fn board_squares(&self) -> [[Option<Piece>; 8]; 8] {
            *self.board.squares()
        }
        fn position_key(&self) -> String {
            self.board.position_key()
        }
    }

    #[test]
    fn oracle_failures_propagate_and_position_is_restored() {
        let mut oracle = RefusingOracle { board: Board::new(), refuse: "e7e5" };
        let before = oracle.board.to_fen();
        let result = search_root(&mut oracle, 2);
        assert!(matches!(result, Err(EngineError::Oracle(ChessError::IllegalMove(_)))));
        assert_eq!(oracle.board.to_fen(), before);
        assert_eq!(oracle.board.ply_count(), 0);
    }
}

use std::collections::HashMap;

use chess_core::{Board, Move};
use log::warn;

use crate::oracle::RulesOracle;

/// Main lines replayed from the initial position. Every position along a
/// line gets the next move of that line as a candidate.
const STANDARD_LINES: &[&[&str]] = &[
    // 1. e4 e5: Ruy Lopez and Italian Game
    &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4", "g8f6"],
    &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5", "c2c3", "g8f6"],
    &["e2e4", "e7e5", "g1f3", "b8c6", "d2d4", "e5d4", "f3d4"],
    // Sicilian Defense
    &["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4", "g8f6", "b1c3", "a7a6"],
    &["e2e4", "c7c5", "g1f3", "b8c6", "d2d4", "c5d4", "f3d4"],
    // French and Caro-Kann
    &["e2e4", "e7e6", "d2d4", "d7d5", "b1c3", "g8f6"],
    &["e2e4", "c7c6", "d2d4", "d7d5", "b1c3", "d5e4", "c3e4"],
    // Queen's Gambit
    &["d2d4", "d7d5", "c2c4", "e7e6", "b1c3", "g8f6", "c1g5"],
    &["d2d4", "d7d5", "c2c4", "e7e6", "g1f3", "g8f6", "c1g5"],
    &["d2d4", "d7d5", "c2c4", "c7c6", "g1f3", "g8f6"],
    &["d2d4", "d7d5", "c2c4", "d5c4", "g1f3", "g8f6", "e2e3"],
    // Indian defences
    &["d2d4", "g8f6", "c2c4", "g7g6", "b1c3", "f8g7", "e2e4", "d7d6"],
    &["d2d4", "g8f6", "c2c4", "e7e6", "g1f3", "d7d5", "b1c3"],
    // Reti Opening
    &["g1f3", "d7d5", "g2g3", "g8f6", "f1g2"],
    // English Opening
    &["c2c4", "e7e5", "b1c3", "g8f6", "g1f3", "b8c6"],
];

/// Read-only table from canonical position keys to candidate move codes.
#[derive(Debug, Clone, Default)]
pub struct OpeningBook {
    positions: HashMap<String, Vec<String>>,
}

impl OpeningBook {
    /// The built-in repertoire.
    pub fn new() -> Self {
        Self::from_lines(STANDARD_LINES.iter().map(|line| line.iter().copied()))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Replays each line from the initial position and records every move
    /// under the key of the position it was played from. A line stops at
    /// the first move that is not legal.
    pub fn from_lines<'a, I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = &'a str>,
    {
        let mut book = Self::empty();
        for line in lines {
            let mut board = Board::new();
            for code in line {
                let key = board.position_key();
                if let Err(err) = board.make_move_uci(code) {
                    warn!("Skipping rest of book line at {}: {}", code, err);
                    break;
                }
                book.add_move(&key, code);
            }
        }
        book
    }

    pub fn from_entries<I, K, M>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<M>)>,
        K: AsRef<str>,
        M: AsRef<str>,
    {
        let mut book = Self::empty();
        for (key, moves) in entries {
            for code in moves {
                book.add_move(key.as_ref(), code.as_ref());
            }
        }
        book
    }

    /// Appends a candidate, keeping first-seen order and skipping duplicates.
    pub fn add_move(&mut self, key: &str, code: &str) {
        let moves = self.positions.entry(canonical_key(key)).or_default();
        if !moves.iter().any(|m| m == code) {
            moves.push(code.to_string());
        }
    }

    /// Candidates for a position key. Extra FEN fields (move counters) are ignored.
    pub fn lookup(&self, key: &str) -> &[String] {
        self.positions
            .get(&canonical_key(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Book candidates that are legal in `position`, in book order.
    pub fn legal_candidates<P: RulesOracle>(&self, position: &P) -> Vec<Move> {
        let candidates = self.lookup(&position.position_key());
        if candidates.is_empty() {
            return Vec::new();
        }
        let legal = position.legal_moves();
        candidates
            .iter()
            .filter_map(|code| legal.iter().find(|mv| mv.to_uci() == *code).copied())
            .collect()
    }

    /// Number of positions in the book.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

// First four whitespace-separated fields of a FEN.
fn canonical_key(key: &str) -> String {
    key.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::STARTING_FEN;

    #[test]
    fn root_candidates() {
        let book = OpeningBook::new();
        assert_eq!(book.lookup(STARTING_FEN), ["e2e4", "d2d4", "g1f3", "c2c4"]);
    }

    #[test]
    fn every_book_move_is_legal_where_stored() {
        let book = OpeningBook::new();
        assert!(book.len() > 30);
        for (key, moves) in &book.positions {
            let board = Board::from_fen(key).unwrap();
            for code in moves {
                assert!(board.find_move(code).is_ok(), "{} not legal in {}", code, key);
            }
            assert_eq!(book.legal_candidates(&board).len(), moves.len());
        }
    }

    #[test]
    fn lookup_ignores_move_counters() {
        let book = OpeningBook::new();
        let mut board = Board::new();
        board.make_move_uci("e2e4").unwrap();
        let key = board.position_key();
        let with_counters = format!("{} 0 1", key);
        assert_eq!(book.lookup(&key), book.lookup(&with_counters));
        assert_eq!(book.lookup(&key), ["e7e5", "c7c5", "e7e6", "c7c6"]);
    }

    #[test]
    fn transposed_positions_share_entries() {
        let book = OpeningBook::new();
        // 1. d4 d5 2. c4 e6 3. Nf3 Nf6 and 1. d4 Nf6 2. c4 e6 3. Nf3 d5
        let mut board = Board::new();
        for code in ["d2d4", "d7d5", "c2c4", "e7e6", "g1f3", "g8f6"] {
            board.make_move_uci(code).unwrap();
        }
        let mut other = Board::new();
        for code in ["d2d4", "g8f6", "c2c4", "e7e6", "g1f3", "d7d5"] {
            other.make_move_uci(code).unwrap();
        }
        assert_eq!(board.position_key(), other.position_key());
        assert_eq!(book.lookup(&board.position_key()), ["c1g5", "b1c3"]);
        assert_eq!(book.lookup(&other.position_key()), ["c1g5", "b1c3"]);
    }

    #[test]
    fn illegal_candidates_are_filtered() {
        let book = OpeningBook::from_entries([(STARTING_FEN, vec!["e2e4", "e2e5", "a1a8"])]);
        let moves = book.legal_candidates(&Board::new());
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].to_uci(), "e2e4");
    }

    #[test]
    fn broken_lines_stop_at_the_bad_move() {
        let book = OpeningBook::from_lines([vec!["e2e4", "e2e4", "g1f3"]]);
        assert_eq!(book.len(), 1);
        assert_eq!(book.lookup(STARTING_FEN), ["e2e4"]);
    }

    #[test]
    fn unknown_positions_have_no_candidates() {
        let book = OpeningBook::new();
        assert!(book.lookup("8/8/8/8/8/8/8/K6k w - -").is_empty());
        assert!(OpeningBook::empty().is_empty());
    }
}

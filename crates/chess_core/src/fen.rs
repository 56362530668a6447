//! FEN parsing and printing for [`Board`].

use crate::{
    board::{Board, CastlingRights},
    error::{ChessError, ChessResult},
    piece::{Color, Piece, PieceType},
    Position,
};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// Parses a FEN string. The halfmove and fullmove fields may be omitted.
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(invalid(fen, "expected 4 to 6 fields"));
        }

        let mut board = Board::empty();
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid(fen, "expected 8 ranks"));
        }
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 8 - row as u8;
            let mut file = 1u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(invalid(fen, "bad empty-square count"));
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_fen_char(c)
                        .ok_or_else(|| invalid(fen, &format!("unknown piece '{}'", c)))?;
                    let pos = Position::new(file, rank).ok_or_else(|| invalid(fen, "rank overflow"))?;
                    board.set_piece(pos, Some(piece));
                    file += 1;
                }
                if file > 9 {
                    return Err(invalid(fen, "rank overflow"));
                }
            }
            if file != 9 {
                return Err(invalid(fen, "rank does not cover 8 files"));
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board
                .get_all_pieces()
                .filter(|(_, p)| *p == Piece::new(PieceType::King, color))
                .count();
            if kings != 1 {
                return Err(invalid(fen, "each side needs exactly one king"));
            }
        }

        let turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(invalid(fen, &format!("bad side to move '{}'", other))),
        };

        let mut rights = CastlingRights::none();
        if fields[2] != "-" {
            for c in fields[2].chars() {
                match c {
                    'K' => rights.white_kingside = true,
                    'Q' => rights.white_queenside = true,
                    'k' => rights.black_kingside = true,
                    'q' => rights.black_queenside = true,
                    _ => return Err(invalid(fen, &format!("bad castling flag '{}'", c))),
                }
            }
        }

        let en_passant = match fields[3] {
            "-" => None,
            square => Some(
                Position::from_algebraic(square)
                    .ok_or_else(|| invalid(fen, &format!("bad en-passant square '{}'", square)))?,
            ),
        };

        let halfmove_clock = match fields.get(4) {
            Some(s) => s.parse().map_err(|_| invalid(fen, "bad halfmove clock"))?,
            None => 0,
        };
        let fullmove_number = match fields.get(5) {
            Some(s) => s.parse().map_err(|_| invalid(fen, "bad fullmove number"))?,
            None => 1,
        };

        if let Some(square) = en_passant {
            check_en_passant(&board, square, turn).map_err(|reason| invalid(fen, reason))?;
        }

        board.set_state(turn, rights, en_passant, halfmove_clock, fullmove_number);
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.position_key(),
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }

    /// The first four FEN fields: placement, side to move, castling and
    /// en passant. Move counters are left out so transpositions share a key.
    pub fn position_key(&self) -> String {
        let mut key = String::with_capacity(90);

        for rank in (1..=8).rev() {
            let mut empty = 0;
            for file in 1..=8 {
                match self.get_piece(Position { file, rank }) {
                    Some(piece) => {
                        if empty > 0 {
                            key.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        key.push(piece.to_fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                key.push(char::from(b'0' + empty));
            }
            if rank > 1 {
                key.push('/');
            }
        }

        key.push(' ');
        key.push(self.current_turn().fen_char());
        key.push(' ');

        let rights = self.castling_rights();
        let flags: String = [
            (rights.white_kingside, 'K'),
            (rights.white_queenside, 'Q'),
            (rights.black_kingside, 'k'),
            (rights.black_queenside, 'q'),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, c)| *c)
        .collect();
        key.push_str(if flags.is_empty() { "-" } else { &flags });

        key.push(' ');
        match self.en_passant() {
            Some(square) => key.push_str(&square.to_algebraic()),
            None => key.push('-'),
        }
        key
    }
}

// The en-passant square must be the one an enemy pawn just skipped: on the
// sixth rank from the mover's side, empty along with the square the pawn
// left, and the pawn itself standing right in front of it.
fn check_en_passant(board: &Board, square: Position, turn: Color) -> Result<(), &'static str> {
    let expected_rank = match turn {
        Color::White => 6,
        Color::Black => 3,
    };
    if square.rank != expected_rank {
        return Err("en-passant square on the wrong rank");
    }

    let forward = turn.pawn_direction();
    let origin = square.offset(0, forward);
    let pushed = square.offset(0, -forward);
    if board.get_piece(square).is_some() || origin.and_then(|sq| board.get_piece(sq)).is_some() {
        return Err("en-passant square is not empty");
    }
    let pushed_pawn = Piece::new(PieceType::Pawn, turn.opposite());
    if pushed.and_then(|sq| board.get_piece(sq)) != Some(pushed_pawn) {
        return Err("no pawn in front of the en-passant square");
    }
    Ok(())
}

fn invalid(fen: &str, reason: &str) -> ChessError {
    ChessError::InvalidFen(format!("{} ({})", fen, reason))
}

use crate::{
    error::{ChessError, ChessResult},
    moves::{Move, MoveType},
    piece::{Color, Piece, PieceType},
    Position,
};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2), (2, 1), (2, -1), (1, -2),
    (-1, -2), (-2, -1), (-2, 1), (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, 0), (1, 1), (0, 1), (-1, 1),
    (-1, 0), (-1, -1), (0, -1), (1, -1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    fn clear(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    // A move touching a rook's home corner removes the matching right.
    fn touch(&mut self, pos: Position) {
        match (pos.file, pos.rank) {
            (1, 1) => self.white_queenside = false,
            (8, 1) => self.white_kingside = false,
            (1, 8) => self.black_queenside = false,
            (8, 8) => self.black_kingside = false,
            _ => {}
        }
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }
}

/// Everything that identifies a position for repetition purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Snapshot {
    squares: [[Option<Piece>; 8]; 8],
    current_turn: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Position>,
}

#[derive(Debug, Clone)]
pub(crate) struct UndoEntry {
    pub(crate) mv: Move,
    pub(crate) before: Snapshot,
    halfmove_clock: u32,
    fullmove_number: u32,
}

#[derive(Debug, Clone)]
pub struct Board {
    // Indexed [rank - 1][file - 1].
    squares: [[Option<Piece>; 8]; 8],
    current_turn: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Position>,
    halfmove_clock: u32,
    fullmove_number: u32,
    pub(crate) history: Vec<UndoEntry>,
}

impl Board {
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.castling_rights = CastlingRights::default();
        board.setup_initial_position();
        board
    }

    /// A board with no pieces, white to move and no castling rights.
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
            current_turn: Color::White,
            castling_rights: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
        }
    }

    fn setup_initial_position(&mut self) {
        // Setup pawns
        for file in 1..=8 {
            self.set_piece(Position { file, rank: 2 }, Some(Piece::new(PieceType::Pawn, Color::White)));
            self.set_piece(Position { file, rank: 7 }, Some(Piece::new(PieceType::Pawn, Color::Black)));
        }

        // Setup other pieces
        let piece_order = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        for (file, &piece_type) in (1..=8).zip(piece_order.iter()) {
            self.set_piece(Position { file, rank: 1 }, Some(Piece::new(piece_type, Color::White)));
            self.set_piece(Position { file, rank: 8 }, Some(Piece::new(piece_type, Color::Black)));
        }
    }

    pub fn get_piece(&self, pos: Position) -> Option<Piece> {
        self.squares[pos.rank as usize - 1][pos.file as usize - 1]
    }

    pub(crate) fn set_piece(&mut self, pos: Position, piece: Option<Piece>) {
        self.squares[pos.rank as usize - 1][pos.file as usize - 1] = piece;
    }

    /// The 8x8 grid, indexed `[rank - 1][file - 1]` (row 0 is rank 1).
    pub fn squares(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.squares
    }

    pub fn current_turn(&self) -> Color {
        self.current_turn
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant(&self) -> Option<Position> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Number of moves that can currently be undone.
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|entry| entry.mv)
    }

    pub(crate) fn set_state(
        &mut self,
        turn: Color,
        castling_rights: CastlingRights,
        en_passant: Option<Position>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) {
        self.current_turn = turn;
        self.castling_rights = castling_rights;
        self.en_passant = en_passant.filter(|&ep| self.en_passant_capturable(ep, turn));
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
    }

    pub fn get_all_pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| self.get_piece(pos).map(|piece| (pos, piece)))
    }

    pub fn king_position(&self, color: Color) -> Option<Position> {
        self.get_all_pieces()
            .find(|(_, piece)| piece.piece_type == PieceType::King && piece.color == color)
            .map(|(pos, _)| pos)
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        match self.king_position(color) {
            Some(king_pos) => self.is_square_attacked(king_pos, color.opposite()),
            None => false,
        }
    }

    /// Whether any piece of `attacker` attacks `pos`.
    pub fn is_square_attacked(&self, pos: Position, attacker: Color) -> bool {
        let is = |target: Option<Position>, types: &[PieceType]| {
            target
                .and_then(|t| self.get_piece(t))
                .is_some_and(|p| p.color == attacker && types.contains(&p.piece_type))
        };

        // Pawns attack from the rank behind them
        let pawn_rank = -attacker.pawn_direction();
        if is(pos.offset(-1, pawn_rank), &[PieceType::Pawn])
            || is(pos.offset(1, pawn_rank), &[PieceType::Pawn])
        {
            return true;
        }

        if KNIGHT_OFFSETS.iter().any(|&(df, dr)| is(pos.offset(df, dr), &[PieceType::Knight])) {
            return true;
        }

        if KING_OFFSETS.iter().any(|&(df, dr)| is(pos.offset(df, dr), &[PieceType::King])) {
            return true;
        }

        let slider_hit = |directions: &[(i8, i8)], types: &[PieceType]| {
            directions.iter().any(|&(df, dr)| {
                let mut current = pos.offset(df, dr);
                while let Some(square) = current {
                    if let Some(piece) = self.get_piece(square) {
                        return piece.color == attacker && types.contains(&piece.piece_type);
                    }
                    current = square.offset(df, dr);
                }
                false
            })
        };

        slider_hit(&ROOK_DIRECTIONS, &[PieceType::Rook, PieceType::Queen])
            || slider_hit(&BISHOP_DIRECTIONS, &[PieceType::Bishop, PieceType::Queen])
    }

    /// Legal moves for the side to move, in square order a1..h8.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        for (pos, piece) in self.get_all_pieces() {
            if piece.color == self.current_turn {
                self.pseudo_moves_from(pos, piece, &mut moves);
            }
        }
        moves.retain(|&mv| self.is_king_safe_after(mv));
        moves
    }

    /// Legal moves of the piece on `pos`; empty if it is not the mover's piece.
    pub fn get_valid_moves(&self, pos: Position) -> Vec<Move> {
        let mut moves = Vec::new();
        if let Some(piece) = self.get_piece(pos) {
            if piece.color == self.current_turn {
                self.pseudo_moves_from(pos, piece, &mut moves);
                moves.retain(|&mv| self.is_king_safe_after(mv));
            }
        }
        moves
    }

    pub fn has_legal_move(&self) -> bool {
        let mut moves = Vec::with_capacity(32);
        for (pos, piece) in self.get_all_pieces() {
            if piece.color != self.current_turn {
                continue;
            }
            moves.clear();
            self.pseudo_moves_from(pos, piece, &mut moves);
            if moves.iter().any(|&mv| self.is_king_safe_after(mv)) {
                return true;
            }
        }
        false
    }

    /// Resolves a move code such as `e2e4` or `e7e8q` against the legal moves.
    pub fn find_move(&self, code: &str) -> ChessResult<Move> {
        let code = code.trim();
        if !code.is_ascii() || !(4..=5).contains(&code.len()) {
            return Err(ChessError::IllegalMove(code.to_string()));
        }
        let from = Position::from_algebraic(&code[0..2])
            .ok_or_else(|| ChessError::InvalidSquare(code[0..2].to_string()))?;
        let to = Position::from_algebraic(&code[2..4])
            .ok_or_else(|| ChessError::InvalidSquare(code[2..4].to_string()))?;
        let promotion = match code.chars().nth(4) {
            Some(c) => Some(
                PieceType::from_char(c).ok_or_else(|| ChessError::IllegalMove(code.to_string()))?,
            ),
            None => None,
        };

        self.get_valid_moves(from)
            .into_iter()
            .find(|mv| mv.to == to && mv.promotion == promotion)
            .ok_or_else(|| ChessError::IllegalMove(code.to_string()))
    }

    /// Plays a move given as a move code.
    pub fn make_move_uci(&mut self, code: &str) -> ChessResult<Move> {
        let mv = self.find_move(code)?;
        self.make_move(mv)?;
        Ok(mv)
    }

    /// Plays `chess_move` if it is legal. Only `from`, `to` and `promotion`
    /// are taken from the argument; the rest is filled in from the position.
    pub fn make_move(&mut self, chess_move: Move) -> ChessResult<()> {
        let piece = self
            .get_piece(chess_move.from)
            .ok_or(ChessError::NoPieceAt(chess_move.from))?;

        if piece.color != self.current_turn {
            return Err(ChessError::IllegalMove(format!("{} is not the side to move", chess_move)));
        }

        let mut candidates = Vec::new();
        self.pseudo_moves_from(chess_move.from, piece, &mut candidates);
        let resolved = candidates
            .into_iter()
            .find(|mv| mv.to == chess_move.to && mv.promotion == chess_move.promotion)
            .ok_or_else(|| ChessError::IllegalMove(chess_move.to_string()))?;

        self.push_move(resolved);

        // Check if the move puts/leaves the king in check
        if self.is_in_check(piece.color) {
            log::trace!("rejected {}: king left in check", resolved);
            self.undo_move()?;
            return Err(ChessError::IllegalMove(format!("{} leaves the king in check", resolved)));
        }

        Ok(())
    }

    /// Takes back the last move played on this board.
    pub fn undo_move(&mut self) -> ChessResult<Move> {
        let entry = self.history.pop().ok_or(ChessError::NothingToUndo)?;
        self.restore(entry.before);
        self.halfmove_clock = entry.halfmove_clock;
        self.fullmove_number = entry.fullmove_number;
        Ok(entry.mv)
    }

    /// The same position seen from the other side: ranks flipped, colors swapped.
    pub fn mirrored(&self) -> Board {
        let mut board = Board::empty();
        for (pos, piece) in self.get_all_pieces() {
            let target = Position { file: pos.file, rank: 9 - pos.rank };
            board.set_piece(target, Some(Piece::new(piece.piece_type, piece.color.opposite())));
        }
        let rights = self.castling_rights;
        board.castling_rights = CastlingRights {
            white_kingside: rights.black_kingside,
            white_queenside: rights.black_queenside,
            black_kingside: rights.white_kingside,
            black_queenside: rights.white_queenside,
        };
        board.current_turn = self.current_turn.opposite();
        board.en_passant = self.en_passant.map(|ep| Position { file: ep.file, rank: 9 - ep.rank });
        board.halfmove_clock = self.halfmove_clock;
        board.fullmove_number = self.fullmove_number;
        board
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            squares: self.squares,
            current_turn: self.current_turn,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.squares = snapshot.squares;
        self.current_turn = snapshot.current_turn;
        self.castling_rights = snapshot.castling_rights;
        self.en_passant = snapshot.en_passant;
    }

    fn push_move(&mut self, mv: Move) {
        let entry = UndoEntry {
            mv,
            before: self.snapshot(),
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        };
        self.apply_raw(mv);
        self.history.push(entry);
    }

    fn is_king_safe_after(&self, mv: Move) -> bool {
        let mover = self.current_turn;
        let mut scratch = Board {
            squares: self.squares,
            current_turn: self.current_turn,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            history: Vec::new(),
        };
        scratch.apply_raw(mv);
        !scratch.is_in_check(mover)
    }

    // Moves pieces and updates rights and counters without recording history.
    fn apply_raw(&mut self, mv: Move) {
        let Some(moved) = self.get_piece(mv.from) else {
            return;
        };
        let mut captured = self.get_piece(mv.to);
        self.set_piece(mv.from, None);

        match mv.move_type {
            MoveType::EnPassant => {
                let victim = Position { file: mv.to.file, rank: mv.from.rank };
                captured = self.get_piece(victim);
                self.set_piece(victim, None);
            }
            MoveType::Castle => {
                let rank = mv.from.rank;
                let (rook_from, rook_to) = if mv.to.file == 7 { (8, 6) } else { (1, 4) };
                let rook = self.get_piece(Position { file: rook_from, rank });
                self.set_piece(Position { file: rook_from, rank }, None);
                self.set_piece(Position { file: rook_to, rank }, rook);
            }
            MoveType::Normal | MoveType::Capture => {}
        }

        let placed = match mv.promotion {
            Some(piece_type) => Piece::new(piece_type, moved.color),
            None => moved,
        };
        self.set_piece(mv.to, Some(placed));

        if moved.piece_type == PieceType::King {
            self.castling_rights.clear(moved.color);
        }
        self.castling_rights.touch(mv.from);
        self.castling_rights.touch(mv.to);

        let opponent = moved.color.opposite();
        self.en_passant = None;
        if moved.piece_type == PieceType::Pawn && mv.from.rank.abs_diff(mv.to.rank) == 2 {
            let passed = Position {
                file: mv.from.file,
                rank: (mv.from.rank + mv.to.rank) / 2,
            };
            if self.en_passant_capturable(passed, opponent) {
                self.en_passant = Some(passed);
            }
        }

        if moved.piece_type == PieceType::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if moved.color == Color::Black {
            self.fullmove_number += 1;
        }
        self.current_turn = opponent;
    }

    // An en-passant square only counts when a pawn of `capturer` stands
    // ready to take on it.
    fn en_passant_capturable(&self, target: Position, capturer: Color) -> bool {
        let from_rank = -capturer.pawn_direction();
        [-1, 1].iter().any(|&df| {
            target
                .offset(df, from_rank)
                .and_then(|sq| self.get_piece(sq))
                .is_some_and(|p| p.color == capturer && p.piece_type == PieceType::Pawn)
        })
    }

    fn pseudo_moves_from(&self, pos: Position, piece: Piece, moves: &mut Vec<Move>) {
        match piece.piece_type {
            PieceType::Pawn => self.pawn_moves(pos, piece.color, moves),
            PieceType::Knight => self.step_moves(pos, piece.color, &KNIGHT_OFFSETS, moves),
            PieceType::Bishop => self.slide_moves(pos, piece.color, &BISHOP_DIRECTIONS, moves),
            PieceType::Rook => self.slide_moves(pos, piece.color, &ROOK_DIRECTIONS, moves),
            PieceType::Queen => {
                self.slide_moves(pos, piece.color, &ROOK_DIRECTIONS, moves);
                self.slide_moves(pos, piece.color, &BISHOP_DIRECTIONS, moves);
            }
            PieceType::King => {
                self.step_moves(pos, piece.color, &KING_OFFSETS, moves);
                self.castling_moves(pos, piece.color, moves);
            }
        }
    }

    fn pawn_moves(&self, pos: Position, color: Color, moves: &mut Vec<Move>) {
        let direction = color.pawn_direction();
        let (start_rank, promotion_rank) = match color {
            Color::White => (2, 8),
            Color::Black => (7, 1),
        };

        let push = |mv: Move, moves: &mut Vec<Move>| {
            if mv.to.rank == promotion_rank {
                moves.extend(PieceType::PROMOTIONS.iter().map(|&pt| mv.with_promotion(pt)));
            } else {
                moves.push(mv);
            }
        };

        if let Some(one) = pos.offset(0, direction) {
            if self.get_piece(one).is_none() {
                push(Move::new(pos, one), moves);
                if pos.rank == start_rank {
                    if let Some(two) = pos.offset(0, 2 * direction) {
                        if self.get_piece(two).is_none() {
                            moves.push(Move::new(pos, two));
                        }
                    }
                }
            }
        }

        for file_delta in [-1, 1] {
            let Some(target) = pos.offset(file_delta, direction) else {
                continue;
            };
            match self.get_piece(target) {
                Some(victim) if victim.color != color => {
                    push(Move::capture(pos, target, victim.piece_type), moves);
                }
                None if self.en_passant == Some(target) => {
                    moves.push(Move::en_passant(pos, target));
                }
                _ => {}
            }
        }
    }

    fn step_moves(&self, pos: Position, color: Color, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in offsets {
            let Some(target) = pos.offset(df, dr) else {
                continue;
            };
            match self.get_piece(target) {
                None => moves.push(Move::new(pos, target)),
                Some(victim) if victim.color != color => {
                    moves.push(Move::capture(pos, target, victim.piece_type));
                }
                Some(_) => {}
            }
        }
    }

    fn slide_moves(&self, pos: Position, color: Color, directions: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in directions {
            let mut current = pos.offset(df, dr);
            while let Some(target) = current {
                match self.get_piece(target) {
                    None => moves.push(Move::new(pos, target)),
                    Some(victim) => {
                        if victim.color != color {
                            moves.push(Move::capture(pos, target, victim.piece_type));
                        }
                        break;
                    }
                }
                current = target.offset(df, dr);
            }
        }
    }

    fn castling_moves(&self, pos: Position, color: Color, moves: &mut Vec<Move>) {
        let rank = match color {
            Color::White => 1,
            Color::Black => 8,
        };
        if pos != (Position { file: 5, rank }) {
            return;
        }
        let rights = self.castling_rights;
        if !rights.kingside(color) && !rights.queenside(color) {
            return;
        }

        let opponent = color.opposite();
        let at = |file: u8| Position { file, rank };
        let empty = |files: &[u8]| files.iter().all(|&f| self.get_piece(at(f)).is_none());
        let safe = |files: &[u8]| files.iter().all(|&f| !self.is_square_attacked(at(f), opponent));
        let own_rook = |file: u8| self.get_piece(at(file)) == Some(Piece::new(PieceType::Rook, color));

        if rights.kingside(color) && own_rook(8) && empty(&[6, 7]) && safe(&[5, 6, 7]) {
            moves.push(Move::castle(pos, at(7)));
        }
        if rights.queenside(color) && own_rook(1) && empty(&[2, 3, 4]) && safe(&[5, 4, 3]) {
            moves.push(Move::castle(pos, at(3)));
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

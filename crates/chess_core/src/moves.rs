use std::fmt;

use crate::{piece::PieceType, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    pub move_type: MoveType,
    pub promotion: Option<PieceType>,
    /// Type of the piece removed by this move, if any.
    pub captured: Option<PieceType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveType {
    Normal,
    Capture,
    EnPassant,
    Castle,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            move_type: MoveType::Normal,
            promotion: None,
            captured: None,
        }
    }

    pub fn capture(from: Position, to: Position, captured: PieceType) -> Self {
        Self {
            from,
            to,
            move_type: MoveType::Capture,
            promotion: None,
            captured: Some(captured),
        }
    }

    pub fn en_passant(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            move_type: MoveType::EnPassant,
            promotion: None,
            captured: Some(PieceType::Pawn),
        }
    }

    pub fn castle(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            move_type: MoveType::Castle,
            promotion: None,
            captured: None,
        }
    }

    pub fn with_promotion(self, promotion: PieceType) -> Self {
        Self {
            promotion: Some(promotion),
            ..self
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Move code: from-square, to-square and an optional promotion letter.
    pub fn to_uci(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Position {
        Position::from_algebraic(name).unwrap()
    }

    #[test]
    fn move_codes() {
        assert_eq!(Move::new(sq("e2"), sq("e4")).to_uci(), "e2e4");
        let promo = Move::new(sq("e7"), sq("e8")).with_promotion(PieceType::Queen);
        assert_eq!(promo.to_uci(), "e7e8q");
        let capture = Move::capture(sq("d4"), sq("e5"), PieceType::Pawn)
            .with_promotion(PieceType::Knight);
        assert!(capture.is_capture());
        assert_eq!(capture.to_uci(), "d4e5n");
    }
}

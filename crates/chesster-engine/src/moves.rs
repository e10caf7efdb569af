//! Move representation.

use serde::{Deserialize, Serialize};

use crate::piece::PieceType;
use crate::square::Square;

/// A single chess move.
///
/// Two moves are equal iff every field matches, which is what lets the
/// move parser resolve wire input by searching the legal move list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Source square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Promotion piece for a pawn reaching the last rank.
    pub promotion: Option<PieceType>,
    /// Whether the move captures a piece (including en passant).
    pub is_capture: bool,
    /// Whether the move is a castling king move.
    pub is_castling: bool,
    /// Whether the move is an en passant capture.
    pub is_en_passant: bool,
}

impl Move {
    /// A quiet move with no flags set.
    #[must_use]
    pub const fn quiet(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            is_capture: false,
            is_castling: false,
            is_en_passant: false,
        }
    }

    /// A plain capture.
    #[must_use]
    pub const fn capture(from: Square, to: Square) -> Self {
        Self {
            is_capture: true,
            ..Self::quiet(from, to)
        }
    }

    /// This move with a promotion piece attached.
    #[must_use]
    pub const fn with_promotion(self, piece: PieceType) -> Self {
        Self {
            promotion: Some(piece),
            ..self
        }
    }
}

impl std::fmt::Display for Move {
    /// Coordinate notation: `e2e4`, or `e7e8q` for promotions.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.promotion_char())?;
        }
        Ok(())
    }
}

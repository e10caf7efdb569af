//! Game termination detection.

use serde::{Deserialize, Serialize};

use crate::piece::{Color, PieceType};
use crate::position::Position;
use crate::square::Square;

/// The status of a game, in the wire vocabulary of the server protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// The game continues.
    #[serde(rename = "in_progress")]
    InProgress,
    /// The side to move has no legal moves and is in check.
    #[serde(rename = "checkmate")]
    Checkmate,
    /// The side to move has no legal moves and is not in check.
    #[serde(rename = "stalemate")]
    Stalemate,
    /// One hundred plies without a capture or pawn move.
    #[serde(rename = "draw_by_fifty_move_rule")]
    FiftyMoveDraw,
    /// Neither side can possibly deliver mate.
    #[serde(rename = "draw_by_insufficient_material")]
    InsufficientMaterialDraw,
}

impl GameStatus {
    /// The wire string for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Checkmate => "checkmate",
            Self::Stalemate => "stalemate",
            Self::FiftyMoveDraw => "draw_by_fifty_move_rule",
            Self::InsufficientMaterialDraw => "draw_by_insufficient_material",
        }
    }

    /// True for every status except [`GameStatus::InProgress`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Position {
    /// Determine the game status of this position.
    ///
    /// Checked in priority order: mate and stalemate first (a position
    /// with no legal moves is never a fifty-move or material draw),
    /// then the fifty-move rule, then insufficient material.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        if self.legal_moves().is_empty() {
            return if self.is_in_check(self.turn) {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            };
        }
        if self.halfmove_clock >= 100 {
            return GameStatus::FiftyMoveDraw;
        }
        if self.has_insufficient_material() {
            return GameStatus::InsufficientMaterialDraw;
        }
        GameStatus::InProgress
    }

    /// Draw by insufficient material: K vs K, K+minor vs K, K+2N vs K,
    /// or K+B vs K+B with both bishops on the same square color. Any
    /// pawn, rook, or queen on the board rules insufficiency out.
    fn has_insufficient_material(&self) -> bool {
        let mut others: Vec<(Color, PieceType, Square)> = Vec::new();
        for sq in Square::all() {
            let piece = self.piece_at(sq);
            let (Some(color), Some(piece_type)) = (piece.color(), piece.piece_type()) else {
                continue;
            };
            match piece_type {
                PieceType::King => {}
                PieceType::Pawn | PieceType::Rook | PieceType::Queen => return false,
                _ => others.push((color, piece_type, sq)),
            }
        }

        match others.as_slice() {
            [] => true,
            [_] => true,
            [(c1, PieceType::Knight, _), (c2, PieceType::Knight, _)] => c1 == c2,
            [(c1, PieceType::Bishop, s1), (c2, PieceType::Bishop, s2)] => {
                c1 != c2 && square_color(*s1) == square_color(*s2)
            }
            _ => false,
        }
    }
}

fn square_color(sq: Square) -> u8 {
    (sq.file() + sq.rank()) % 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings() {
        assert_eq!(GameStatus::InProgress.as_str(), "in_progress");
        assert_eq!(GameStatus::Checkmate.as_str(), "checkmate");
        assert_eq!(
            GameStatus::FiftyMoveDraw.to_string(),
            "draw_by_fifty_move_rule"
        );
        assert_eq!(
            serde_json::to_string(&GameStatus::InsufficientMaterialDraw).unwrap(),
            "\"draw_by_insufficient_material\""
        );
        assert!(!GameStatus::InProgress.is_terminal());
        assert!(GameStatus::Stalemate.is_terminal());
    }

    #[test]
    fn fresh_game_is_in_progress() {
        assert_eq!(Position::new_game().status(), GameStatus::InProgress);
    }

    #[test]
    fn fifty_move_rule_at_one_hundred_plies() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/4R3/4K3 w - - 100 80").unwrap();
        assert_eq!(pos.status(), GameStatus::FiftyMoveDraw);

        let pos = Position::from_fen("4k3/8/8/8/8/8/4R3/4K3 w - - 99 80").unwrap();
        assert_eq!(pos.status(), GameStatus::InProgress);
    }

    #[test]
    fn bare_kings_draw() {
        let pos = Position::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::InsufficientMaterialDraw);
    }

    #[test]
    fn single_minor_draws() {
        let pos = Position::from_fen("8/8/8/4k3/8/8/4B3/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::InsufficientMaterialDraw);

        let pos = Position::from_fen("8/8/8/4k3/8/8/4n3/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::InsufficientMaterialDraw);
    }

    #[test]
    fn two_knights_of_one_side_draw() {
        let pos = Position::from_fen("8/8/8/4k3/8/8/3NN3/4K3 b - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::InsufficientMaterialDraw);

        // A knight each is not in the insufficiency list.
        let pos = Position::from_fen("8/8/8/4k3/4n3/8/4N3/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::InProgress);
    }

    #[test]
    fn opposite_bishops_same_square_color_draw() {
        // Bishops on d4 (dark) and e5 (dark).
        let pos = Position::from_fen("8/8/8/4b3/3B4/8/8/1k2K3 w - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::InsufficientMaterialDraw);

        // Bishops on opposite square colors can still mate in theory.
        let pos = Position::from_fen("8/8/8/4b3/4B3/8/8/k3K3 w - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::InProgress);
    }

    #[test]
    fn heavy_pieces_rule_out_insufficiency() {
        let pos = Position::from_fen("8/8/8/4k3/8/8/4R3/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::InProgress);

        let pos = Position::from_fen("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.status(), GameStatus::InProgress);
    }
}

//! Piece colors, piece types, and the board occupant type.

use serde::{Deserialize, Serialize};

/// Chess piece color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// White pieces.
    White,
    /// Black pieces.
    Black,
}

impl Color {
    /// Get the opposite color.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Returns true if this is white.
    #[must_use]
    pub const fn is_white(self) -> bool {
        matches!(self, Self::White)
    }

    /// The single-character FEN turn field for this color.
    #[must_use]
    pub const fn fen_char(self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

/// Chess piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    /// Pawn.
    Pawn,
    /// Knight.
    Knight,
    /// Bishop.
    Bishop,
    /// Rook.
    Rook,
    /// Queen.
    Queen,
    /// King.
    King,
}

impl PieceType {
    /// The lowercase promotion suffix used in coordinate move notation.
    #[must_use]
    pub const fn promotion_char(self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    /// Parse a promotion suffix (`q`, `r`, `b`, `n`).
    #[must_use]
    pub const fn from_promotion_char(c: char) -> Option<Self> {
        match c {
            'q' => Some(Self::Queen),
            'r' => Some(Self::Rook),
            'b' => Some(Self::Bishop),
            'n' => Some(Self::Knight),
            _ => None,
        }
    }
}

/// A board occupant: one of the twelve colored pieces, or nothing.
///
/// A compact enum keeps the board a flat `[Piece; 64]` that is `Copy`,
/// so applying a move can clone the whole position cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Piece {
    /// Empty square.
    Empty,
    /// White pawn.
    WhitePawn,
    /// White knight.
    WhiteKnight,
    /// White bishop.
    WhiteBishop,
    /// White rook.
    WhiteRook,
    /// White queen.
    WhiteQueen,
    /// White king.
    WhiteKing,
    /// Black pawn.
    BlackPawn,
    /// Black knight.
    BlackKnight,
    /// Black bishop.
    BlackBishop,
    /// Black rook.
    BlackRook,
    /// Black queen.
    BlackQueen,
    /// Black king.
    BlackKing,
}

impl Piece {
    /// Build a piece from a color and type.
    #[must_use]
    pub const fn new(color: Color, piece_type: PieceType) -> Self {
        match (color, piece_type) {
            (Color::White, PieceType::Pawn) => Self::WhitePawn,
            (Color::White, PieceType::Knight) => Self::WhiteKnight,
            (Color::White, PieceType::Bishop) => Self::WhiteBishop,
            (Color::White, PieceType::Rook) => Self::WhiteRook,
            (Color::White, PieceType::Queen) => Self::WhiteQueen,
            (Color::White, PieceType::King) => Self::WhiteKing,
            (Color::Black, PieceType::Pawn) => Self::BlackPawn,
            (Color::Black, PieceType::Knight) => Self::BlackKnight,
            (Color::Black, PieceType::Bishop) => Self::BlackBishop,
            (Color::Black, PieceType::Rook) => Self::BlackRook,
            (Color::Black, PieceType::Queen) => Self::BlackQueen,
            (Color::Black, PieceType::King) => Self::BlackKing,
        }
    }

    /// The color of this piece, or `None` for an empty square.
    #[must_use]
    pub const fn color(self) -> Option<Color> {
        match self {
            Self::Empty => None,
            Self::WhitePawn
            | Self::WhiteKnight
            | Self::WhiteBishop
            | Self::WhiteRook
            | Self::WhiteQueen
            | Self::WhiteKing => Some(Color::White),
            _ => Some(Color::Black),
        }
    }

    /// The type of this piece, or `None` for an empty square.
    #[must_use]
    pub const fn piece_type(self) -> Option<PieceType> {
        match self {
            Self::Empty => None,
            Self::WhitePawn | Self::BlackPawn => Some(PieceType::Pawn),
            Self::WhiteKnight | Self::BlackKnight => Some(PieceType::Knight),
            Self::WhiteBishop | Self::BlackBishop => Some(PieceType::Bishop),
            Self::WhiteRook | Self::BlackRook => Some(PieceType::Rook),
            Self::WhiteQueen | Self::BlackQueen => Some(PieceType::Queen),
            Self::WhiteKing | Self::BlackKing => Some(PieceType::King),
        }
    }

    /// Returns true if the square is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns true if this piece belongs to `color`.
    #[must_use]
    pub fn is_color(self, color: Color) -> bool {
        self.color() == Some(color)
    }

    /// The FEN glyph: uppercase for white, lowercase for black.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::WhitePawn => 'P',
            Self::WhiteKnight => 'N',
            Self::WhiteBishop => 'B',
            Self::WhiteRook => 'R',
            Self::WhiteQueen => 'Q',
            Self::WhiteKing => 'K',
            Self::BlackPawn => 'p',
            Self::BlackKnight => 'n',
            Self::BlackBishop => 'b',
            Self::BlackRook => 'r',
            Self::BlackQueen => 'q',
            Self::BlackKing => 'k',
        }
    }

    /// Parse a FEN glyph.
    #[must_use]
    pub const fn from_glyph(c: char) -> Option<Self> {
        match c {
            'P' => Some(Self::WhitePawn),
            'N' => Some(Self::WhiteKnight),
            'B' => Some(Self::WhiteBishop),
            'R' => Some(Self::WhiteRook),
            'Q' => Some(Self::WhiteQueen),
            'K' => Some(Self::WhiteKing),
            'p' => Some(Self::BlackPawn),
            'n' => Some(Self::BlackKnight),
            'b' => Some(Self::BlackBishop),
            'r' => Some(Self::BlackRook),
            'q' => Some(Self::BlackQueen),
            'k' => Some(Self::BlackKing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_opposite() {
        assert_eq!(Color::White.opposite(), Color::Black);
        assert_eq!(Color::Black.opposite(), Color::White);
    }

    #[test]
    fn color_wire_format() {
        assert_eq!(serde_json::to_string(&Color::White).unwrap(), "\"white\"");
        assert_eq!(Color::Black.to_string(), "black");
    }

    #[test]
    fn piece_roundtrips_through_glyph() {
        for piece in [
            Piece::WhitePawn,
            Piece::WhiteKing,
            Piece::BlackQueen,
            Piece::BlackKnight,
        ] {
            assert_eq!(Piece::from_glyph(piece.glyph()), Some(piece));
        }
        assert_eq!(Piece::from_glyph('x'), None);
    }

    #[test]
    fn piece_decomposition() {
        let piece = Piece::new(Color::Black, PieceType::Rook);
        assert_eq!(piece, Piece::BlackRook);
        assert_eq!(piece.color(), Some(Color::Black));
        assert_eq!(piece.piece_type(), Some(PieceType::Rook));
        assert!(Piece::Empty.is_empty());
        assert_eq!(Piece::Empty.color(), None);
    }

    #[test]
    fn promotion_chars() {
        assert_eq!(PieceType::from_promotion_char('q'), Some(PieceType::Queen));
        assert_eq!(PieceType::from_promotion_char('n'), Some(PieceType::Knight));
        assert_eq!(PieceType::from_promotion_char('k'), None);
        assert_eq!(PieceType::Rook.promotion_char(), 'r');
    }
}

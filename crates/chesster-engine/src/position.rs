//! The full game state and move application.

use crate::moves::Move;
use crate::piece::{Color, Piece, PieceType};
use crate::square::Square;

/// The set of castling rights still available to both sides.
///
/// Stored as a four-bit set. The FEN rendering is the usual `KQkq`
/// subset, or `-` when empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    /// White king-side (`K`).
    pub const WHITE_KING: Self = Self(0b0001);
    /// White queen-side (`Q`).
    pub const WHITE_QUEEN: Self = Self(0b0010);
    /// Black king-side (`k`).
    pub const BLACK_KING: Self = Self(0b0100);
    /// Black queen-side (`q`).
    pub const BLACK_QUEEN: Self = Self(0b1000);

    /// All four rights.
    #[must_use]
    pub const fn all() -> Self {
        Self(0b1111)
    }

    /// No rights.
    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    /// Whether every right in `other` is present.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// This set with the rights in `other` added.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// This set with the rights in `other` removed.
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// True when no rights remain.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The rights that a move touching `sq` revokes.
    ///
    /// A king leaving its home square loses both of its side's rights; a
    /// rook leaving a corner, or any piece landing on one, loses that
    /// corner's single right.
    #[must_use]
    pub(crate) fn revoked_at(sq: Square) -> Self {
        match (sq.file(), sq.rank()) {
            (4, 0) => Self::WHITE_KING.with(Self::WHITE_QUEEN),
            (0, 0) => Self::WHITE_QUEEN,
            (7, 0) => Self::WHITE_KING,
            (4, 7) => Self::BLACK_KING.with(Self::BLACK_QUEEN),
            (0, 7) => Self::BLACK_QUEEN,
            (7, 7) => Self::BLACK_KING,
            _ => Self::none(),
        }
    }
}

impl std::fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for (right, c) in [
            (Self::WHITE_KING, 'K'),
            (Self::WHITE_QUEEN, 'Q'),
            (Self::BLACK_KING, 'k'),
            (Self::BLACK_QUEEN, 'q'),
        ] {
            if self.contains(right) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// A complete chess position.
///
/// Positions are immutable from the caller's perspective: applying a
/// move produces a fresh value, so a room can keep the previous state
/// on the stack while validating the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub(crate) board: [Piece; 64],
    /// The side to move.
    pub turn: Color,
    /// Castling rights still available.
    pub castling: CastlingRights,
    /// The square behind a pawn that has just double-pushed.
    pub en_passant: Option<Square>,
    /// Plies since the last capture or pawn move.
    pub halfmove_clock: u32,
    /// Starts at 1, incremented after black's move.
    pub fullmove_number: u32,
    // King squares cached off the board; apply_move keeps them current.
    pub(crate) white_king: Square,
    pub(crate) black_king: Square,
}

impl Position {
    /// The standard starting position.
    #[must_use]
    pub fn new_game() -> Self {
        let mut board = [Piece::Empty; 64];
        let back_rank = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        for (file, piece_type) in back_rank.into_iter().enumerate() {
            board[file] = Piece::new(Color::White, piece_type);
            board[8 + file] = Piece::new(Color::White, PieceType::Pawn);
            board[48 + file] = Piece::new(Color::Black, PieceType::Pawn);
            board[56 + file] = Piece::new(Color::Black, piece_type);
        }
        Self {
            board,
            turn: Color::White,
            castling: CastlingRights::all(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            white_king: Square::E1,
            black_king: Square::E8,
        }
    }

    /// The piece on a square.
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Piece {
        self.board[sq.index()]
    }

    /// The cached king square for a color.
    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        match color {
            Color::White => self.white_king,
            Color::Black => self.black_king,
        }
    }

    /// Apply a move and return the resulting position.
    ///
    /// The move is taken at face value; callers that accept untrusted
    /// input resolve it through [`Position::parse_uci`] first so only
    /// generated moves ever reach this method.
    #[must_use]
    pub fn apply_move(&self, m: Move) -> Self {
        let mut next = self.clone();
        let mover = self.board[m.from.index()];
        let mover_color = mover.color().unwrap_or(self.turn);
        let mover_type = mover.piece_type();

        next.board[m.to.index()] = mover;
        next.board[m.from.index()] = Piece::Empty;

        if let Some(promotion) = m.promotion {
            next.board[m.to.index()] = Piece::new(mover_color, promotion);
        }

        // The en passant victim sits behind the destination square.
        if m.is_en_passant {
            let back = match mover_color {
                Color::White => m.to.offset(0, -1),
                Color::Black => m.to.offset(0, 1),
            };
            if let Some(victim) = back {
                next.board[victim.index()] = Piece::Empty;
            }
        }

        next.en_passant = if mover_type == Some(PieceType::Pawn)
            && m.from.rank().abs_diff(m.to.rank()) == 2
        {
            Square::new(m.from.file(), (m.from.rank() + m.to.rank()) / 2)
        } else {
            None
        };

        if m.is_castling {
            let rook_shift = match (m.to.file(), m.to.rank()) {
                (6, r) => Square::new(7, r).zip(Square::new(5, r)),
                (2, r) => Square::new(0, r).zip(Square::new(3, r)),
                _ => None,
            };
            if let Some((rook_from, rook_to)) = rook_shift {
                next.board[rook_to.index()] = next.board[rook_from.index()];
                next.board[rook_from.index()] = Piece::Empty;
            }
        }

        next.castling = next
            .castling
            .without(CastlingRights::revoked_at(m.from))
            .without(CastlingRights::revoked_at(m.to));

        next.halfmove_clock = if mover_type == Some(PieceType::Pawn) || m.is_capture {
            0
        } else {
            self.halfmove_clock + 1
        };

        if self.turn == Color::Black {
            next.fullmove_number += 1;
        }
        next.turn = self.turn.opposite();

        if mover_type == Some(PieceType::King) {
            match mover_color {
                Color::White => next.white_king = m.to,
                Color::Black => next.black_king = m.to,
            }
        }

        next
    }

    /// Resolve a coordinate move string against the legal move list.
    ///
    /// Accepts `e2e4` and `e7e8q` forms. The promotion suffix must be
    /// present for a promotion and absent otherwise, or the move does
    /// not match anything.
    pub fn parse_uci(&self, input: &str) -> Result<Move, crate::EngineError> {
        if !input.is_ascii() || input.len() < 4 || input.len() > 5 {
            return Err(crate::EngineError::InvalidMoveFormat(input.to_string()));
        }
        let from: Square = input[0..2]
            .parse()
            .map_err(|_| crate::EngineError::InvalidMoveFormat(input.to_string()))?;
        let to: Square = input[2..4]
            .parse()
            .map_err(|_| crate::EngineError::InvalidMoveFormat(input.to_string()))?;
        let promotion = match input.chars().nth(4) {
            None => None,
            Some(c) => Some(
                PieceType::from_promotion_char(c)
                    .ok_or_else(|| crate::EngineError::InvalidMoveFormat(input.to_string()))?,
            ),
        };

        self.legal_moves()
            .into_iter()
            .find(|m| m.from == from && m.to == to && m.promotion == promotion)
            .ok_or_else(|| crate::EngineError::IllegalMove(input.to_string()))
    }
}

//! Pseudo-move generation, attack detection, and the legality filter.
//!
//! Generation is keyed off the piece type, one function per type. A
//! pseudo-move respects piece movement but may leave the mover's own
//! king attacked; [`Position::legal_moves`] filters those out by
//! applying each candidate to a copy.

use crate::moves::Move;
use crate::piece::{Color, PieceType};
use crate::position::{CastlingRights, Position};
use crate::square::Square;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

const PROMOTION_PIECES: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

impl Position {
    /// All legal moves for the side to move.
    #[must_use]
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        for sq in Square::all() {
            let piece = self.piece_at(sq);
            if !piece.is_color(self.turn) {
                continue;
            }
            match piece.piece_type() {
                Some(PieceType::Pawn) => self.pawn_moves(sq, &mut moves),
                Some(PieceType::Knight) => self.leaper_moves(sq, &KNIGHT_OFFSETS, &mut moves),
                Some(PieceType::Bishop) => self.slider_moves(sq, &BISHOP_DIRECTIONS, &mut moves),
                Some(PieceType::Rook) => self.slider_moves(sq, &ROOK_DIRECTIONS, &mut moves),
                Some(PieceType::Queen) => {
                    self.slider_moves(sq, &BISHOP_DIRECTIONS, &mut moves);
                    self.slider_moves(sq, &ROOK_DIRECTIONS, &mut moves);
                }
                Some(PieceType::King) => {
                    self.leaper_moves(sq, &KING_OFFSETS, &mut moves);
                    self.castling_moves(sq, &mut moves);
                }
                None => {}
            }
        }

        moves.retain(|&m| !self.apply_move(m).is_in_check(self.turn));
        moves
    }

    /// Whether `color`'s king is attacked.
    #[must_use]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), color.opposite())
    }

    /// Whether any piece of `by` attacks `sq`.
    #[must_use]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        // Pawns attack diagonally toward the enemy, so look one rank
        // back toward the attacker.
        let pawn_rank = match by {
            Color::White => -1,
            Color::Black => 1,
        };
        for file_delta in [-1, 1] {
            if let Some(from) = sq.offset(file_delta, pawn_rank) {
                let piece = self.piece_at(from);
                if piece.is_color(by) && piece.piece_type() == Some(PieceType::Pawn) {
                    return true;
                }
            }
        }

        for &(df, dr) in &KNIGHT_OFFSETS {
            if let Some(from) = sq.offset(df, dr) {
                let piece = self.piece_at(from);
                if piece.is_color(by) && piece.piece_type() == Some(PieceType::Knight) {
                    return true;
                }
            }
        }

        if self.ray_attacked(sq, by, &BISHOP_DIRECTIONS, PieceType::Bishop)
            || self.ray_attacked(sq, by, &ROOK_DIRECTIONS, PieceType::Rook)
        {
            return true;
        }

        for &(df, dr) in &KING_OFFSETS {
            if let Some(from) = sq.offset(df, dr) {
                let piece = self.piece_at(from);
                if piece.is_color(by) && piece.piece_type() == Some(PieceType::King) {
                    return true;
                }
            }
        }

        false
    }

    fn ray_attacked(
        &self,
        sq: Square,
        by: Color,
        directions: &[(i8, i8)],
        slider: PieceType,
    ) -> bool {
        for &(df, dr) in directions {
            let mut current = sq;
            while let Some(next) = current.offset(df, dr) {
                let piece = self.piece_at(next);
                if !piece.is_empty() {
                    if piece.is_color(by) {
                        let pt = piece.piece_type();
                        if pt == Some(slider) || pt == Some(PieceType::Queen) {
                            return true;
                        }
                    }
                    break;
                }
                current = next;
            }
        }
        false
    }

    fn pawn_moves(&self, from: Square, out: &mut Vec<Move>) {
        let (rank_dir, start_rank, promotion_rank) = match self.turn {
            Color::White => (1, 1, 7),
            Color::Black => (-1, 6, 0),
        };

        if let Some(to) = from.offset(0, rank_dir) {
            if self.piece_at(to).is_empty() {
                push_pawn_move(out, Move::quiet(from, to), promotion_rank);
                if from.rank() == start_rank {
                    if let Some(two) = from.offset(0, 2 * rank_dir) {
                        if self.piece_at(two).is_empty() {
                            out.push(Move::quiet(from, two));
                        }
                    }
                }
            }
        }

        for file_delta in [-1, 1] {
            let Some(to) = from.offset(file_delta, rank_dir) else {
                continue;
            };
            let target = self.piece_at(to);
            if target.is_color(self.turn.opposite()) {
                push_pawn_move(out, Move::capture(from, to), promotion_rank);
            } else if self.en_passant == Some(to) {
                out.push(Move {
                    is_en_passant: true,
                    ..Move::capture(from, to)
                });
            }
        }
    }

    fn leaper_moves(&self, from: Square, offsets: &[(i8, i8)], out: &mut Vec<Move>) {
        for &(df, dr) in offsets {
            let Some(to) = from.offset(df, dr) else {
                continue;
            };
            let target = self.piece_at(to);
            if target.is_empty() {
                out.push(Move::quiet(from, to));
            } else if target.is_color(self.turn.opposite()) {
                out.push(Move::capture(from, to));
            }
        }
    }

    fn slider_moves(&self, from: Square, directions: &[(i8, i8)], out: &mut Vec<Move>) {
        for &(df, dr) in directions {
            let mut current = from;
            while let Some(to) = current.offset(df, dr) {
                let target = self.piece_at(to);
                if target.is_empty() {
                    out.push(Move::quiet(from, to));
                } else {
                    if target.is_color(self.turn.opposite()) {
                        out.push(Move::capture(from, to));
                    }
                    break;
                }
                current = to;
            }
        }
    }

    /// Castling, generated only from the king's home square.
    ///
    /// The king may not castle out of, through, or into check. On the
    /// queen side the b-file square must be empty but only the two
    /// squares the king actually crosses (d and c) are checked for
    /// attacks, which is done by simulating the single king steps.
    fn castling_moves(&self, from: Square, out: &mut Vec<Move>) {
        let (home, king_right, queen_right) = match self.turn {
            Color::White => (
                Square::E1,
                CastlingRights::WHITE_KING,
                CastlingRights::WHITE_QUEEN,
            ),
            Color::Black => (
                Square::E8,
                CastlingRights::BLACK_KING,
                CastlingRights::BLACK_QUEEN,
            ),
        };
        if from != home {
            return;
        }

        let rank = home.rank();
        let empty = |file: u8| {
            Square::new(file, rank).is_some_and(|sq| self.piece_at(sq).is_empty())
        };
        let king_safe_on = |file: u8| {
            Square::new(file, rank).is_some_and(|sq| {
                !self
                    .apply_move(Move::quiet(home, sq))
                    .is_in_check(self.turn)
            })
        };

        if self.castling.contains(king_right)
            && empty(5)
            && empty(6)
            && !self.is_in_check(self.turn)
            && king_safe_on(5)
            && king_safe_on(6)
        {
            if let Some(to) = Square::new(6, rank) {
                out.push(Move {
                    is_castling: true,
                    ..Move::quiet(home, to)
                });
            }
        }

        if self.castling.contains(queen_right)
            && empty(1)
            && empty(2)
            && empty(3)
            && !self.is_in_check(self.turn)
            && king_safe_on(3)
            && king_safe_on(2)
        {
            if let Some(to) = Square::new(2, rank) {
                out.push(Move {
                    is_castling: true,
                    ..Move::quiet(home, to)
                });
            }
        }
    }
}

fn push_pawn_move(out: &mut Vec<Move>, m: Move, promotion_rank: u8) {
    if m.to.rank() == promotion_rank {
        for piece in PROMOTION_PIECES {
            out.push(m.with_promotion(piece));
        }
    } else {
        out.push(m);
    }
}

//! FEN parsing and emission.
//!
//! A FEN record has six space-separated fields: piece placement, side
//! to move, castling rights, en passant target, halfmove clock, and
//! fullmove number. The parser validates every field; the emitter is
//! the exact inverse, so `Position::from_fen(p.fen()) == p` for any
//! reachable position.

use crate::error::EngineError;
use crate::piece::{Color, Piece, PieceType};
use crate::position::{CastlingRights, Position};
use crate::square::Square;

impl Position {
    /// Parse a six-field FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(EngineError::fen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let board = parse_board(fields[0])?;

        let turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(EngineError::fen(format!("bad turn field: {other}"))),
        };

        let castling = parse_castling(fields[2])?;
        let en_passant = parse_en_passant(fields[3])?;

        let halfmove_clock: u32 = fields[4]
            .parse()
            .map_err(|_| EngineError::fen(format!("bad halfmove clock: {}", fields[4])))?;
        let fullmove_number: u32 = fields[5]
            .parse()
            .map_err(|_| EngineError::fen(format!("bad fullmove number: {}", fields[5])))?;
        if fullmove_number == 0 {
            return Err(EngineError::fen("fullmove number must be positive"));
        }

        let white_king = locate_king(&board, Color::White)?;
        let black_king = locate_king(&board, Color::Black)?;

        Ok(Self {
            board,
            turn,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            white_king,
            black_king,
        })
    }

    /// Render this position as a FEN string.
    #[must_use]
    pub fn fen(&self) -> String {
        let mut out = String::with_capacity(80);
        for rank in (0..8).rev() {
            let mut empty_run = 0;
            for file in 0..8 {
                let piece = self.board[(rank * 8 + file) as usize];
                if piece.is_empty() {
                    empty_run += 1;
                } else {
                    if empty_run > 0 {
                        out.push(char::from(b'0' + empty_run));
                        empty_run = 0;
                    }
                    out.push(piece.glyph());
                }
            }
            if empty_run > 0 {
                out.push(char::from(b'0' + empty_run));
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(self.turn.fen_char());
        out.push(' ');
        out.push_str(&self.castling.to_string());
        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }
        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }
}

fn parse_board(field: &str) -> Result<[Piece; 64], EngineError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(EngineError::fen(format!(
            "expected 8 ranks, got {}",
            ranks.len()
        )));
    }

    let mut board = [Piece::Empty; 64];
    // FEN lists rank 8 first.
    for (row, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - row;
        let mut file = 0usize;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || skip > 8 {
                    return Err(EngineError::fen(format!("bad empty-run digit: {c}")));
                }
                file += skip as usize;
            } else {
                let piece = Piece::from_glyph(c)
                    .ok_or_else(|| EngineError::fen(format!("unknown piece glyph: {c}")))?;
                if file >= 8 {
                    return Err(EngineError::fen(format!("rank {} overflows", rank + 1)));
                }
                board[rank * 8 + file] = piece;
                file += 1;
            }
        }
        if file != 8 {
            return Err(EngineError::fen(format!(
                "rank {} describes {file} files",
                rank + 1
            )));
        }
    }
    Ok(board)
}

fn parse_castling(field: &str) -> Result<CastlingRights, EngineError> {
    if field == "-" {
        return Ok(CastlingRights::none());
    }
    let mut rights = CastlingRights::none();
    for c in field.chars() {
        let right = match c {
            'K' => CastlingRights::WHITE_KING,
            'Q' => CastlingRights::WHITE_QUEEN,
            'k' => CastlingRights::BLACK_KING,
            'q' => CastlingRights::BLACK_QUEEN,
            other => {
                return Err(EngineError::fen(format!("bad castling char: {other}")));
            }
        };
        rights = rights.with(right);
    }
    Ok(rights)
}

fn parse_en_passant(field: &str) -> Result<Option<Square>, EngineError> {
    if field == "-" {
        return Ok(None);
    }
    let sq: Square = field
        .parse()
        .map_err(|_| EngineError::fen(format!("bad en passant square: {field}")))?;
    // The target sits behind a double-pushed pawn, so only ranks 3 and 6.
    if sq.rank() != 2 && sq.rank() != 5 {
        return Err(EngineError::fen(format!(
            "en passant square {sq} not on rank 3 or 6"
        )));
    }
    Ok(Some(sq))
}

fn locate_king(board: &[Piece; 64], color: Color) -> Result<Square, EngineError> {
    let king = Piece::new(color, PieceType::King);
    let mut found = None;
    for sq in Square::all() {
        if board[sq.index()] == king {
            if found.is_some() {
                return Err(EngineError::fen(format!("more than one {color} king")));
            }
            found = Some(sq);
        }
    }
    found.ok_or_else(|| EngineError::fen(format!("no {color} king")))
}

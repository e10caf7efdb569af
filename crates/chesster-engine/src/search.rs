//! Static evaluation and fixed-depth alpha-beta search for the bot.
//!
//! The evaluation is a bounded sum of material, piece-square tables,
//! king safety, pawn structure, and mobility. It is deliberately
//! simple; the bot plays a decent club game at depth 4 and the weights
//! carry no claim beyond that.

use crate::moves::Move;
use crate::piece::{Color, PieceType};
use crate::position::Position;
use crate::square::Square;
use crate::status::GameStatus;

/// Default search depth in plies.
pub const DEFAULT_DEPTH: u32 = 4;

// Far outside the reachable static-evaluation range, so a forced mate
// always outranks any material swing.
const MATE_SCORE: i32 = 1_000_000;

const PAWN_VALUE: i32 = 100;
const KNIGHT_VALUE: i32 = 320;
const BISHOP_VALUE: i32 = 330;
const ROOK_VALUE: i32 = 500;
const QUEEN_VALUE: i32 = 900;
const KING_VALUE: i32 = 20_000;

const MOBILITY_BONUS: i32 = 10;
const PAWN_SHIELD_BONUS: i32 = 10;
const CENTRAL_KING_PENALTY: i32 = 20;
const DOUBLED_PAWN_PENALTY: i32 = 10;
const PASSED_PAWN_BONUS: i32 = 20;

// Piece-square tables, written from white's point of view with rank 8
// on the first row. White lookups mirror the square vertically; black
// uses it directly.
#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MIDDLEGAME_TABLE: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_ENDGAME_TABLE: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
];

/// Pick the best move for the side to move, or `None` at a terminal
/// position.
#[must_use]
pub fn best_move(pos: &Position, depth: u32) -> Option<Move> {
    let moves = pos.legal_moves();
    let bot_color = pos.turn;

    let mut best = None;
    let mut best_value = i32::MIN;
    for m in moves {
        let next = pos.apply_move(m);
        let value = minimax(
            &next,
            depth.saturating_sub(1),
            i32::MIN,
            i32::MAX,
            false,
            bot_color,
        );
        if value > best_value || best.is_none() {
            best_value = value;
            best = Some(m);
        }
    }
    best
}

fn minimax(
    pos: &Position,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    bot_color: Color,
) -> i32 {
    let status = pos.status();
    if status == GameStatus::Checkmate {
        // The side to move is the side that got mated.
        return if pos.turn == bot_color {
            -MATE_SCORE
        } else {
            MATE_SCORE
        };
    }
    if depth == 0 || status.is_terminal() {
        return evaluate(pos, bot_color);
    }

    let moves = pos.legal_moves();
    if maximizing {
        let mut best = i32::MIN;
        for m in moves {
            let value = minimax(
                &pos.apply_move(m),
                depth - 1,
                alpha,
                beta,
                false,
                bot_color,
            );
            best = best.max(value);
            alpha = alpha.max(value);
            if beta <= alpha {
                break;
            }
        }
        best
    } else {
        let mut best = i32::MAX;
        for m in moves {
            let value = minimax(
                &pos.apply_move(m),
                depth - 1,
                alpha,
                beta,
                true,
                bot_color,
            );
            best = best.min(value);
            beta = beta.min(value);
            if beta <= alpha {
                break;
            }
        }
        best
    }
}

/// Static evaluation from `perspective`'s point of view.
#[must_use]
pub fn evaluate(pos: &Position, perspective: Color) -> i32 {
    let mut score = 0;

    for sq in Square::all() {
        let piece = pos.piece_at(sq);
        let (Some(color), Some(piece_type)) = (piece.color(), piece.piece_type()) else {
            continue;
        };
        let value = material_value(piece_type) + table_value(pos, piece_type, color, sq);
        if color == perspective {
            score += value;
        } else {
            score -= value;
        }
    }

    let mobility = pos.legal_moves().len() as i32 * MOBILITY_BONUS;
    if pos.turn == perspective {
        score += mobility;
    } else {
        score -= mobility;
    }

    score += king_safety(pos, perspective) - king_safety(pos, perspective.opposite());
    score += pawn_structure(pos, perspective) - pawn_structure(pos, perspective.opposite());

    score
}

const fn material_value(piece_type: PieceType) -> i32 {
    match piece_type {
        PieceType::Pawn => PAWN_VALUE,
        PieceType::Knight => KNIGHT_VALUE,
        PieceType::Bishop => BISHOP_VALUE,
        PieceType::Rook => ROOK_VALUE,
        PieceType::Queen => QUEEN_VALUE,
        PieceType::King => KING_VALUE,
    }
}

fn table_value(pos: &Position, piece_type: PieceType, color: Color, sq: Square) -> i32 {
    let index = match color {
        Color::White => sq.index() ^ 56,
        Color::Black => sq.index(),
    };
    match piece_type {
        PieceType::Pawn => PAWN_TABLE[index],
        PieceType::Knight => KNIGHT_TABLE[index],
        PieceType::Bishop => BISHOP_TABLE[index],
        PieceType::Rook => ROOK_TABLE[index],
        PieceType::Queen => QUEEN_TABLE[index],
        PieceType::King => {
            if is_endgame(pos) {
                KING_ENDGAME_TABLE[index]
            } else {
                KING_MIDDLEGAME_TABLE[index]
            }
        }
    }
}

/// Endgame when the queens are gone, or both remain with at most one
/// minor piece left, which switches the king table from shelter-seeking
/// to centralising.
fn is_endgame(pos: &Position) -> bool {
    let mut queens = 0;
    let mut minors = 0;
    for sq in Square::all() {
        match pos.piece_at(sq).piece_type() {
            Some(PieceType::Queen) => queens += 1,
            Some(PieceType::Knight | PieceType::Bishop) => minors += 1,
            _ => {}
        }
    }
    queens == 0 || (queens == 2 && minors <= 1)
}

fn king_safety(pos: &Position, color: Color) -> i32 {
    let king = pos.king_square(color);
    let mut safety = 0;

    let on_back_ranks = match color {
        Color::White => king.rank() <= 1,
        Color::Black => king.rank() >= 6,
    };
    if on_back_ranks {
        safety += pawn_shield(pos, king, color) * PAWN_SHIELD_BONUS;
    }

    if !is_endgame(pos) {
        let centralised = (2..=5).contains(&king.file()) && (2..=5).contains(&king.rank());
        if centralised {
            safety -= CENTRAL_KING_PENALTY;
        }
    }

    safety
}

fn pawn_shield(pos: &Position, king: Square, color: Color) -> i32 {
    let forward = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    let mut count = 0;
    for file_delta in -1..=1 {
        if let Some(sq) = king.offset(file_delta, forward) {
            let piece = pos.piece_at(sq);
            if piece.is_color(color) && piece.piece_type() == Some(PieceType::Pawn) {
                count += 1;
            }
        }
    }
    count
}

fn pawn_structure(pos: &Position, color: Color) -> i32 {
    let mut score = 0;
    let mut file_counts = [0i32; 8];
    for sq in Square::all() {
        let piece = pos.piece_at(sq);
        if piece.is_color(color) && piece.piece_type() == Some(PieceType::Pawn) {
            file_counts[sq.file() as usize] += 1;
        }
    }

    for count in file_counts {
        if count > 1 {
            score -= (count - 1) * DOUBLED_PAWN_PENALTY;
        }
    }

    for sq in Square::all() {
        let piece = pos.piece_at(sq);
        if piece.is_color(color)
            && piece.piece_type() == Some(PieceType::Pawn)
            && is_passed_pawn(pos, sq, color)
        {
            score += PASSED_PAWN_BONUS;
        }
    }

    score
}

/// A pawn is passed when no enemy pawn stands ahead of it on its own or
/// an adjacent file.
fn is_passed_pawn(pos: &Position, pawn: Square, color: Color) -> bool {
    let forward: i8 = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    for file_delta in -1..=1 {
        let mut current = pawn;
        while let Some(ahead) = current.offset(0, forward) {
            current = ahead;
            if let Some(sq) = current.offset(file_delta, 0) {
                let piece = pos.piece_at(sq);
                if piece.is_color(color.opposite()) && piece.piece_type() == Some(PieceType::Pawn)
                {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_is_balanced() {
        let pos = Position::new_game();
        // Mobility is the only asymmetric term and favors the mover.
        let white_view = evaluate(&pos, Color::White);
        let black_view = evaluate(&pos, Color::Black);
        assert_eq!(white_view, -black_view);
        assert!(white_view > 0);
    }

    #[test]
    fn material_edge_dominates() {
        // White is up a queen.
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert!(evaluate(&pos, Color::White) > QUEEN_VALUE / 2);
        assert!(evaluate(&pos, Color::Black) < -QUEEN_VALUE / 2);
    }

    #[test]
    fn endgame_detection() {
        assert!(!is_endgame(&Position::new_game()));
        let pos = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert!(is_endgame(&pos));
    }

    #[test]
    fn best_move_takes_the_hanging_queen() {
        // Black queen undefended on d4, white rook on d1.
        let pos = Position::from_fen("4k3/8/8/8/3q4/8/8/3RK3 w - - 0 1").unwrap();
        let m = best_move(&pos, 2).unwrap();
        assert_eq!(m.to.to_string(), "d4");
        assert!(m.is_capture);
    }

    #[test]
    fn best_move_finds_mate_in_one() {
        // Back-rank mate: Ra8#.
        let pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let m = best_move(&pos, 3).unwrap();
        let next = pos.apply_move(m);
        assert_eq!(next.status(), GameStatus::Checkmate);
    }

    #[test]
    fn no_move_at_terminal_positions() {
        // Fool's mate final position, white to move with no legal reply.
        let pos =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert_eq!(pos.status(), GameStatus::Checkmate);
        assert_eq!(best_move(&pos, 4), None);
    }

    #[test]
    fn passed_pawn_detection() {
        let pos = Position::from_fen("4k3/8/8/8/2p5/8/P7/4K3 w - - 0 1").unwrap();
        // The a-pawn's path is clear of the c-pawn's cover.
        assert!(is_passed_pawn(&pos, "a2".parse().unwrap(), Color::White));
        // The black c-pawn faces no white pawn ahead of it either.
        assert!(is_passed_pawn(&pos, "c4".parse().unwrap(), Color::Black));
    }
}

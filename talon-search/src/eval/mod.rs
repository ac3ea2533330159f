//! Static evaluation: combines material, piece-square tables, mobility,
//! pawn structure, and king safety into one side-to-move-relative score.

pub mod king_safety;
pub mod material;
pub mod mobility;
pub mod pawns;
pub mod phase;
pub mod pst;
pub mod score;

use talon_core::{Board, Color, PieceKind};

use self::material::material;
use self::mobility::evaluate_mobility;
use self::pawns::evaluate_pawns;
use self::phase::{MAX_PHASE, game_phase};
use self::pst::pst_value;
use self::score::Score;
use king_safety::evaluate_king_safety;

fn piece_square_tables(board: &Board) -> Score {
    let mut total = Score::ZERO;
    for color in Color::ALL {
        for kind in PieceKind::ALL {
            for sq in board.pieces(kind) & board.side(color) {
                let value = pst_value(kind, color, sq);
                total += if color == Color::White { value } else { -value };
            }
        }
    }
    total
}

/// Evaluate `board` from the side-to-move's perspective, in centipawns.
///
/// Combines material, piece-square tables, mobility, pawn structure, and
/// king safety, each tapered between middlegame and endgame weights by
/// [`game_phase`].
pub fn evaluate(board: &Board) -> i32 {
    let score = material(board)
        + piece_square_tables(board)
        + evaluate_mobility(board)
        + evaluate_pawns(board)
        + evaluate_king_safety(board);

    let phase = game_phase(board);
    let tapered = (score.mg() as i32 * phase + score.eg() as i32 * (MAX_PHASE - phase)) / MAX_PHASE;

    match board.side_to_move() {
        Color::White => tapered,
        Color::Black => -tapered,
    }
}

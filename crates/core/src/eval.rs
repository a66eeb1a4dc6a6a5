//! Static evaluation: material, piece-square tables, mobility and a pawn
//! shield term for king safety. Scores are in centipawns.

use crate::game::{Board, Color, PieceKind};

const MOBILITY_WEIGHT: i32 = 4;
const PAWN_SHIELD_WEIGHT: i32 = 10;

pub const fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        // Both sides always have one
        PieceKind::King => 0,
    }
}

// Tables are written from white's side with rank 8 on the first row.
type Table = [[i32; 8]; 8];

#[rustfmt::skip]
const PAWN_TABLE: Table = [
    [ 0,  0,   0,   0,   0,   0,  0,  0],
    [50, 50,  50,  50,  50,  50, 50, 50],
    [10, 10,  20,  30,  30,  20, 10, 10],
    [ 5,  5,  10,  25,  25,  10,  5,  5],
    [ 0,  0,   0,  20,  20,   0,  0,  0],
    [ 5, -5, -10,   0,   0, -10, -5,  5],
    [ 5, 10,  10, -20, -20,  10, 10,  5],
    [ 0,  0,   0,   0,   0,   0,  0,  0],
];

#[rustfmt::skip]
const KNIGHT_TABLE: Table = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20,   0,   0,   0,   0, -20, -40],
    [-30,   0,  10,  15,  15,  10,   0, -30],
    [-30,   5,  15,  20,  20,  15,   5, -30],
    [-30,   0,  15,  20,  20,  15,   0, -30],
    [-30,   5,  10,  15,  15,  10,   5, -30],
    [-40, -20,   0,   5,   5,   0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

#[rustfmt::skip]
const BISHOP_TABLE: Table = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10,   0,   0,   0,   0,   0,   0, -10],
    [-10,   0,   5,  10,  10,   5,   0, -10],
    [-10,   5,   5,  10,  10,   5,   5, -10],
    [-10,   0,  10,  10,  10,  10,   0, -10],
    [-10,  10,  10,  10,  10,  10,  10, -10],
    [-10,   5,   0,   0,   0,   0,   5, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

#[rustfmt::skip]
const ROOK_TABLE: Table = [
    [ 0,  0,  0,  0,  0,  0,  0,  0],
    [ 5, 10, 10, 10, 10, 10, 10,  5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [ 0,  0,  0,  5,  5,  0,  0,  0],
];

#[rustfmt::skip]
const QUEEN_TABLE: Table = [
    [-20, -10, -10, -5, -5, -10, -10, -20],
    [-10,   0,   0,  0,  0,   0,   0, -10],
    [-10,   0,   5,  5,  5,   5,   0, -10],
    [ -5,   0,   5,  5,  5,   5,   0,  -5],
    [  0,   0,   5,  5,  5,   5,   0,  -5],
    [-10,   5,   5,  5,  5,   5,   0, -10],
    [-10,   0,   5,  0,  0,   0,   0, -10],
    [-20, -10, -10, -5, -5, -10, -10, -20],
];

#[rustfmt::skip]
const KING_TABLE: Table = [
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [ 20,  20,   0,   0,   0,   0,  20,  20],
    [ 20,  30,  10,   0,   0,  10,  30,  20],
];

fn table(kind: PieceKind) -> &'static Table {
    match kind {
        PieceKind::Pawn => &PAWN_TABLE,
        PieceKind::Knight => &KNIGHT_TABLE,
        PieceKind::Bishop => &BISHOP_TABLE,
        PieceKind::Rook => &ROOK_TABLE,
        PieceKind::Queen => &QUEEN_TABLE,
        PieceKind::King => &KING_TABLE,
    }
}

/// Score with white positive, independent of who is to move.
pub fn evaluate_white(board: &Board) -> i32 {
    let mut score = 0;
    let mut moves = Vec::with_capacity(32);

    for (pos, piece) in board.pieces() {
        let row = match piece.color {
            Color::White => 7 - pos.rank as usize,
            Color::Black => pos.rank as usize,
        };

        let mut value =
            piece_value(piece.kind) + table(piece.kind)[row][pos.file as usize];

        match piece.kind {
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
                moves.clear();
                board.generate_moves_at(pos, &mut moves, false);
                value += MOBILITY_WEIGHT * moves.len() as i32;
            }
            PieceKind::King => {
                value += PAWN_SHIELD_WEIGHT * pawn_shield(board, piece.color);
            }
            PieceKind::Pawn => {}
        }

        score += match piece.color {
            Color::White => value,
            Color::Black => -value,
        };
    }

    score
}

/// Friendly pawns on the three squares directly in front of the king.
fn pawn_shield(board: &Board, color: Color) -> i32 {
    let Some(king) = board.king_pos(color) else {
        return 0;
    };

    (-1..=1)
        .filter_map(|df| king.add_offset((df, color.pawn_direction())))
        .filter(|&pos| board[pos].is_some_and(|p| p.is(color, PieceKind::Pawn)))
        .count() as i32
}

/// Score from the side to move's point of view.
pub fn evaluate(board: &Board) -> i32 {
    match board.side_to_move() {
        Color::White => evaluate_white(board),
        Color::Black => -evaluate_white(board),
    }
}

#[cfg(test)]
mod tests {
    use crate::game::{Board, BoardPos, Move};

    use super::*;

    #[test]
    fn start_position_is_balanced() {
        assert_eq!(evaluate_white(&Board::default()), 0);
        assert_eq!(evaluate(&Board::default()), 0);
    }

    #[test]
    fn mirrored_position_negates_score() {
        let fens = [
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/8/8/8/8/8/3PPP2/4K3 b - - 0 1",
        ];

        for fen in fens {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(evaluate(&board.mirrored()), -evaluate(&board), "{fen}");
        }

        // Three extra pawns cannot net out to zero
        let lopsided = Board::from_fen(fens[3]).unwrap();
        assert!(evaluate(&lopsided) < 0);
    }

    #[test]
    fn winning_material_raises_score() {
        // White queen takes an undefended knight
        let mut board = Board::from_fen("4k3/8/8/3n4/8/8/3Q4/4K3 w - - 0 1").unwrap();
        let before = evaluate_white(&board);
        board.apply(&Move::new_capture(BoardPos::new(3, 1), BoardPos::new(3, 4)));
        assert!(evaluate_white(&board) > before);
    }

    #[test]
    fn pawn_shield_counts_front_pawns() {
        let board = Board::from_fen("4k3/8/8/8/8/8/3PPP2/4K3 w - - 0 1").unwrap();
        assert_eq!(pawn_shield(&board, Color::White), 3);
        assert_eq!(pawn_shield(&board, Color::Black), 0);
    }
}

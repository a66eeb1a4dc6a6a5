//! Reading moves written by people: coordinate notation (`e2e4`, `e7e8q`)
//! and standard algebraic notation (`Nf3`, `exd5`, `e8=Q+`, `O-O`).

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, one_of},
    combinator::{all_consuming, map, opt, value},
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::{
    error::IllegalMoveError,
    game::{Board, BoardPos, Move, PieceKind},
};

#[derive(Debug, PartialEq, Eq, Clone)]
enum MoveText {
    Coordinate {
        from: BoardPos,
        to: BoardPos,
        promotion: Option<PieceKind>,
    },
    CastleKingSide,
    CastleQueenSide,
    PieceMove {
        piece: PieceKind,
        to: BoardPos,
        disambiguation: Disambiguation,
        promotion: Option<PieceKind>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
struct Disambiguation {
    file: Option<u8>,
    rank: Option<u8>,
}

fn file(i: &str) -> IResult<&str, u8> {
    map(one_of("abcdefgh"), |c| c as u8 - b'a')(i)
}

fn rank(i: &str) -> IResult<&str, u8> {
    map(one_of("12345678"), |c| c as u8 - b'1')(i)
}

fn board_pos(i: &str) -> IResult<&str, BoardPos> {
    map(pair(file, rank), |(file, rank)| BoardPos { file, rank })(i)
}

fn piece(i: &str) -> IResult<&str, PieceKind> {
    alt((
        value(PieceKind::Bishop, char('B')),
        value(PieceKind::King, char('K')),
        value(PieceKind::Knight, char('N')),
        value(PieceKind::Pawn, char('P')),
        value(PieceKind::Queen, char('Q')),
        value(PieceKind::Rook, char('R')),
    ))(i)
}

fn promotion_piece(i: &str) -> IResult<&str, PieceKind> {
    alt((
        value(PieceKind::Queen, one_of("Qq")),
        value(PieceKind::Rook, one_of("Rr")),
        value(PieceKind::Bishop, one_of("Bb")),
        value(PieceKind::Knight, one_of("Nn")),
    ))(i)
}

fn parse_disambiguation(i: &str) -> IResult<&str, Disambiguation> {
    map(pair(opt(file), opt(rank)), |(file, rank)| Disambiguation {
        file,
        rank,
    })(i)
}

/// Check, mate and annotation glyphs carry no information for matching.
fn suffix(i: &str) -> IResult<&str, &str> {
    take_while(|c| "+#!?".contains(c))(i)
}

fn coordinate_move(i: &str) -> IResult<&str, MoveText> {
    map(
        tuple((
            board_pos,
            board_pos,
            opt(preceded(opt(char('=')), promotion_piece)),
        )),
        |(from, to, promotion)| MoveText::Coordinate {
            from,
            to,
            promotion,
        },
    )(i)
}

fn san_move(i: &str) -> IResult<&str, MoveText> {
    let promotion = || opt(preceded(opt(char('=')), promotion_piece));

    alt((
        value(MoveText::CastleQueenSide, alt((tag("O-O-O"), tag("0-0-0")))),
        value(MoveText::CastleKingSide, alt((tag("O-O"), tag("0-0")))),
        // The disambiguation parser greedily eats the destination square of
        // plain moves like `Nf3`, so fall back to a form without it
        map(
            tuple((
                opt(piece),
                parse_disambiguation,
                opt(char('x')),
                board_pos,
                promotion(),
            )),
            |(p, disambiguation, _, to, promotion)| MoveText::PieceMove {
                piece: p.unwrap_or(PieceKind::Pawn),
                to,
                disambiguation,
                promotion,
            },
        ),
        map(
            tuple((opt(piece), opt(char('x')), board_pos, promotion())),
            |(p, _, to, promotion)| MoveText::PieceMove {
                piece: p.unwrap_or(PieceKind::Pawn),
                to,
                disambiguation: Disambiguation {
                    file: None,
                    rank: None,
                },
                promotion,
            },
        ),
    ))(i)
}

fn move_text(i: &str) -> IResult<&str, MoveText> {
    all_consuming(terminated(alt((coordinate_move, san_move)), suffix))(i)
}

impl MoveText {
    fn matches(&self, board: &Board, m: &Move) -> bool {
        match *self {
            MoveText::Coordinate {
                from,
                to,
                promotion,
            } => m.from_pos == from && m.to_pos == to && m.promotion == promotion,
            MoveText::CastleKingSide => m.flags.castling && m.to_pos.file == 6,
            MoveText::CastleQueenSide => m.flags.castling && m.to_pos.file == 2,
            MoveText::PieceMove {
                piece,
                to,
                disambiguation,
                promotion,
            } => {
                board[m.from_pos].is_some_and(|p| p.kind == piece)
                    && !m.flags.castling
                    && m.to_pos == to
                    && m.promotion == promotion
                    && disambiguation.file.map_or(true, |f| m.from_pos.file == f)
                    && disambiguation.rank.map_or(true, |r| m.from_pos.rank == r)
            }
        }
    }
}

/// Resolves `text` to exactly one of `legal_moves`.
pub fn parse_move(board: &Board, legal_moves: &[Move], text: &str) -> Result<Move, IllegalMoveError> {
    let (_, parsed) =
        move_text(text.trim()).map_err(|_| IllegalMoveError::Unparseable(text.to_string()))?;

    let mut candidates = legal_moves.iter().filter(|m| parsed.matches(board, m));

    match (candidates.next(), candidates.next()) {
        (Some(&m), None) => Ok(m),
        (None, _) => Err(IllegalMoveError::NoMatch(text.to_string())),
        (Some(_), Some(_)) => Err(IllegalMoveError::Ambiguous(text.to_string())),
    }
}

//! Reading and writing the six-field ASCII position notation.

use nom::{
    branch::alt,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map, map_opt, opt, value, verify},
    multi::{many1, separated_list1},
    sequence::{pair, tuple},
    IResult,
};

use crate::{
    error::MalformedPositionError,
    game::{Board, BoardPos, CastlingRights, Color, Piece, PieceKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RankToken {
    Piece(Piece),
    Gap(u8),
}

fn rank_token(i: &str) -> IResult<&str, RankToken> {
    alt((
        map(one_of("12345678"), |c| RankToken::Gap(c as u8 - b'0')),
        map_opt(one_of("KQRBNPkqrbnp"), |c| {
            Piece::from_char(c).map(RankToken::Piece)
        }),
    ))(i)
}

fn placement(i: &str) -> IResult<&str, Vec<Vec<RankToken>>> {
    separated_list1(char('/'), many1(rank_token))(i)
}

fn side_to_move(i: &str) -> IResult<&str, Color> {
    alt((value(Color::White, char('w')), value(Color::Black, char('b'))))(i)
}

fn castling(i: &str) -> IResult<&str, CastlingRights> {
    alt((
        value(CastlingRights::NONE, char('-')),
        // Canonical order only, so the field writes back unchanged
        map_opt(
            tuple((opt(char('K')), opt(char('Q')), opt(char('k')), opt(char('q')))),
            |(wk, wq, bk, bq)| {
                let rights = CastlingRights {
                    white_king: wk.is_some(),
                    white_queen: wq.is_some(),
                    black_king: bk.is_some(),
                    black_queen: bq.is_some(),
                };
                rights.any().then_some(rights)
            },
        ),
    ))(i)
}

fn square(i: &str) -> IResult<&str, BoardPos> {
    map(pair(one_of("abcdefgh"), one_of("12345678")), |(f, r)| {
        BoardPos::new(f as u8 - b'a', r as u8 - b'1')
    })(i)
}

fn en_passant(i: &str) -> IResult<&str, Option<BoardPos>> {
    alt((value(None, char('-')), map(square, Some)))(i)
}

/// Decimal without leading zeros.
fn counter(i: &str) -> IResult<&str, u32> {
    map_opt(
        verify(digit1, |s: &str| s == "0" || !s.starts_with('0')),
        |s: &str| s.parse().ok(),
    )(i)
}

fn parse_field<'a, T>(
    field: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, T>,
) -> Option<T> {
    all_consuming(parser)(field).ok().map(|(_, t)| t)
}

fn build_ranks(
    text: &str,
    ranks: Vec<Vec<RankToken>>,
) -> Result<[[Option<Piece>; 8]; 8], MalformedPositionError> {
    let bad = || MalformedPositionError::Placement(text.to_string());

    if ranks.len() != 8 {
        return Err(bad());
    }

    let mut pieces = [[None; 8]; 8];

    // The first rank listed is rank 8
    for (row, tokens) in ranks.into_iter().enumerate() {
        let rank = 7 - row;
        let mut file = 0usize;
        let mut last_was_gap = false;

        for token in tokens {
            match token {
                RankToken::Gap(n) => {
                    if last_was_gap {
                        return Err(bad());
                    }
                    file += n as usize;
                    last_was_gap = true;
                }
                RankToken::Piece(piece) => {
                    if file >= 8 {
                        return Err(bad());
                    }
                    pieces[rank][file] = Some(piece);
                    file += 1;
                    last_was_gap = false;
                }
            }
        }

        if file != 8 {
            return Err(bad());
        }
    }

    Ok(pieces)
}

impl Board {
    pub fn from_fen(fen: &str) -> Result<Board, MalformedPositionError> {
        let fields = fen.split_ascii_whitespace().collect::<Vec<_>>();
        let [placement_str, side_str, castling_str, en_passant_str, halfmove_str, fullmove_str] =
            fields.as_slice()
        else {
            return Err(MalformedPositionError::FieldCount(fields.len()));
        };

        let ranks = parse_field(placement_str, placement)
            .ok_or_else(|| MalformedPositionError::Placement(placement_str.to_string()))?;
        let pieces = build_ranks(placement_str, ranks)?;

        let side = parse_field(side_str, side_to_move)
            .ok_or_else(|| MalformedPositionError::SideToMove(side_str.to_string()))?;

        let castling_rights = parse_field(castling_str, castling)
            .ok_or_else(|| MalformedPositionError::Castling(castling_str.to_string()))?;

        let en_passant_target = parse_field(en_passant_str, en_passant)
            .ok_or_else(|| MalformedPositionError::EnPassant(en_passant_str.to_string()))?;

        let halfmoves = parse_field(halfmove_str, counter).ok_or_else(|| {
            MalformedPositionError::Counter {
                field: "half-move clock",
                value: halfmove_str.to_string(),
            }
        })?;

        let fullmoves = parse_field(fullmove_str, counter)
            .filter(|&n| n > 0)
            .ok_or_else(|| MalformedPositionError::Counter {
                field: "full-move number",
                value: fullmove_str.to_string(),
            })?;

        let board = Board::from_parts(
            pieces,
            side,
            castling_rights,
            en_passant_target,
            halfmoves,
            fullmoves,
        );

        board.validate()?;

        Ok(board)
    }

    /// Rejects positions that cannot arise in play.
    fn validate(&self) -> Result<(), MalformedPositionError> {
        for color in [Color::White, Color::Black] {
            let count = self
                .pieces()
                .filter(|(_, p)| p.is(color, PieceKind::King))
                .count();
            if count != 1 {
                return Err(MalformedPositionError::KingCount { color, count });
            }
        }

        if let Some((pos, _)) = self
            .pieces()
            .find(|(pos, p)| p.kind == PieceKind::Pawn && (pos.rank == 0 || pos.rank == 7))
        {
            return Err(MalformedPositionError::PawnOnBackRank(pos));
        }

        if let Some(target) = self.en_passant() {
            // Target sits behind an enemy pawn that just made a double push
            let mover = self.side_to_move();
            let expected_rank = if mover.is_white() { 5 } else { 2 };
            let pushed = target.add_offset((0, -mover.pawn_direction()));
            let origin = target.add_offset((0, mover.pawn_direction()));

            let plausible = target.rank == expected_rank
                && self[target].is_none()
                && origin.is_some_and(|pos| self[pos].is_none())
                && pushed
                    .and_then(|pos| self[pos])
                    .is_some_and(|p| p.is(!mover, PieceKind::Pawn));

            if !plausible {
                return Err(MalformedPositionError::EnPassant(target.to_string()));
            }
        }

        let waiting = !self.side_to_move();
        if let Some(king) = self.king_pos(waiting) {
            if self.is_square_attacked(king, self.side_to_move()) {
                return Err(MalformedPositionError::OpponentInCheck);
            }
        }

        Ok(())
    }

    pub fn to_fen(&self) -> String {
        let position = (0..8)
            .rev()
            .map(|rank| {
                let mut rank_str = String::new();

                let mut consecutive_empty = 0;
                for file in 0..8 {
                    match self[BoardPos::new(file, rank)] {
                        None => consecutive_empty += 1,
                        Some(piece) => {
                            if consecutive_empty > 0 {
                                rank_str.push_str(&consecutive_empty.to_string());
                                consecutive_empty = 0;
                            }

                            rank_str.push(piece.to_char())
                        }
                    }
                }

                if consecutive_empty > 0 {
                    rank_str.push_str(&consecutive_empty.to_string());
                }

                rank_str
            })
            .collect::<Vec<_>>()
            .join("/");

        let side_to_move = if self.white_to_move() { "w" } else { "b" };
        let castling = self.castling().to_fen();
        let en_passant = self
            .en_passant()
            .map_or("-".to_string(), |pos| pos.to_string());

        format!(
            "{position} {side_to_move} {castling} {en_passant} {} {}",
            self.halfmoves(),
            self.fullmoves()
        )
    }
}

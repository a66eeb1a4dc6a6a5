//! Error types surfaced by the rules engine.
//!
//! Every error here is recoverable: callers decide whether a rejected move or
//! a bad position string is worth reporting.

use thiserror::Error;

use crate::game::{BoardPos, Color, Move};

/// A move was rejected because it is not in the current legal-move set, or
/// because its text could not be understood.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IllegalMoveError {
    #[error("move {0} is not legal in this position")]
    NotLegal(Move),

    #[error("cannot parse move `{0}`")]
    Unparseable(String),

    #[error("move `{0}` does not match any legal move")]
    NoMatch(String),

    #[error("move `{0}` matches more than one legal move")]
    Ambiguous(String),
}

/// A position string failed to parse or describes an impossible position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedPositionError {
    #[error("expected 6 fields in position string, found {0}")]
    FieldCount(usize),

    #[error("invalid piece placement `{0}`")]
    Placement(String),

    #[error("invalid side to move `{0}`")]
    SideToMove(String),

    #[error("invalid castling rights `{0}`")]
    Castling(String),

    #[error("invalid en passant target `{0}`")]
    EnPassant(String),

    #[error("invalid {field} `{value}`")]
    Counter { field: &'static str, value: String },

    #[error("invalid square `{0}`")]
    Square(String),

    #[error("{color:?} has {count} kings")]
    KingCount { color: Color, count: usize },

    #[error("pawn on back rank at {0}")]
    PawnOnBackRank(BoardPos),

    #[error("the side not to move is in check")]
    OpponentInCheck,
}

/// `undo` was called on a game with no moves played.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no move to undo")]
pub struct NoHistoryError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error(transparent)]
    IllegalMove(#[from] IllegalMoveError),

    #[error(transparent)]
    MalformedPosition(#[from] MalformedPositionError),

    #[error(transparent)]
    NoHistory(#[from] NoHistoryError),
}

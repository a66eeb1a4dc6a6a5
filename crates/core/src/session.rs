use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use log::warn;

use crate::{
    error::{IllegalMoveError, MalformedPositionError, NoHistoryError},
    game::{Board, Move, UndoState},
    notation,
    search::{SearchConfig, SearchResult, Searcher},
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum GameStatus {
    InProgress,
    Checkmate,
    Stalemate,
    Draw(DrawReason),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DrawReason {
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::InProgress
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryEntry {
    mv: Move,
    undo: UndoState,
    /// Key of the position the move was played from
    key: u64,
}

/// A board together with the moves that led to it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Game {
    board: Board,
    history: Vec<HistoryEntry>,
}

/// Positions only differ by their en-passant target when the capture is
/// actually playable.
fn position_key(board: &Board) -> u64 {
    let mut hasher = DefaultHasher::new();
    if board.en_passant().is_some() && !board.can_capture_en_passant() {
        board.without_en_passant().hash(&mut hasher);
    } else {
        board.hash(&mut hasher);
    }
    hasher.finish()
}

impl Game {
    /// The standard starting position.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(fen: &str) -> Result<Self, MalformedPositionError> {
        Ok(Self::from_board(Board::from_fen(fen)?))
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            history: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Moves played so far, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Move> + '_ {
        self.history.iter().map(|entry| &entry.mv)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.board.generate_legal_moves()
    }

    pub fn is_in_check(&self) -> bool {
        self.board.in_check()
    }

    pub fn status(&self) -> GameStatus {
        self.status_with(&self.legal_moves())
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_over()
    }

    /// Status given the already generated legal moves of this position.
    pub(crate) fn status_with(&self, legal_moves: &[Move]) -> GameStatus {
        if legal_moves.is_empty() {
            return if self.board.in_check() {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            };
        }

        if self.board.halfmoves() >= 100 {
            return GameStatus::Draw(DrawReason::FiftyMoveRule);
        }

        if self.repetitions() >= 3 {
            return GameStatus::Draw(DrawReason::ThreefoldRepetition);
        }

        if self.board.has_insufficient_material() {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }

        GameStatus::InProgress
    }

    /// How often the current position has occurred, this time included.
    pub fn repetitions(&self) -> usize {
        let key = position_key(&self.board);

        // Nothing before the last capture or pawn move can repeat
        1 + self
            .history
            .iter()
            .rev()
            .take(self.board.halfmoves() as usize)
            .filter(|entry| entry.key == key)
            .count()
    }

    /// Plays `m` if it is legal here. Only squares and promotion are
    /// compared, so a move read from text is accepted without flags.
    pub fn make_move(&mut self, m: &Move) -> Result<(), IllegalMoveError> {
        let legal = self
            .legal_moves()
            .into_iter()
            .find(|candidate| candidate.same_squares(m));

        match legal {
            Some(legal) => {
                self.push_move(legal);
                Ok(())
            }
            None => {
                warn!("rejected illegal move {m} in {}", self.board.to_fen());
                Err(IllegalMoveError::NotLegal(*m))
            }
        }
    }

    /// Plays a move written in coordinate or standard algebraic notation.
    pub fn make_move_str(&mut self, text: &str) -> Result<Move, IllegalMoveError> {
        let legal = self.legal_moves();
        let m = notation::parse_move(&self.board, &legal, text).map_err(|e| {
            warn!("rejected move `{text}`: {e}");
            e
        })?;

        self.push_move(m);
        Ok(m)
    }

    pub fn undo(&mut self) -> Result<Move, NoHistoryError> {
        self.pop_move().ok_or(NoHistoryError)
    }

    /// Searches the current position to `max_depth` plies.
    pub fn best_move(&self, max_depth: u32) -> SearchResult {
        Searcher::new(SearchConfig {
            max_depth,
            ..Default::default()
        })
        .search(self)
    }

    pub fn to_position_string(&self) -> String {
        self.board.to_fen()
    }

    /// Applies a move already known to be legal.
    pub(crate) fn push_move(&mut self, m: Move) {
        let key = position_key(&self.board);
        let undo = self.board.apply(&m);
        self.history.push(HistoryEntry { mv: m, undo, key });
    }

    pub(crate) fn pop_move(&mut self) -> Option<Move> {
        let entry = self.history.pop()?;
        self.board.undo(&entry.mv, entry.undo);
        Some(entry.mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repetition_is_counted_from_history() {
        let mut game = Game::new();
        for _ in 0..2 {
            for m in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                game.make_move_str(m).unwrap();
            }
        }

        assert_eq!(game.repetitions(), 3);
        assert_eq!(
            game.status(),
            GameStatus::Draw(DrawReason::ThreefoldRepetition)
        );

        game.undo().unwrap();
        assert_eq!(game.status(), GameStatus::InProgress);
    }

    #[test]
    fn fifty_move_rule() {
        let game = Game::from_position("4k3/8/8/8/8/8/4P3/R3K3 w - - 100 80").unwrap();
        assert_eq!(game.status(), GameStatus::Draw(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn mate_beats_fifty_move_rule() {
        let game = Game::from_position("R5k1/5ppp/8/8/8/8/8/6K1 b - - 100 80").unwrap();
        assert_eq!(game.status(), GameStatus::Checkmate);
    }

    #[test]
    fn bare_kings_are_a_draw() {
        let game = Game::from_position("8/8/4k3/8/8/4K3/8/8 w - - 0 1").unwrap();
        assert_eq!(
            game.status(),
            GameStatus::Draw(DrawReason::InsufficientMaterial)
        );
        assert!(game.is_game_over());
    }
}

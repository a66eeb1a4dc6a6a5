use error::MalformedPositionError;
use search::SearchResult;
use session::Game;

pub mod debug;
pub mod error;
pub mod eval;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod notation;
pub mod renderer;
pub mod search;
pub mod session;

/// Something that picks moves for the side to move.
pub trait Engine {
    fn name(&self) -> &str;

    fn best_move(&self, game: &Game) -> SearchResult;
}

/// A game at the standard starting position.
pub fn new_game() -> Game {
    Game::new()
}

pub fn from_position(fen: &str) -> Result<Game, MalformedPositionError> {
    Game::from_position(fen)
}

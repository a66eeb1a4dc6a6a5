use std::env;

use anyhow::{bail, Context, Result};
use chess_engine_core::{session::Game, Engine};
use log::info;
use minimax_bot::{Difficulty, MinimaxEngine};

const DEFAULT_MAX_PLIES: usize = 200;

/// selfplay [difficulty] [max plies] [fen]
///
/// The difficulty falls back to `CHESS_DIFFICULTY`, then medium.
fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);

    let difficulty = match args.next().or_else(|| env::var("CHESS_DIFFICULTY").ok()) {
        Some(text) => text.parse::<Difficulty>()?,
        None => Difficulty::default(),
    };

    let max_plies = match args.next() {
        Some(text) => text
            .parse::<usize>()
            .with_context(|| format!("invalid ply limit `{text}`"))?,
        None => DEFAULT_MAX_PLIES,
    };

    let mut game = match args.next() {
        Some(fen) => Game::from_position(&fen)
            .with_context(|| format!("invalid position `{fen}`"))?,
        None => Game::new(),
    };

    if args.next().is_some() {
        bail!("too many arguments, expected [difficulty] [max plies] [fen]");
    }

    let engine = MinimaxEngine::new(difficulty)
        .with_threads(std::thread::available_parallelism().map_or(1, |n| n.get()));
    info!("{} playing from {}", engine.name(), game.to_position_string());

    for ply in 1..=max_plies {
        let result = engine.best_move(&game);
        let Some(m) = result.best_move else {
            break;
        };

        game.make_move(&m)
            .with_context(|| format!("engine produced illegal move {m}"))?;
        info!("ply {ply}: {m} score {} nodes {}", result.score, result.nodes);
    }

    println!("{}", game.board());
    let moves = game
        .history()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    println!("Moves: {}", moves.join(" "));
    println!("Status: {:?}", game.status());

    Ok(())
}

//! Fixed-depth negamax search with alpha-beta pruning.
//!
//! The root keeps generation order, so among equally scored moves the first
//! one generated wins. Internal nodes try captures first, most valuable
//! victim first, which only affects how much gets pruned.

use std::{
    cmp::Reverse,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use log::debug;

use crate::{
    eval::{evaluate, piece_value},
    game::{Board, Move, PieceKind},
    session::{Game, GameStatus},
};

/// Score of being mated at the root. Mates further away score closer to zero.
pub const MATE_SCORE: i32 = 1_000_000;

const INFINITY: i32 = 2 * MATE_SCORE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies to search. Zero is treated as one.
    pub max_depth: u32,
    /// Worker threads the root moves are split across.
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            threads: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// `None` only when the game is already over; `status` says how.
    pub best_move: Option<Move>,
    /// From the side to move's point of view.
    pub score: i32,
    pub nodes: u64,
    pub depth: u32,
    pub status: GameStatus,
}

impl SearchResult {
    /// Plies until mate if the score is a forced mate, negative when the
    /// side to move is the one getting mated.
    pub fn mate_in(&self) -> Option<i32> {
        let distance = MATE_SCORE - self.score.abs();
        (distance <= MATE_SCORE / 2).then(|| distance * self.score.signum())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    Done(SearchResult),
}

pub struct Searcher {
    config: SearchConfig,
    state: SearchState,
    stop: Arc<AtomicBool>,
}

struct RootOutcome {
    /// Index into the root move list and its score
    best: Option<(usize, i32)>,
    nodes: u64,
}

impl Searcher {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            state: SearchState::Idle,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Setting the flag ends the running search between two sibling moves.
    /// The result then reflects only the root moves searched to completion.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Searches `game` without modifying it.
    pub fn search(&mut self, game: &Game) -> SearchResult {
        self.state = SearchState::Searching;
        let result = self.run(game);
        self.state = SearchState::Done(result.clone());
        result
    }

    fn run(&self, game: &Game) -> SearchResult {
        let depth = self.config.max_depth.max(1);
        let moves = game.legal_moves();
        let status = game.status_with(&moves);

        if status.is_over() {
            debug!("search skipped, game over: {status:?}");
            return SearchResult {
                best_move: None,
                score: if status == GameStatus::Checkmate {
                    -MATE_SCORE
                } else {
                    0
                },
                nodes: 1,
                depth,
                status,
            };
        }

        let threads = self.config.threads.clamp(1, moves.len());
        let outcome = if threads == 1 {
            let indices = (0..moves.len()).collect::<Vec<_>>();
            search_root(&mut game.clone(), &moves, &indices, depth, &self.stop)
        } else {
            self.run_parallel(game, &moves, depth, threads)
        };

        let (best_move, score) = match outcome.best {
            Some((index, score)) => (moves[index], score),
            // Stopped before any root move finished
            None => (moves[0], evaluate(game.board())),
        };

        debug!(
            "depth {depth} best {best_move} score {score} nodes {}",
            outcome.nodes
        );

        SearchResult {
            best_move: Some(best_move),
            score,
            nodes: outcome.nodes,
            depth,
            status,
        }
    }

    /// Deals root moves round-robin to scoped workers, each with its own copy
    /// of the game, and keeps the highest score, earliest move on ties.
    fn run_parallel(
        &self,
        game: &Game,
        moves: &[Move],
        depth: u32,
        threads: usize,
    ) -> RootOutcome {
        let outcomes = thread::scope(|scope| {
            let workers = (0..threads)
                .map(|worker| {
                    let indices = (worker..moves.len()).step_by(threads).collect::<Vec<_>>();
                    let mut local = game.clone();
                    let stop = &self.stop;
                    scope.spawn(move || search_root(&mut local, moves, &indices, depth, stop))
                })
                .collect::<Vec<_>>();

            workers
                .into_iter()
                .map(|worker| match worker.join() {
                    Ok(outcome) => outcome,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect::<Vec<_>>()
        });

        RootOutcome {
            best: outcomes
                .iter()
                .filter_map(|outcome| outcome.best)
                .max_by_key(|&(index, score)| (score, Reverse(index))),
            nodes: outcomes.iter().map(|outcome| outcome.nodes).sum(),
        }
    }
}

fn search_root(
    game: &mut Game,
    moves: &[Move],
    indices: &[usize],
    depth: u32,
    stop: &AtomicBool,
) -> RootOutcome {
    let mut alpha = -INFINITY;
    let mut best = None;
    let mut nodes = 1;

    for &index in indices {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        game.push_move(moves[index]);
        let score = -negamax(game, depth - 1, 1, -INFINITY, -alpha, &mut nodes, stop);
        game.pop_move();

        // A score from a subtree cut short by the stop flag is not trustworthy
        if stop.load(Ordering::Relaxed) {
            break;
        }

        if score > alpha {
            alpha = score;
            best = Some((index, score));
        }
    }

    RootOutcome { best, nodes }
}

fn negamax(
    game: &mut Game,
    depth: u32,
    ply: i32,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    stop: &AtomicBool,
) -> i32 {
    *nodes += 1;

    let mut moves = game.legal_moves();
    match game.status_with(&moves) {
        GameStatus::Checkmate => return -(MATE_SCORE - ply),
        GameStatus::Stalemate | GameStatus::Draw(_) => return 0,
        GameStatus::InProgress => {}
    }

    if depth == 0 {
        return evaluate(game.board());
    }

    order_moves(game.board(), &mut moves);

    let mut best_score = -INFINITY;

    for m in moves {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        game.push_move(m);
        let score = -negamax(game, depth - 1, ply + 1, -beta, -alpha, nodes, stop);
        game.pop_move();

        best_score = best_score.max(score);
        alpha = alpha.max(score);

        if alpha >= beta {
            break;
        }
    }

    if best_score == -INFINITY {
        // Stopped before the first move
        return evaluate(game.board());
    }

    best_score
}

/// Captures first, most valuable victim first; stable, so the rest keep
/// generation order.
fn order_moves(board: &Board, moves: &mut [Move]) {
    moves.sort_by_key(|m| {
        let victim = if m.flags.en_passant {
            Some(PieceKind::Pawn)
        } else {
            board[m.to_pos].map(|p| p.kind)
        };

        Reverse(victim.map_or(0, |kind| piece_value(kind) + 1))
    });
}

use std::{fmt, str::FromStr};

use chess_engine_core::{
    search::{SearchConfig, SearchResult, Searcher},
    session::Game,
    Engine,
};
use log::debug;
use thiserror::Error;

/// Named search depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub const fn depth(self) -> u32 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 3,
            Difficulty::Hard => 4,
            Difficulty::Expert => 5,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown difficulty `{0}`, expected easy, medium, hard, expert or a depth from 2 to 5")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    /// Accepts a name in any case, or the depth it stands for.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s) || d.depth().to_string() == s)
            .ok_or_else(|| UnknownDifficulty(s.to_string()))
    }
}

pub struct MinimaxEngine {
    name: String,
    config: SearchConfig,
}

impl MinimaxEngine {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            name: format!("minimax ({difficulty})"),
            config: SearchConfig {
                max_depth: difficulty.depth(),
                ..Default::default()
            },
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.threads = threads.max(1);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

impl Engine for MinimaxEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn best_move(&self, game: &Game) -> SearchResult {
        let result = Searcher::new(self.config).search(game);
        debug!("{} searched {} nodes", self.name, result.nodes);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_difficulty() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!(" easy ".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("5".parse::<Difficulty>(), Ok(Difficulty::Expert));
        assert_eq!(
            "6".parse::<Difficulty>(),
            Err(UnknownDifficulty("6".to_string()))
        );
    }

    #[test]
    fn difficulty_sets_depth() {
        for difficulty in Difficulty::ALL {
            let engine = MinimaxEngine::new(difficulty).with_threads(0);
            assert_eq!(engine.config().max_depth, difficulty.depth());
            assert_eq!(engine.config().threads, 1);
            assert_eq!(difficulty.to_string().parse::<Difficulty>(), Ok(difficulty));
        }
    }
}

#[cfg(test)]
mod search {
    use chess_engine_core::{
        search::{SearchConfig, Searcher, MATE_SCORE},
        session::{Game, GameStatus},
    };

    #[test]
    fn depth_one_takes_the_hanging_queen() {
        let game = Game::from_position("4k3/8/8/3q4/8/4N3/P7/4K3 w - - 0 1").unwrap();
        let result = game.best_move(1);

        assert_eq!(result.best_move.unwrap().to_string(), "e3d5");
        assert!(result.score > 0);
        assert_eq!(result.status, GameStatus::InProgress);
    }

    #[test]
    fn finds_back_rank_mate() {
        let game = Game::from_position("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();

        for depth in 1..=3 {
            let result = game.best_move(depth);
            assert_eq!(result.best_move.unwrap().to_string(), "a1a8", "depth {depth}");
            assert_eq!(result.score, MATE_SCORE - 1);
            assert_eq!(result.mate_in(), Some(1));
        }
    }

    #[test]
    fn search_is_deterministic() {
        let mut game = Game::new();
        game.make_move_str("e4").unwrap();
        game.make_move_str("e5").unwrap();

        let first = game.best_move(3);
        let second = game.best_move(3);
        assert_eq!(first, second);
    }

    #[test]
    fn threads_agree_with_single_thread() {
        let game = Game::from_position(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();

        let single = Searcher::new(SearchConfig {
            max_depth: 3,
            threads: 1,
        })
        .search(&game);

        for threads in [2, 4] {
            let parallel = Searcher::new(SearchConfig {
                max_depth: 3,
                threads,
            })
            .search(&game);

            assert_eq!(parallel.best_move, single.best_move, "{threads} threads");
            assert_eq!(parallel.score, single.score, "{threads} threads");
        }
    }

    #[test]
    fn search_leaves_game_untouched() {
        let mut game = Game::new();
        game.make_move_str("d4").unwrap();
        let before = game.clone();

        let result = game.best_move(3);
        assert_eq!(game, before);
        assert!(game.legal_moves().contains(&result.best_move.unwrap()));
    }

    #[test]
    fn no_move_when_drawn() {
        let game = Game::from_position("8/8/4k3/8/8/4K3/8/8 w - - 0 1").unwrap();
        let result = game.best_move(2);

        assert_eq!(result.best_move, None);
        assert_eq!(result.score, 0);
        assert!(result.status.is_over());
    }
}

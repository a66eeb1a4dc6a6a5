#[cfg(test)]
mod selfplay {
    use chess_engine_core::{session::Game, Engine};
    use minimax_bot::{Difficulty, MinimaxEngine};

    const PLIES: usize = 16;

    #[test]
    fn easy_game() {
        let bot = MinimaxEngine::new(Difficulty::Easy);
        let mut game = Game::new();

        for _ in 0..PLIES {
            let result = bot.best_move(&game);
            let Some(m) = result.best_move else {
                assert!(game.is_game_over());
                break;
            };

            assert!(game.legal_moves().contains(&m));
            game.make_move(&m).unwrap();
        }

        println!("{}", game.board());
        assert!(game.history().count() <= PLIES);
    }

    #[test]
    fn threaded_engine_mates() {
        let bot = MinimaxEngine::new(Difficulty::Medium).with_threads(2);
        let mut game = Game::from_position("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();

        let m = bot.best_move(&game).best_move.unwrap();
        game.make_move(&m).unwrap();
        assert_eq!(m.to_string(), "a1a8");
        assert_eq!(game.status(), chess_engine_core::session::GameStatus::Checkmate);
    }
}

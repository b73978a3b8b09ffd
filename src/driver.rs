//! Per-turn orchestration: keeps the game position in sync with the referee and runs the
//! configured search within the turn's budget.

use thiserror::Error;
use tracing::{debug, info};

use crate::alpha_beta::AlphaBetaSearcher;
use crate::board::Player;
use crate::boards::ultimate::{FullBoardRule, UltimateBoard};
use crate::config::{EngineConfig, Strategy};
use crate::evaluator::HeuristicEvaluator;
use crate::mcts::MonteCarloTreeSearch;
use crate::protocol::TurnInput;
use crate::random::RandomGenerator;
use crate::state::{BoardState, Move, MoveError};

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("opponent move {mv} is illegal in the tracked position")]
    IllegalOpponentMove {
        mv: Move,
        #[source]
        source: MoveError,
    },

    #[error("asked to move but there is no legal move")]
    NoLegalMoves,

    #[error("own move {mv} was rejected by the tracked position")]
    StateDiverged {
        mv: Move,
        #[source]
        source: MoveError,
    },
}

/// The game as seen by this process: the authoritative [`BoardState`] and the Monte Carlo
/// search's own [`UltimateBoard`], always updated together.
#[derive(Debug, Clone)]
pub struct GameSession {
    state: BoardState,
    mcts_board: UltimateBoard,
    turns_played: u32,
}

impl GameSession {
    pub fn new(full_board_rule: FullBoardRule) -> Self {
        Self {
            state: BoardState::new(),
            mcts_board: UltimateBoard::default().with_full_board_rule(full_board_rule),
            turns_played: 0,
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn mcts_board(&self) -> &UltimateBoard {
        &self.mcts_board
    }

    /// Number of moves this engine has played so far.
    pub fn turns_played(&self) -> u32 {
        self.turns_played
    }

    pub fn record_opponent_move(&mut self, mv: Move) -> Result<(), TurnError> {
        self.record(mv, Player::Other)
            .map_err(|source| TurnError::IllegalOpponentMove { mv, source })
    }

    pub fn record_own_move(&mut self, mv: Move) -> Result<(), TurnError> {
        self.record(mv, Player::Me)
            .map_err(|source| TurnError::StateDiverged { mv, source })?;
        self.turns_played += 1;
        Ok(())
    }

    fn record(&mut self, mv: Move, player: Player) -> Result<(), MoveError> {
        // validate against both positions before touching either
        let mut state = self.state.clone();
        state.apply_move(mv, player)?;
        let mut mcts_board = self.mcts_board.clone();
        mcts_board.apply(mv)?;

        self.state = state;
        self.mcts_board = mcts_board;
        Ok(())
    }
}

impl Default for GameSession {
    fn default() -> Self {
        GameSession::new(FullBoardRule::default())
    }
}

/// Plays one move per [`TurnInput`] with the configured strategy.
pub struct TurnDriver<K: RandomGenerator> {
    config: EngineConfig,
    searcher: AlphaBetaSearcher<HeuristicEvaluator>,
    session: GameSession,
    random: K,
}

impl<K: RandomGenerator> TurnDriver<K> {
    pub fn new(config: EngineConfig, random: K) -> Self {
        let searcher = AlphaBetaSearcher::new(
            HeuristicEvaluator::new(config.drawn_sub_boards),
            config.max_depth,
        );
        let session = GameSession::new(config.full_board_rule);
        Self {
            config,
            searcher,
            session,
            random,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Applies the opponent's move, searches, records and returns the engine's move.
    ///
    /// The referee's valid moves are the candidates. When the list is empty the tracked
    /// position's own legal moves are used instead.
    pub fn play_turn(&mut self, input: &TurnInput) -> Result<Move, TurnError> {
        if let Some(mv) = input.opponent_move {
            self.session.record_opponent_move(mv)?;
        }

        let candidates = if input.valid_moves.is_empty() {
            self.session.state.legal_moves()
        } else {
            input.valid_moves.clone()
        };
        if candidates.is_empty() {
            return Err(TurnError::NoLegalMoves);
        }

        let budget = self.config.budget.for_turn(self.session.turns_played);
        let chosen = match self.config.strategy {
            Strategy::AlphaBeta => {
                let report = self
                    .searcher
                    .search(&self.session.state, &candidates, Some(budget));
                debug!(
                    best_move = ?report.best_move,
                    score = ?report.score,
                    completed_depth = report.completed_depth,
                    nodes = report.nodes,
                    elapsed = ?report.elapsed,
                    "alpha-beta search finished"
                );
                report.best_move
            }
            Strategy::MonteCarlo => {
                let mut mcts =
                    MonteCarloTreeSearch::builder(self.session.mcts_board.rooted_at_current())
                        .with_random_generator(&mut self.random)
                        .with_exploration(self.config.exploration)
                        .build();
                let iterations = mcts.iterate_for(budget);
                info!(iterations, "MCTS iterations run: {iterations}");
                mcts.choose_move(&candidates)
            }
        };

        let mv = chosen.ok_or(TurnError::NoLegalMoves)?;
        self.session.record_own_move(mv)?;
        debug!(%mv, turn = self.session.turns_played, "move played");
        Ok(mv)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::board::GameOutcome;
    use crate::boards::ultimate::{Mark, Status};
    use crate::random::StandardRandomGenerator;

    fn quick_config(strategy: Strategy) -> EngineConfig {
        EngineConfig::default()
            .with_strategy(strategy)
            .with_max_depth(3)
            .with_budget(Duration::from_millis(60), Duration::from_millis(5))
    }

    fn driver(strategy: Strategy, seed: u64) -> TurnDriver<StandardRandomGenerator> {
        TurnDriver::new(quick_config(strategy), StandardRandomGenerator::seeded(seed))
    }

    fn all_cells() -> Vec<Move> {
        BoardState::new().legal_moves()
    }

    #[test]
    fn first_turn_on_an_empty_board() {
        for strategy in [Strategy::AlphaBeta, Strategy::MonteCarlo] {
            // arrange
            let mut driver = driver(strategy, 1);
            let input = TurnInput {
                opponent_move: None,
                valid_moves: all_cells(),
            };
            assert_eq!(input.valid_moves.len(), 81);

            // act
            let started = Instant::now();
            let mv = driver.play_turn(&input).unwrap();

            // assert
            assert!(mv.in_bounds(), "{strategy:?}");
            assert!(started.elapsed() < Duration::from_millis(60) + Duration::from_secs(2));
            assert_eq!(driver.session().turns_played(), 1);
            assert_eq!(driver.session().state().cell(mv), Some(Player::Me));
        }
    }

    #[test]
    fn opponent_center_move_forces_the_center_sub_board() {
        let mut session = GameSession::default();

        session.record_opponent_move(Move::new(4, 4)).unwrap();

        assert_eq!(session.state().sub_result(4), GameOutcome::InProgress);
        assert_eq!(session.state().forced_sub_board(), Some(4));
        let moves = session.state().legal_moves();
        assert_eq!(moves.len(), 8);
        assert!(moves.iter().all(|m| m.sub_board() == 4));
        assert!(!moves.contains(&Move::new(4, 4)));
        assert_eq!(session.mcts_board().forced_sub_board(), Some(4));
    }

    #[test]
    fn both_strategies_answer_inside_the_forced_sub_board() {
        for strategy in [Strategy::AlphaBeta, Strategy::MonteCarlo] {
            let mut driver = driver(strategy, 2);
            let mut referee = BoardState::new();
            referee.apply_move(Move::new(4, 4), Player::Other).unwrap();

            let mv = driver
                .play_turn(&TurnInput {
                    opponent_move: Some(Move::new(4, 4)),
                    valid_moves: referee.legal_moves(),
                })
                .unwrap();

            assert_eq!(mv.sub_board(), 4, "{strategy:?}");
            assert_ne!(mv, Move::new(4, 4));
        }
    }

    #[test]
    fn completed_line_wins_the_sub_board_immediately() {
        // me first; every opponent reply sends me back into sub-board 0
        let script = [
            (Player::Me, 4, 1),
            (Player::Other, 1, 0),
            (Player::Me, 0, 0),
            (Player::Other, 0, 4),
            (Player::Me, 4, 2),
            (Player::Other, 2, 0),
            (Player::Me, 0, 1),
            (Player::Other, 1, 4),
            (Player::Me, 4, 3),
            (Player::Other, 3, 0),
            (Player::Me, 0, 2),
        ];
        let mut session = GameSession::default();

        for (player, sub_board, local) in script {
            assert_eq!(session.state().sub_result(0), GameOutcome::InProgress);
            let mv = Move::from_sub_board(sub_board, local);
            match player {
                Player::Me => session.record_own_move(mv).unwrap(),
                Player::Other => session.record_opponent_move(mv).unwrap(),
            }
        }

        assert_eq!(session.state().sub_result(0), GameOutcome::Win);
        assert_eq!(session.state().sub_board(0).empty_cells().count(), 5);
        assert_eq!(session.mcts_board().sub_board_status(0), Status::Won(Mark::X));
        assert_eq!(session.state().forced_sub_board(), Some(2));
        assert_eq!(session.turns_played(), 6);
    }

    #[test]
    fn illegal_opponent_move_is_rejected_without_side_effects() {
        let mut session = GameSession::default();
        session.record_opponent_move(Move::new(4, 4)).unwrap();
        let before = session.clone();

        let err = session.record_opponent_move(Move::new(0, 0)).unwrap_err();

        assert!(matches!(
            err,
            TurnError::IllegalOpponentMove {
                source: MoveError::OutsideForcedSubBoard { forced: 4, .. },
                ..
            }
        ));
        assert_eq!(session.state(), before.state());
        assert_eq!(session.mcts_board(), before.mcts_board());
    }

    #[test]
    fn later_turns_use_the_short_budget() {
        let mut driver = TurnDriver::new(
            EngineConfig::default()
                .with_strategy(Strategy::MonteCarlo)
                .with_budget(Duration::from_millis(40), Duration::from_millis(1)),
            StandardRandomGenerator::seeded(3),
        );
        let mut referee = BoardState::new();

        let first = driver
            .play_turn(&TurnInput {
                opponent_move: None,
                valid_moves: referee.legal_moves(),
            })
            .unwrap();
        referee.apply_move(first, Player::Me).unwrap();
        let reply = referee.legal_moves()[0];
        referee.apply_move(reply, Player::Other).unwrap();

        let started = Instant::now();
        driver
            .play_turn(&TurnInput {
                opponent_move: Some(reply),
                valid_moves: referee.legal_moves(),
            })
            .unwrap();

        assert!(started.elapsed() < Duration::from_millis(40));
        assert_eq!(driver.session().turns_played(), 2);
    }

    #[test]
    fn plays_whole_games_against_a_random_referee() {
        for strategy in [Strategy::AlphaBeta, Strategy::MonteCarlo] {
            let mut driver = TurnDriver::new(
                quick_config(strategy).with_budget(Duration::from_millis(5), Duration::from_millis(2)),
                StandardRandomGenerator::seeded(4),
            );
            let mut opponent = StandardRandomGenerator::seeded(5);
            let mut referee = BoardState::new();
            let mut opponent_move = None;

            loop {
                let valid_moves = referee.legal_moves();
                if valid_moves.is_empty() {
                    break;
                }
                let mv = driver
                    .play_turn(&TurnInput {
                        opponent_move,
                        valid_moves,
                    })
                    .unwrap();
                referee.apply_move(mv, Player::Me).unwrap();
                assert_eq!(driver.session().state(), &referee, "{strategy:?}");

                let replies = referee.legal_moves();
                let Some(&reply) = opponent.pick(&replies) else {
                    break;
                };
                referee.apply_move(reply, Player::Other).unwrap();
                opponent_move = Some(reply);
            }

            assert!(driver.session().turns_played() > 0);
        }
    }

    #[test]
    fn empty_valid_list_falls_back_to_tracked_moves() {
        let mut driver = driver(Strategy::AlphaBeta, 6);

        let mv = driver
            .play_turn(&TurnInput {
                opponent_move: Some(Move::new(4, 4)),
                valid_moves: Vec::new(),
            })
            .unwrap();

        assert_eq!(mv.sub_board(), 4);
    }
}

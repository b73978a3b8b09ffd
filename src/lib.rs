//! An Ultimate Tic-Tac-Toe engine.
//!
//! The engine tracks the game in a [`state::BoardState`] and picks moves with one of two
//! time-bounded searches: iterative-deepening alpha-beta over a heuristic evaluation, or
//! Monte Carlo tree search with UCT selection and random playouts. The Monte Carlo search is
//! generic over the [`board::Board`] trait and runs on its own compact position,
//! [`boards::ultimate::UltimateBoard`].
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use uttt_engine::config::{EngineConfig, Strategy};
//! use uttt_engine::driver::TurnDriver;
//! use uttt_engine::protocol::TurnInput;
//! use uttt_engine::random::StandardRandomGenerator;
//! use uttt_engine::state::BoardState;
//!
//! let config = EngineConfig::default()
//!     .with_strategy(Strategy::MonteCarlo)
//!     .with_budget(Duration::from_millis(20), Duration::from_millis(10));
//! let mut driver = TurnDriver::new(config, StandardRandomGenerator::seeded(7));
//!
//! // the engine moves first: every cell is valid
//! let turn = TurnInput {
//!     opponent_move: None,
//!     valid_moves: BoardState::new().legal_moves(),
//! };
//! let chosen = driver.play_turn(&turn).unwrap();
//!
//! println!("The engine plays: {chosen}");
//! ```

/// Iterative-deepening alpha-beta search.
pub mod alpha_beta;
/// Contains the `Board` trait and related enums that define the interface for a game.
pub mod board;
/// Contains implementations of the `Board` trait for the Monte Carlo search.
pub mod boards;
/// Engine configuration: strategy, depth, turn budgets and rule variants.
pub mod config;
/// Keeps the game in sync with the referee and plays one move per turn.
pub mod driver;
/// Heuristic position scoring for the alpha-beta search.
pub mod evaluator;
/// Three-in-a-row helpers shared by sub-boards, the meta grid and the evaluator.
pub mod lines;
/// The core Monte Carlo tree search, containing the `MonteCarloTreeSearch` implementation.
pub mod mcts;
/// Contains the `MctsNode` struct, which represents a node in the search tree.
pub mod mcts_node;
/// The referee line protocol.
pub mod protocol;
/// Contains traits and implementations for random number generation.
pub mod random;
/// The authoritative board position and its move generator.
pub mod state;

//! Command line for the engine binary.
//!
//! Every option can also be set through a `UTTT_*` environment variable. Command line
//! arguments take priority over the environment, which takes priority over the defaults.

use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

use uttt_engine::boards::ultimate::FullBoardRule;
use uttt_engine::config::{EngineConfig, Strategy};
use uttt_engine::evaluator::DrawnSubBoards;

#[derive(Parser, Debug, Clone)]
#[command(name = "uttt-engine")]
#[command(about = "Ultimate Tic-Tac-Toe engine speaking the referee line protocol")]
#[command(
    long_about = "Reads the opponent's move and the list of valid moves from stdin every turn
and answers with one move on stdout. Diagnostics go to stderr.

RUST_LOG, when set, overrides --log-level."
)]
pub struct Cli {
    /// Search used to pick moves
    #[arg(long, env = "UTTT_STRATEGY", value_enum, default_value = "alpha-beta")]
    pub strategy: StrategyArg,

    /// Deepest level of the iterative-deepening alpha-beta search
    #[arg(long, env = "UTTT_MAX_DEPTH", default_value_t = 10)]
    pub max_depth: u32,

    /// Time budget of the engine's first turn, in milliseconds
    #[arg(long, env = "UTTT_FIRST_TURN_MS", default_value_t = 980)]
    pub first_turn_ms: u64,

    /// Time budget of every later turn, in milliseconds
    #[arg(long, env = "UTTT_TURN_MS", default_value_t = 90)]
    pub turn_ms: u64,

    /// UCT exploration constant of the Monte Carlo search
    #[arg(long, env = "UTTT_EXPLORATION", default_value_t = std::f64::consts::SQRT_2)]
    pub exploration: f64,

    /// Seed for the Monte Carlo search; seeded from the OS when absent
    #[arg(long, env = "UTTT_SEED")]
    pub seed: Option<u64>,

    /// How the evaluator scores sub-boards that filled up without a line
    #[arg(long, env = "UTTT_DRAWN_SUB_BOARDS", value_enum, default_value = "ignore")]
    pub drawn_sub_boards: DrawnSubBoardsArg,

    /// How a full meta-board without a line ends in the Monte Carlo search
    #[arg(long, env = "UTTT_FULL_BOARD", value_enum, default_value = "draw")]
    pub full_board: FullBoardArg,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "UTTT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Iterative-deepening alpha-beta over a heuristic evaluation
    AlphaBeta,
    /// Monte Carlo tree search with UCT selection
    Mcts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DrawnSubBoardsArg {
    /// Drawn sub-boards score nothing
    Ignore,
    /// Drawn sub-boards are scored like open ones
    ScoreAsOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FullBoardArg {
    /// The game is drawn
    Draw,
    /// The player holding more sub-boards wins
    MostSubBoards,
}

impl Cli {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(anyhow!("max_depth must be greater than 0"));
        }

        if self.first_turn_ms == 0 {
            return Err(anyhow!("first_turn_ms must be greater than 0"));
        }

        if self.turn_ms == 0 {
            return Err(anyhow!("turn_ms must be greater than 0"));
        }

        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(anyhow!(
                "exploration must be a finite, non-negative number, got {}",
                self.exploration
            ));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        let strategy = match self.strategy {
            StrategyArg::AlphaBeta => Strategy::AlphaBeta,
            StrategyArg::Mcts => Strategy::MonteCarlo,
        };
        let drawn_sub_boards = match self.drawn_sub_boards {
            DrawnSubBoardsArg::Ignore => DrawnSubBoards::Ignore,
            DrawnSubBoardsArg::ScoreAsOpen => DrawnSubBoards::ScoreAsOpen,
        };
        let full_board_rule = match self.full_board {
            FullBoardArg::Draw => FullBoardRule::Draw,
            FullBoardArg::MostSubBoards => FullBoardRule::MostSubBoards,
        };

        EngineConfig::default()
            .with_strategy(strategy)
            .with_max_depth(self.max_depth)
            .with_budget(
                Duration::from_millis(self.first_turn_ms),
                Duration::from_millis(self.turn_ms),
            )
            .with_exploration(self.exploration)
            .with_drawn_sub_boards(drawn_sub_boards)
            .with_full_board_rule(full_board_rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("uttt-engine").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_match_the_library() {
        let cli = parse(&[]);
        assert!(cli.validate().is_ok());
        assert_eq!(cli.seed, None);
        assert_eq!(cli.engine_config(), EngineConfig::default());
    }

    #[test]
    fn flags_reach_the_engine_config() {
        let cli = parse(&[
            "--strategy",
            "mcts",
            "--max-depth",
            "6",
            "--first-turn-ms",
            "500",
            "--turn-ms",
            "50",
            "--exploration",
            "0.5",
            "--seed",
            "42",
            "--drawn-sub-boards",
            "score-as-open",
            "--full-board",
            "most-sub-boards",
        ]);

        let config = cli.engine_config();

        assert_eq!(cli.seed, Some(42));
        assert_eq!(config.strategy, Strategy::MonteCarlo);
        assert_eq!(config.max_depth, 6);
        assert_eq!(config.budget.first_turn, Duration::from_millis(500));
        assert_eq!(config.budget.later_turns, Duration::from_millis(50));
        assert!((config.exploration - 0.5).abs() < 1e-12);
        assert_eq!(config.drawn_sub_boards, DrawnSubBoards::ScoreAsOpen);
        assert_eq!(config.full_board_rule, FullBoardRule::MostSubBoards);
    }

    #[test]
    fn unknown_strategy_is_a_parse_error() {
        let result = Cli::try_parse_from(["uttt-engine", "--strategy", "random"]);
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_zero_depth() {
        let err = parse(&["--max-depth", "0"]).validate().unwrap_err();
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn validate_rejects_zero_budgets() {
        let err = parse(&["--first-turn-ms", "0"]).validate().unwrap_err();
        assert!(err.to_string().contains("first_turn_ms"));

        let err = parse(&["--turn-ms", "0"]).validate().unwrap_err();
        assert!(err.to_string().contains("turn_ms"));
    }

    #[test]
    fn validate_rejects_bad_exploration() {
        let mut cli = parse(&[]);
        cli.exploration = f64::NAN;
        assert!(cli.validate().is_err());

        cli.exploration = -1.0;
        let err = cli.validate().unwrap_err();
        assert!(err.to_string().contains("exploration"));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let err = parse(&["--log-level", "nope"]).validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }
}

//! Engine configuration parameters.

use std::time::Duration;

use crate::alpha_beta::DEFAULT_MAX_DEPTH;
use crate::boards::ultimate::FullBoardRule;
use crate::evaluator::DrawnSubBoards;
use crate::mcts::DEFAULT_EXPLORATION;

/// Which search picks the engine's moves.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Iterative-deepening alpha-beta over the referee's candidate list.
    #[default]
    AlphaBeta,
    /// UCT tree search with random playouts.
    MonteCarlo,
}

/// Wall-clock budget per turn.
///
/// The first turn gets a larger allowance to absorb one-time setup cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnBudget {
    pub first_turn: Duration,
    pub later_turns: Duration,
}

impl Default for TurnBudget {
    fn default() -> Self {
        Self {
            first_turn: Duration::from_millis(980),
            later_turns: Duration::from_millis(90),
        }
    }
}

impl TurnBudget {
    /// Budget for the engine's turn after it has already played `turns_played` moves.
    pub fn for_turn(&self, turns_played: u32) -> Duration {
        if turns_played == 0 {
            self.first_turn
        } else {
            self.later_turns
        }
    }
}

/// Configuration for the turn driver and both searches.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub strategy: Strategy,

    /// Deepest level the alpha-beta search iterates to.
    pub max_depth: u32,

    pub budget: TurnBudget,

    /// Exploration constant of the UCT formula. `sqrt(2)` is the textbook value.
    pub exploration: f64,

    /// How the alpha-beta evaluator scores sub-boards that filled up without a line.
    pub drawn_sub_boards: DrawnSubBoards,

    /// How the Monte Carlo state resolves a full meta-board without a line.
    pub full_board_rule: FullBoardRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            budget: TurnBudget::default(),
            exploration: DEFAULT_EXPLORATION,
            drawn_sub_boards: DrawnSubBoards::default(),
            full_board_rule: FullBoardRule::default(),
        }
    }
}

impl EngineConfig {
    /// Builder pattern: set the search strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builder pattern: set the maximum alpha-beta depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builder pattern: set both turn budgets.
    pub fn with_budget(mut self, first_turn: Duration, later_turns: Duration) -> Self {
        self.budget = TurnBudget {
            first_turn,
            later_turns,
        };
        self
    }

    /// Builder pattern: set the UCT exploration constant.
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_drawn_sub_boards(mut self, policy: DrawnSubBoards) -> Self {
        self.drawn_sub_boards = policy;
        self
    }

    pub fn with_full_board_rule(mut self, rule: FullBoardRule) -> Self {
        self.full_board_rule = rule;
        self
    }
}

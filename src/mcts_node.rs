use crate::board::{Board, GameOutcome, Player};

/// Represents a single node in the Monte Carlo search tree.
///
/// Each node owns a copy of the game state, the statistics gathered by simulations passing
/// through it, and the moves not yet expanded into children.
#[derive(Debug, Clone)]
pub struct MctsNode<T: Board> {
    /// The game state that this node represents.
    pub board: T,
    /// The move that led to this node's state from its parent. `None` for the root node.
    pub prev_move: Option<T::Move>,
    /// The player whose turn it is in this node's game state.
    pub current_player: Player,
    /// The outcome of the game at this node, if it is terminal.
    pub outcome: GameOutcome,
    /// The number of simulations that passed through this node.
    pub visits: u32,
    /// The number of those simulations won by the player who moved into this node.
    pub wins: u32,
    /// Legal moves from this state that have no child yet.
    pub untried_moves: Vec<T::Move>,
}

impl<T: Board> MctsNode<T> {
    /// Creates a node for `board`, reached through `prev_move`.
    pub fn new(board: T, prev_move: Option<T::Move>) -> Self {
        let current_player = board.get_current_player();
        let outcome = board.get_outcome();
        let untried_moves = if outcome == GameOutcome::InProgress {
            board.get_available_moves()
        } else {
            Vec::new()
        };
        MctsNode {
            board,
            prev_move,
            current_player,
            outcome,
            visits: 0,
            wins: 0,
            untried_moves,
        }
    }

    /// Calculates the win rate of this node.
    pub fn wins_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            (self.wins as f64) / (self.visits as f64)
        }
    }

    /// True once every legal move has a child. Terminal nodes are trivially fully expanded.
    pub fn is_fully_expanded(&self) -> bool {
        self.untried_moves.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_decided()
    }
}

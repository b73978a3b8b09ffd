use std::time::{Duration, Instant};

use ego_tree::{NodeId, NodeRef, Tree};
use tracing::{debug, trace, warn};

use crate::board::{Board, GameOutcome};
use crate::mcts_node::MctsNode;
use crate::random::{RandomGenerator, StandardRandomGenerator};

/// The exploration constant of the UCT formula.
pub const DEFAULT_EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// The main struct for running the Monte Carlo Tree Search algorithm.
///
/// It holds the search tree, the random number generator, and the configuration for the search.
/// The tree is rooted at the position the search was built for; it is not reused between turns.
pub struct MonteCarloTreeSearch<T: Board, K: RandomGenerator> {
    tree: Tree<MctsNode<T>>,
    random: K,
    exploration: f64,
    iterations: u64,
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
///
/// This provides a convenient way to configure the MCTS search with different parameters.
pub struct MonteCarloTreeSearchBuilder<T: Board, K: RandomGenerator> {
    board: T,
    random_generator: K,
    exploration: f64,
}

impl<T: Board> MonteCarloTreeSearchBuilder<T, StandardRandomGenerator> {
    /// Creates a new builder with the given initial board state.
    pub fn new(board: T) -> Self {
        Self {
            board,
            random_generator: StandardRandomGenerator::default(),
            exploration: DEFAULT_EXPLORATION,
        }
    }
}

impl<T: Board, K: RandomGenerator> MonteCarloTreeSearchBuilder<T, K> {
    /// Sets the random number generator for the MCTS search.
    pub fn with_random_generator<R: RandomGenerator>(
        self,
        rg: R,
    ) -> MonteCarloTreeSearchBuilder<T, R> {
        MonteCarloTreeSearchBuilder {
            board: self.board,
            random_generator: rg,
            exploration: self.exploration,
        }
    }

    /// Sets the exploration constant `c` in `wins / visits + c * sqrt(ln(parent visits) / visits)`.
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    /// Builds the `MonteCarloTreeSearch` instance with the configured parameters.
    pub fn build(self) -> MonteCarloTreeSearch<T, K> {
        MonteCarloTreeSearch::new(self.board, self.random_generator, self.exploration)
    }
}

impl<T: Board> MonteCarloTreeSearch<T, StandardRandomGenerator> {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder(board: T) -> MonteCarloTreeSearchBuilder<T, StandardRandomGenerator> {
        MonteCarloTreeSearchBuilder::new(board)
    }

    pub fn from_board(board: T) -> Self {
        MonteCarloTreeSearchBuilder::new(board).build()
    }
}

impl<T: Board, K: RandomGenerator> MonteCarloTreeSearch<T, K> {
    /// Creates a new `MonteCarloTreeSearch` instance.
    ///
    /// It is recommended to use the builder pattern via `MonteCarloTreeSearch::builder()` instead.
    pub fn new(board: T, rg: K, exploration: f64) -> Self {
        Self {
            tree: Tree::new(MctsNode::new(board, None)),
            random: rg,
            exploration,
            iterations: 0,
        }
    }

    /// Returns an immutable reference to the underlying search tree.
    pub fn get_tree(&self) -> &Tree<MctsNode<T>> {
        &self.tree
    }

    /// Returns a reference to the root node of the search tree.
    pub fn get_root(&self) -> NodeRef<'_, MctsNode<T>> {
        self.tree.root()
    }

    /// Number of iterations run so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Performs one full iteration of the MCTS algorithm (Selection, Expansion, Simulation, Backpropagation).
    pub fn do_iteration(&mut self) {
        let selected = self.select_next_node();
        let leaf = self.expand_node(selected);
        let outcome = self.simulate(leaf);
        self.backpropagate(leaf, outcome);
        self.iterations += 1;
    }

    /// Runs the MCTS search for a specified number of iterations.
    pub fn iterate_n_times(&mut self, n: u32) {
        for _ in 0..n {
            self.do_iteration();
        }
    }

    /// Runs iterations until `budget` has elapsed and returns how many were run.
    ///
    /// The clock is read before each iteration, so the last one may overrun the budget.
    pub fn iterate_for(&mut self, budget: Duration) -> u64 {
        let started = Instant::now();
        let mut count = 0;
        while started.elapsed() < budget {
            self.do_iteration();
            count += 1;
        }
        debug!(count, elapsed = ?started.elapsed(), "iterations finished");
        count
    }

    /// Returns the child of the root node with the most visits. Ties keep the first child.
    pub fn get_most_visited_child(&self) -> Option<NodeRef<'_, MctsNode<T>>> {
        let mut best: Option<NodeRef<'_, MctsNode<T>>> = None;
        for child in self.tree.root().children() {
            if best.is_none_or(|b| child.value().visits > b.value().visits) {
                best = Some(child);
            }
        }
        best
    }

    /// The move leading to [`MonteCarloTreeSearch::get_most_visited_child`].
    pub fn get_most_visited_move(&self) -> Option<T::Move> {
        self.get_most_visited_child()
            .and_then(|child| child.value().prev_move)
    }

    /// Picks the most visited move if it is one of `valid_moves`, otherwise a uniformly random
    /// element of `valid_moves`. `None` only when `valid_moves` is empty.
    pub fn choose_move(&mut self, valid_moves: &[T::Move]) -> Option<T::Move> {
        match self.get_most_visited_move() {
            Some(best) if valid_moves.contains(&best) => Some(best),
            best => {
                warn!(
                    ?best,
                    valid = valid_moves.len(),
                    "searched move is not among the valid moves, picking a random one"
                );
                self.random.pick(valid_moves).copied()
            }
        }
    }

    /// Descends from the root by UCT while the current node is fully expanded and has children.
    fn select_next_node(&self) -> NodeId {
        let mut node = self.tree.root();
        while node.value().is_fully_expanded() && node.has_children() {
            let parent_visits = node.value().visits;
            let mut best: Option<(NodeRef<'_, MctsNode<T>>, f64)> = None;
            for child in node.children() {
                let ucb = self.ucb_value(parent_visits, child.value().wins, child.value().visits);
                if best.is_none_or(|(_, max_ucb)| ucb > max_ucb) {
                    best = Some((child, ucb));
                }
            }
            match best {
                Some((child, _)) => node = child,
                None => break,
            }
        }
        node.id()
    }

    /// Turns one random untried move of `node_id` into a new child and returns it.
    /// Terminal nodes are returned unchanged.
    fn expand_node(&mut self, node_id: NodeId) -> NodeId {
        let Some(mut node) = self.tree.get_mut(node_id) else {
            return node_id;
        };
        let untried = &mut node.value().untried_moves;
        if untried.is_empty() {
            return node_id;
        }

        let index = self.random.next_index(untried.len());
        let next_move = untried.swap_remove(index);
        let mut board = node.value().board.clone();
        board.perform_move(&next_move);
        trace!(?next_move, "expanding");
        node.append(MctsNode::new(board, Some(next_move))).id()
    }

    /// Plays uniformly random moves from `node_id` until the game ends.
    fn simulate(&mut self, node_id: NodeId) -> GameOutcome {
        let Some(node) = self.tree.get(node_id) else {
            return GameOutcome::Draw;
        };
        let mut board = node.value().board.clone();
        let mut outcome = board.get_outcome();

        while outcome == GameOutcome::InProgress {
            let moves = board.get_available_moves();
            let Some(next_move) = self.random.pick(&moves) else {
                return GameOutcome::Draw;
            };
            board.perform_move(next_move);
            outcome = board.get_outcome();
        }
        outcome
    }

    /// Adds a visit to every node from `node_id` up to the root, and a win to each node whose
    /// parent's player to move is the winner, i.e. the player who moved into that node.
    fn backpropagate(&mut self, node_id: NodeId, outcome: GameOutcome) {
        let winner = outcome.winner();
        let Some(leaf) = self.tree.get(node_id) else {
            return;
        };
        let path: Vec<(NodeId, bool)> = std::iter::successors(Some(leaf), |node| node.parent())
            .map(|node| {
                let mover = node.parent().map(|parent| parent.value().current_player);
                (node.id(), mover.is_some() && mover == winner)
            })
            .collect();

        for (id, won) in path {
            if let Some(mut node) = self.tree.get_mut(id) {
                let stats = node.value();
                stats.visits += 1;
                if won {
                    stats.wins += 1;
                }
            }
        }
    }

    /// Calculates the UCT value for a child. Unvisited children come first.
    fn ucb_value(&self, total_visits: u32, node_wins: u32, node_visits: u32) -> f64 {
        if node_visits == 0 {
            f64::INFINITY
        } else {
            (node_wins as f64) / (node_visits as f64)
                + self.exploration * f64::sqrt(f64::ln(total_visits as f64) / (node_visits as f64))
        }
    }
}

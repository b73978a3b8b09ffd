//! Iterative-deepening minimax with alpha-beta pruning.
//!
//! Each depth level scores every top-level candidate. The clock is read only between
//! top-level candidates: once the budget is spent, the depth in progress is thrown away
//! entirely and the best move of the last fully completed depth is kept.

use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::board::Player;
use crate::evaluator::{DRAW_SCORE, Evaluator, WIN_SCORE};
use crate::state::{BoardState, Move};

/// Default maximum search depth.
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// Outcome of one iterative-deepening search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    /// Best move of the deepest completed level, or the first candidate if no level completed.
    pub best_move: Option<Move>,
    /// Score of `best_move` at `completed_depth`.
    pub score: Option<i32>,
    /// Deepest level whose candidates were all scored.
    pub completed_depth: u32,
    /// Level that was abandoned because the budget ran out.
    pub cutoff_depth: Option<u32>,
    /// Positions visited across all levels.
    pub nodes: u64,
    pub elapsed: Duration,
}

/// Depth-limited alpha-beta search driven by iterative deepening.
#[derive(Debug, Clone)]
pub struct AlphaBetaSearcher<E: Evaluator> {
    evaluator: E,
    max_depth: u32,
}

impl<E: Evaluator> AlphaBetaSearcher<E> {
    pub fn new(evaluator: E, max_depth: u32) -> Self {
        Self {
            evaluator,
            max_depth,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Picks a move for [`Player::Me`] among `candidates`, or among the position's own legal
    /// moves when `candidates` is empty. `budget` of `None` searches every depth up to the
    /// maximum regardless of time.
    pub fn search(
        &self,
        state: &BoardState,
        candidates: &[Move],
        budget: Option<Duration>,
    ) -> SearchReport {
        let started = Instant::now();
        self.search_until(state, candidates, |_, _| {
            budget.is_some_and(|limit| started.elapsed() >= limit)
        })
    }

    /// Like [`AlphaBetaSearcher::search`], but asks `should_stop(depth, candidate_index)` before
    /// scoring each top-level candidate instead of reading the clock.
    pub fn search_until<F>(
        &self,
        state: &BoardState,
        candidates: &[Move],
        mut should_stop: F,
    ) -> SearchReport
    where
        F: FnMut(u32, usize) -> bool,
    {
        let started = Instant::now();
        let candidates = if candidates.is_empty() {
            state.legal_moves()
        } else {
            candidates.to_vec()
        };

        let mut report = SearchReport {
            best_move: candidates.first().copied(),
            score: None,
            completed_depth: 0,
            cutoff_depth: None,
            nodes: 0,
            elapsed: Duration::ZERO,
        };
        if candidates.is_empty() {
            return report;
        }

        'deepening: for depth in 1..=self.max_depth {
            let mut depth_best: Option<(Move, i32)> = None;

            for (index, &mv) in candidates.iter().enumerate() {
                if should_stop(depth, index) {
                    report.cutoff_depth = Some(depth);
                    info!(
                        depth,
                        completed_depth = report.completed_depth,
                        "Cutoff at depth {depth}"
                    );
                    break 'deepening;
                }

                let mut child = state.clone();
                if let Err(err) = child.apply_move(mv, Player::Me) {
                    warn!(%mv, %err, "skipping candidate the tracked position rejects");
                    continue;
                }

                let alpha = depth_best.map_or(-WIN_SCORE, |(_, best)| best);
                let score =
                    self.minimax(&child, depth - 1, false, alpha, WIN_SCORE, &mut report.nodes);
                trace!(depth, %mv, score, "scored candidate");

                if depth_best.is_none_or(|(_, best)| score > best) {
                    depth_best = Some((mv, score));
                }
            }

            if let Some((mv, score)) = depth_best {
                report.best_move = Some(mv);
                report.score = Some(score);
            }
            report.completed_depth = depth;
            debug!(depth, best_move = ?report.best_move, score = ?report.score, "depth completed");
        }

        if report.cutoff_depth.is_none() && report.completed_depth == self.max_depth {
            info!(max_depth = self.max_depth, "Completed all depths up to {}", self.max_depth);
        }

        report.elapsed = started.elapsed();
        report
    }

    /// Minimax value of `state` searched `depth` plies deep, `maximizing` when [`Player::Me`]
    /// is to move.
    pub fn minimax(
        &self,
        state: &BoardState,
        depth: u32,
        maximizing: bool,
        mut alpha: i32,
        mut beta: i32,
        nodes: &mut u64,
    ) -> i32 {
        *nodes += 1;
        if depth == 0 || state.global_result().is_decided() {
            return self.evaluator.evaluate(state);
        }

        let moves = state.legal_moves();
        if moves.is_empty() {
            return DRAW_SCORE;
        }

        if maximizing {
            let mut value = -WIN_SCORE;
            for mv in moves {
                let mut child = state.clone();
                child.place(mv, Player::Me);
                value = value.max(self.minimax(&child, depth - 1, false, alpha, beta, nodes));
                alpha = alpha.max(value);
                if alpha >= beta {
                    break;
                }
            }
            value
        } else {
            let mut value = WIN_SCORE;
            for mv in moves {
                let mut child = state.clone();
                child.place(mv, Player::Other);
                value = value.min(self.minimax(&child, depth - 1, true, alpha, beta, nodes));
                beta = beta.min(value);
                if alpha >= beta {
                    break;
                }
            }
            value
        }
    }
}

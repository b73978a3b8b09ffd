//! Heuristic scoring of a [`BoardState`] from the engine's point of view.

use crate::board::{GameOutcome, Player};
use crate::lines;
use crate::state::{BoardState, Cell, SubBoard};

/// Score of a won game. No heuristic total comes anywhere near it.
pub const WIN_SCORE: i32 = 10_000_000;

/// Score of a position with no moves left.
pub const DRAW_SCORE: i32 = 0;

const META_LINE_WEIGHT: i32 = 500;
const SUB_BOARD_WIN_WEIGHT: i32 = 100;
// center 3, corners 2, edges 1
const SUB_BOARD_POSITION_WEIGHTS: [i32; 9] = [2, 1, 2, 1, 3, 1, 2, 1, 2];
const LOCAL_LINE_WEIGHT: i32 = 10;
const CENTER_CELL_BONUS: i32 = 3;
const CORNER_CELL_BONUS: i32 = 1;
const CENTER: usize = 4;
const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// Scores positions for the alpha-beta search. Positive favours [`Player::Me`].
pub trait Evaluator {
    fn evaluate(&self, state: &BoardState) -> i32;
}

/// How the evaluator treats a sub-board that filled up without a line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DrawnSubBoards {
    /// A drawn sub-board contributes nothing.
    #[default]
    Ignore,
    /// A drawn sub-board is scored with the open sub-board terms (held center and corners).
    ScoreAsOpen,
}

/// The default evaluator: meta-level threats, decided sub-boards weighted by position,
/// and local threats and key cells inside the sub-boards still in play.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicEvaluator {
    drawn_sub_boards: DrawnSubBoards,
}

impl HeuristicEvaluator {
    pub fn new(drawn_sub_boards: DrawnSubBoards) -> Self {
        Self { drawn_sub_boards }
    }

    pub fn drawn_sub_boards(&self) -> DrawnSubBoards {
        self.drawn_sub_boards
    }
}

impl Evaluator for HeuristicEvaluator {
    fn evaluate(&self, state: &BoardState) -> i32 {
        match state.global_result() {
            GameOutcome::Win => return WIN_SCORE,
            GameOutcome::Lose => return -WIN_SCORE,
            GameOutcome::InProgress | GameOutcome::Draw => {}
        }

        let owners = state.sub_boards().each_ref().map(|b| b.result().winner());
        let open = state.sub_boards().each_ref().map(|b| b.is_open());
        let mut score = META_LINE_WEIGHT
            * (lines::count_two_in_rows(&owners, &open, Player::Me)
                - lines::count_two_in_rows(&owners, &open, Player::Other));

        for (index, sub_board) in state.sub_boards().iter().enumerate() {
            let weight = SUB_BOARD_POSITION_WEIGHTS[index];
            score += match sub_board.result() {
                GameOutcome::Win => SUB_BOARD_WIN_WEIGHT * weight,
                GameOutcome::Lose => -SUB_BOARD_WIN_WEIGHT * weight,
                GameOutcome::Draw if self.drawn_sub_boards == DrawnSubBoards::Ignore => 0,
                GameOutcome::Draw | GameOutcome::InProgress => score_open_sub_board(sub_board),
            };
        }

        score
    }
}

fn score_open_sub_board(sub_board: &SubBoard) -> i32 {
    let cells = sub_board.cells();
    let open = cells.map(|c| c.is_none());
    let mut score = LOCAL_LINE_WEIGHT
        * (lines::count_two_in_rows(cells, &open, Player::Me)
            - lines::count_two_in_rows(cells, &open, Player::Other));

    if sub_board.moves_played() > 1 {
        score += CENTER_CELL_BONUS * sign(sub_board.cell(CENTER));
    }
    score += CORNERS
        .iter()
        .map(|&corner| CORNER_CELL_BONUS * sign(sub_board.cell(corner)))
        .sum::<i32>();

    score
}

fn sign(cell: Cell) -> i32 {
    match cell {
        Some(Player::Me) => 1,
        Some(Player::Other) => -1,
        None => 0,
    }
}

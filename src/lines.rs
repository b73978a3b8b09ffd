//! Three-in-a-row geometry shared by sub-boards, the meta grid and the evaluator.
//!
//! A 3x3 grid is addressed by flat index `row * 3 + col`. Each position is described by
//! who owns it (`Option<Player>`) and whether it can still be taken (`open`). For a sub-board
//! a cell is open while empty; on the meta grid a sub-board is open while still in progress,
//! so a drawn sub-board is neither owned nor open and blocks every line through it.

use crate::board::{GameOutcome, Player};

/// Rows, columns and both diagonals.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the owner of a completed line, if any.
pub fn line_winner(owners: &[Option<Player>; 9]) -> Option<Player> {
    WIN_LINES.iter().find_map(|&[a, b, c]| match owners[a] {
        Some(player) if owners[b] == Some(player) && owners[c] == Some(player) => Some(player),
        _ => None,
    })
}

/// Scores a grid: a completed line wins, otherwise it is drawn once nothing is open.
pub fn grid_outcome(owners: &[Option<Player>; 9], open: &[bool; 9]) -> GameOutcome {
    match line_winner(owners) {
        Some(player) => GameOutcome::won_by(player),
        None if open.iter().any(|&o| o) => GameOutcome::InProgress,
        None => GameOutcome::Draw,
    }
}

/// Counts lines where `player` holds exactly two positions and the third is still open.
pub fn count_two_in_rows(owners: &[Option<Player>; 9], open: &[bool; 9], player: Player) -> i32 {
    WIN_LINES
        .iter()
        .filter(|line| {
            let held = line.iter().filter(|&&i| owners[i] == Some(player)).count();
            let free = line.iter().filter(|&&i| open[i]).count();
            held == 2 && free == 1
        })
        .count() as i32
}

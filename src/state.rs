//! The authoritative Ultimate Tic-Tac-Toe position and its move generator.
//!
//! A [`BoardState`] is nine [`SubBoard`]s, the cached result of each, the overall result and the
//! sub-board the next mover is forced into. Every result is recomputed on each move, so none of
//! them is ever stale. Search code clones the state per branch instead of undoing moves.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::board::{GameOutcome, Player};
use crate::lines;

/// Width and height of the full grid.
pub const GRID_SIZE: u8 = 9;

/// Contents of one cell. `None` is an empty cell.
pub type Cell = Option<Player>;

/// A cell in the 0-8 global coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub row: u8,
    pub col: u8,
}

impl Move {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Builds the move for cell `local` (0-8) of sub-board `sub_board` (0-8).
    pub fn from_sub_board(sub_board: usize, local: usize) -> Self {
        Self {
            row: ((sub_board / 3) * 3 + local / 3) as u8,
            col: ((sub_board % 3) * 3 + local % 3) as u8,
        }
    }

    pub fn in_bounds(&self) -> bool {
        self.row < GRID_SIZE && self.col < GRID_SIZE
    }

    /// Index of the sub-board this cell belongs to.
    pub fn sub_board(&self) -> usize {
        (self.row as usize / 3) * 3 + self.col as usize / 3
    }

    /// Index of this cell inside its sub-board. This is also the sub-board the
    /// opponent is sent to.
    pub fn local_index(&self) -> usize {
        (self.row as usize % 3) * 3 + self.col as usize % 3
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.row, self.col)
    }
}

/// Reasons a move cannot be applied to a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("move {0} lies outside the 9x9 grid")]
    OutOfBounds(Move),

    #[error("cell {0} is already occupied")]
    Occupied(Move),

    #[error("move {mv} is outside forced sub-board {forced}")]
    OutsideForcedSubBoard { mv: Move, forced: usize },

    #[error("move {mv} targets sub-board {sub_board}, which is already decided")]
    SubBoardDecided { mv: Move, sub_board: usize },

    #[error("move {0} played after the game was decided")]
    GameOver(Move),

    #[error("sub-board {0} cannot be forced because it is not open")]
    ForcedSubBoardNotOpen(usize),
}

/// Reasons the 81-character board notation is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBoardError {
    #[error("unexpected character {0:?}, expected one of 'X', 'O' or '.'")]
    InvalidCharacter(char),

    #[error("expected 81 cells, found {0}")]
    WrongCellCount(usize),
}

/// Parses the cell notation shared by every board type: `X`, `O` and `.`,
/// whitespace ignored, row-major over the full 9x9 grid.
pub(crate) fn parse_cells(s: &str) -> Result<[[Option<bool>; 9]; 9], ParseBoardError> {
    let mut grid = [[None; 9]; 9];
    let mut count = 0;
    for ch in s.chars().filter(|c| !c.is_whitespace()) {
        let value = match ch {
            'X' | 'x' => Some(true),
            'O' | 'o' => Some(false),
            '.' | '-' | '_' => None,
            other => return Err(ParseBoardError::InvalidCharacter(other)),
        };
        if count < 81 {
            grid[count / 9][count % 9] = value;
        }
        count += 1;
    }
    if count != 81 {
        return Err(ParseBoardError::WrongCellCount(count));
    }
    Ok(grid)
}

/// A 3x3 grid of cells plus its cached result. Once the result leaves
/// [`GameOutcome::InProgress`] it never changes again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SubBoard {
    cells: [Cell; 9],
    result: GameOutcome,
}

impl SubBoard {
    pub fn cell(&self, local: usize) -> Cell {
        self.cells[local]
    }

    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    pub fn result(&self) -> GameOutcome {
        self.result
    }

    pub fn is_open(&self) -> bool {
        self.result == GameOutcome::InProgress
    }

    pub fn moves_played(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Local indices of the empty cells.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| i)
    }

    fn refresh_result(&mut self) {
        if self.is_open() {
            let open = self.cells.map(|c| c.is_none());
            self.result = lines::grid_outcome(&self.cells, &open);
        }
    }
}

/// The full game position, owned by the turn loop and mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BoardState {
    sub_boards: [SubBoard; 9],
    global_result: GameOutcome,
    forced_sub_board: Option<usize>,
}

impl BoardState {
    /// An empty board with no forced sub-board.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sub_boards(&self) -> &[SubBoard; 9] {
        &self.sub_boards
    }

    pub fn sub_board(&self, index: usize) -> &SubBoard {
        &self.sub_boards[index]
    }

    pub fn sub_result(&self, index: usize) -> GameOutcome {
        self.sub_boards[index].result
    }

    pub fn global_result(&self) -> GameOutcome {
        self.global_result
    }

    /// The sub-board the next mover must play in, or `None` when any open sub-board is allowed.
    pub fn forced_sub_board(&self) -> Option<usize> {
        self.forced_sub_board
    }

    pub fn cell(&self, mv: Move) -> Cell {
        self.sub_boards[mv.sub_board()].cells[mv.local_index()]
    }

    /// Returns the same position with a different forced sub-board. Used to set up positions.
    pub fn with_forced_sub_board(mut self, forced: Option<usize>) -> Result<Self, MoveError> {
        if let Some(index) = forced {
            if index >= self.sub_boards.len() || !self.sub_boards[index].is_open() {
                return Err(MoveError::ForcedSubBoardNotOpen(index));
            }
        }
        self.forced_sub_board = forced;
        Ok(self)
    }

    /// Records `player` taking the cell at `mv`.
    ///
    /// Rejects moves outside the grid, onto an occupied cell, into a decided sub-board,
    /// outside the forced sub-board, or after the game is decided. On success the sub-board
    /// result, the global result and the forced sub-board are all brought up to date.
    pub fn apply_move(&mut self, mv: Move, player: Player) -> Result<(), MoveError> {
        if !mv.in_bounds() {
            return Err(MoveError::OutOfBounds(mv));
        }
        if self.global_result.is_decided() {
            return Err(MoveError::GameOver(mv));
        }
        let sub_board = mv.sub_board();
        if let Some(forced) = self.forced_sub_board {
            if forced != sub_board {
                return Err(MoveError::OutsideForcedSubBoard { mv, forced });
            }
        }
        let target = &self.sub_boards[sub_board];
        if !target.is_open() {
            return Err(MoveError::SubBoardDecided { mv, sub_board });
        }
        if target.cells[mv.local_index()].is_some() {
            return Err(MoveError::Occupied(mv));
        }

        self.place(mv, player);
        Ok(())
    }

    /// Applies a move already known to be legal, e.g. one produced by [`BoardState::legal_moves`].
    ///
    /// The next mover is sent to the sub-board matching the move's cell inside its own
    /// sub-board ([`Move::local_index`]), not to the sub-board that contains the move.
    pub(crate) fn place(&mut self, mv: Move, player: Player) {
        let sub_board = &mut self.sub_boards[mv.sub_board()];
        sub_board.cells[mv.local_index()] = Some(player);
        sub_board.refresh_result();
        self.refresh_global_result();

        let next = mv.local_index();
        self.forced_sub_board = self.sub_boards[next].is_open().then_some(next);
    }

    fn refresh_global_result(&mut self) {
        let owners = self.sub_boards.each_ref().map(|b| b.result.winner());
        let open = self.sub_boards.each_ref().map(|b| b.is_open());
        self.global_result = lines::grid_outcome(&owners, &open);
    }

    /// Every legal move for the next mover.
    ///
    /// Inside the forced sub-board when one is set, otherwise every empty cell of every open
    /// sub-board. Empty once the game is decided.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.global_result.is_decided() {
            return Vec::new();
        }

        match self.forced_sub_board.filter(|&i| self.sub_boards[i].is_open()) {
            Some(index) => self.moves_in(index).collect(),
            None => (0..self.sub_boards.len())
                .filter(|&i| self.sub_boards[i].is_open())
                .flat_map(|i| self.moves_in(i))
                .collect(),
        }
    }

    fn moves_in(&self, sub_board: usize) -> impl Iterator<Item = Move> + '_ {
        self.sub_boards[sub_board]
            .empty_cells()
            .map(move |local| Move::from_sub_board(sub_board, local))
    }
}

impl FromStr for BoardState {
    type Err = ParseBoardError;

    /// Parses 81 cells, `X` for me, `O` for the opponent, `.` for empty. The result has no
    /// forced sub-board; see [`BoardState::with_forced_sub_board`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let grid = parse_cells(s)?;
        let mut state = BoardState::new();
        for (row, cells) in grid.iter().enumerate() {
            for (col, &cell) in cells.iter().enumerate() {
                let mv = Move::new(row as u8, col as u8);
                state.sub_boards[mv.sub_board()].cells[mv.local_index()] = cell.map(|mine| {
                    if mine {
                        Player::Me
                    } else {
                        Player::Other
                    }
                });
            }
        }
        for sub_board in state.sub_boards.iter_mut() {
            sub_board.refresh_result();
        }
        state.refresh_global_result();
        Ok(state)
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                if col > 0 && col % 3 == 0 {
                    write!(f, " ")?;
                }
                let symbol = match self.cell(Move::new(row, col)) {
                    Some(Player::Me) => 'X',
                    Some(Player::Other) => 'O',
                    None => '.',
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::board::{Board, GameOutcome, Player};
use crate::lines;
use crate::state::{parse_cells, Move, MoveError, ParseBoardError, GRID_SIZE};

/// A `Board` implementation of Ultimate Tic-Tac-Toe for the Monte Carlo search.
///
/// Cells live in a flat 9x9 grid and each sub-board's status in a 3x3 grid. Players are
/// tracked as marks that alternate after every move; the forced sub-board is derived from
/// the last move's position inside its sub-board. Outcomes are reported relative to the
/// root mark, which is the player the search runs for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UltimateBoard {
    root_mark: Mark,
    current_mark: Mark,
    cells: [[Option<Mark>; 9]; 9],
    sub_boards: [[Status; 3]; 3],
    last_move: Option<Move>,
    status: Status,
    full_board_rule: FullBoardRule,
}

/// The two players by the order they move in. `X` moves first.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// State of one sub-board or of the whole game.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Status {
    Open,
    Won(Mark),
    Drawn,
}

/// How a game ends once every sub-board is decided without a meta line.
#[derive(Debug, Default, PartialEq, Eq, Hash, Copy, Clone)]
pub enum FullBoardRule {
    /// The game is drawn.
    #[default]
    Draw,
    /// The player holding more sub-boards wins; equal counts draw.
    MostSubBoards,
}

impl UltimateBoard {
    fn new(root_mark: Mark) -> Self {
        Self {
            root_mark,
            current_mark: Mark::X,
            cells: [[None; 9]; 9],
            sub_boards: [[Status::Open; 3]; 3],
            last_move: None,
            status: Status::Open,
            full_board_rule: FullBoardRule::Draw,
        }
    }

    pub fn with_full_board_rule(mut self, rule: FullBoardRule) -> Self {
        self.full_board_rule = rule;
        self.status = self.compute_status();
        self
    }

    /// Sets who moves next. Used to set up positions.
    pub fn with_current_mark(mut self, mark: Mark) -> Self {
        self.current_mark = mark;
        self
    }

    /// The same position seen from the player about to move.
    pub fn rooted_at_current(&self) -> Self {
        let mut board = self.clone();
        board.root_mark = board.current_mark;
        board
    }

    pub fn current_mark(&self) -> Mark {
        self.current_mark
    }

    pub fn root_mark(&self) -> Mark {
        self.root_mark
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn cell(&self, mv: Move) -> Option<Mark> {
        self.cells[mv.row as usize][mv.col as usize]
    }

    pub fn sub_board_status(&self, index: usize) -> Status {
        self.sub_boards[index / 3][index % 3]
    }

    /// The sub-board the next mover is sent to by the last move, if it is still open.
    pub fn forced_sub_board(&self) -> Option<usize> {
        let target = self.last_move?.local_index();
        (self.sub_board_status(target) == Status::Open).then_some(target)
    }

    /// Validated move application for moves that did not come from
    /// [`Board::get_available_moves`], such as the opponent's reported move.
    pub fn apply(&mut self, mv: Move) -> Result<(), MoveError> {
        if !mv.in_bounds() {
            return Err(MoveError::OutOfBounds(mv));
        }
        if self.status != Status::Open {
            return Err(MoveError::GameOver(mv));
        }
        if let Some(forced) = self.forced_sub_board() {
            if forced != mv.sub_board() {
                return Err(MoveError::OutsideForcedSubBoard { mv, forced });
            }
        }
        if self.sub_board_status(mv.sub_board()) != Status::Open {
            return Err(MoveError::SubBoardDecided {
                mv,
                sub_board: mv.sub_board(),
            });
        }
        if self.cell(mv).is_some() {
            return Err(MoveError::Occupied(mv));
        }

        self.place(mv);
        Ok(())
    }

    fn place(&mut self, mv: Move) {
        let mark = self.current_mark;
        let (row, col) = (mv.row as usize, mv.col as usize);
        self.cells[row][col] = Some(mark);

        let (block_row, block_col) = (row / 3, col / 3);
        if self.sub_boards[block_row][block_col] == Status::Open {
            self.sub_boards[block_row][block_col] = self.compute_sub_board(block_row, block_col);
        }

        self.last_move = Some(mv);
        self.current_mark = mark.other();
        self.status = self.compute_status();
    }

    fn compute_sub_board(&self, block_row: usize, block_col: usize) -> Status {
        let cells: [Option<Mark>; 9] =
            std::array::from_fn(|i| self.cells[block_row * 3 + i / 3][block_col * 3 + i % 3]);
        match line_winner(&cells) {
            Some(mark) => Status::Won(mark),
            None if cells.iter().all(Option::is_some) => Status::Drawn,
            None => Status::Open,
        }
    }

    fn compute_status(&self) -> Status {
        let statuses = self.sub_boards.as_flattened();
        let owners: [Option<Mark>; 9] = std::array::from_fn(|i| match statuses[i] {
            Status::Won(mark) => Some(mark),
            Status::Open | Status::Drawn => None,
        });
        if let Some(mark) = line_winner(&owners) {
            return Status::Won(mark);
        }
        if statuses.contains(&Status::Open) {
            return Status::Open;
        }

        match self.full_board_rule {
            FullBoardRule::Draw => Status::Drawn,
            FullBoardRule::MostSubBoards => {
                let held_by = |mark| owners.iter().filter(|&&o| o == Some(mark)).count();
                match held_by(Mark::X).cmp(&held_by(Mark::O)) {
                    Ordering::Greater => Status::Won(Mark::X),
                    Ordering::Less => Status::Won(Mark::O),
                    Ordering::Equal => Status::Drawn,
                }
            }
        }
    }

    fn empty_cells_in(&self, index: usize, moves: &mut Vec<Move>) {
        for local in 0..9 {
            let mv = Move::from_sub_board(index, local);
            if self.cell(mv).is_none() {
                moves.push(mv);
            }
        }
    }

    fn player_of(&self, mark: Mark) -> Player {
        if mark == self.root_mark {
            Player::Me
        } else {
            Player::Other
        }
    }
}

/// Line detection is shared with [`lines`], which speaks in players; `X` stands in for
/// [`Player::Me`] there regardless of the root mark.
fn line_winner(grid: &[Option<Mark>; 9]) -> Option<Mark> {
    let owners = grid.map(|cell| {
        cell.map(|mark| match mark {
            Mark::X => Player::Me,
            Mark::O => Player::Other,
        })
    });
    lines::line_winner(&owners).map(|player| match player {
        Player::Me => Mark::X,
        Player::Other => Mark::O,
    })
}

impl Default for UltimateBoard {
    /// An empty board with `X` to move and the search running for `X`.
    fn default() -> Self {
        UltimateBoard::new(Mark::X)
    }
}

impl Board for UltimateBoard {
    type Move = Move;

    fn get_current_player(&self) -> Player {
        self.player_of(self.current_mark)
    }

    fn get_outcome(&self) -> GameOutcome {
        match self.status {
            Status::Open => GameOutcome::InProgress,
            Status::Drawn => GameOutcome::Draw,
            Status::Won(mark) => GameOutcome::won_by(self.player_of(mark)),
        }
    }

    fn get_available_moves(&self) -> Vec<Self::Move> {
        let mut moves = Vec::new();
        if self.status != Status::Open {
            return moves;
        }

        match self.forced_sub_board() {
            Some(index) => self.empty_cells_in(index, &mut moves),
            None => {
                for index in 0..9 {
                    if self.sub_board_status(index) == Status::Open {
                        self.empty_cells_in(index, &mut moves);
                    }
                }
            }
        }
        moves
    }

    fn perform_move(&mut self, b_move: &Self::Move) {
        self.place(*b_move);
    }
}

impl FromStr for UltimateBoard {
    type Err = ParseBoardError;

    /// Parses 81 cells, `X` and `O` by mark, `.` for empty. `X` is to move and nothing
    /// is forced; see [`UltimateBoard::with_current_mark`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let grid = parse_cells(s)?;
        let mut board = UltimateBoard::default();
        for (row, cells) in grid.iter().enumerate() {
            for (col, &cell) in cells.iter().enumerate() {
                board.cells[row][col] = cell.map(|x| if x { Mark::X } else { Mark::O });
            }
        }
        for block_row in 0..3 {
            for block_col in 0..3 {
                board.sub_boards[block_row][block_col] = board.compute_sub_board(block_row, block_col);
            }
        }
        board.status = board.compute_status();
        Ok(board)
    }
}

impl fmt::Display for UltimateBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                if col > 0 && col % 3 == 0 {
                    write!(f, " ")?;
                }
                let symbol = match self.cell(Move::new(row, col)) {
                    Some(Mark::X) => 'X',
                    Some(Mark::O) => 'O',
                    None => '.',
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sub-boards 0 and 1 won by X, (0,8) is the only move left and wins the game for X
    const LAST_MOVE_WINS: &str = "
        XXX XXX XX.
        OO. OO. OOX
        ... ... XOO
        XOX XOX XOX
        XOO XOO XOO
        OXX OXX OXX
        XOX XOX XOX
        XOO XOO XOO
        OXX OXX OXX";

    #[test]
    fn empty_board_offers_every_cell() {
        let board = UltimateBoard::default();
        assert_eq!(board.get_available_moves().len(), 81);
        assert_eq!(board.get_current_player(), Player::Me);
        assert_eq!(board.get_outcome(), GameOutcome::InProgress);
    }

    #[test]
    fn last_move_sends_the_opponent() {
        // arrange
        let mut board = UltimateBoard::default();

        // act
        board.apply(Move::new(4, 4)).unwrap();

        // assert
        assert_eq!(board.forced_sub_board(), Some(4));
        let moves = board.get_available_moves();
        assert_eq!(moves.len(), 8);
        assert!(moves.iter().all(|m| m.sub_board() == 4));
        assert_eq!(board.current_mark(), Mark::O);
        assert_eq!(board.get_current_player(), Player::Other);
    }

    #[test]
    fn rooting_flips_the_perspective() {
        let mut board = UltimateBoard::default();
        board.apply(Move::new(4, 4)).unwrap();

        let rooted = board.rooted_at_current();

        assert_eq!(rooted.root_mark(), Mark::O);
        assert_eq!(rooted.get_current_player(), Player::Me);
        assert_eq!(rooted.get_available_moves(), board.get_available_moves());
    }

    #[test]
    fn apply_rejects_illegal_moves() {
        let mut board = UltimateBoard::default();
        board.apply(Move::new(4, 4)).unwrap();

        assert_eq!(
            board.apply(Move::new(4, 4)),
            Err(MoveError::Occupied(Move::new(4, 4)))
        );
        assert_eq!(
            board.apply(Move::new(0, 0)),
            Err(MoveError::OutsideForcedSubBoard {
                mv: Move::new(0, 0),
                forced: 4
            })
        );
    }

    #[test]
    fn parsed_position_has_a_single_winning_move() {
        let mut board: UltimateBoard = LAST_MOVE_WINS.parse().unwrap();
        assert_eq!(board.sub_board_status(0), Status::Won(Mark::X));
        assert_eq!(board.sub_board_status(5), Status::Drawn);
        assert_eq!(board.get_available_moves(), vec![Move::new(0, 8)]);

        board.perform_move(&Move::new(0, 8));

        assert_eq!(board.status(), Status::Won(Mark::X));
        assert_eq!(board.get_outcome(), GameOutcome::Win);
        assert!(board.get_available_moves().is_empty());
    }

    #[test]
    fn outcome_is_relative_to_the_root() {
        let mut board: UltimateBoard = LAST_MOVE_WINS.parse().unwrap();
        board = board.with_current_mark(Mark::X);
        let mut seen_by_o = board.clone().with_current_mark(Mark::O).rooted_at_current();
        seen_by_o = seen_by_o.with_current_mark(Mark::X);

        board.perform_move(&Move::new(0, 8));
        seen_by_o.perform_move(&Move::new(0, 8));

        assert_eq!(board.get_outcome(), GameOutcome::Win);
        assert_eq!(seen_by_o.get_outcome(), GameOutcome::Lose);
    }

    #[test]
    fn full_board_tiebreak_counts_sub_boards() {
        // X holds sub-boards 0 and 8, O holds 4 only, everything else drawn, no meta line
        let position = "
            XXX XOX XOX
            OO. XOO XOO
            ... OXX OXX
            XOX OOO XOX
            XOO XX. XOO
            OXX ... OXX
            XOX XOX XXX
            XOO XOO OO.
            OXX OXX ...";
        let drawn: UltimateBoard = position.parse().unwrap();
        let majority = drawn.clone().with_full_board_rule(FullBoardRule::MostSubBoards);

        assert_eq!(drawn.status(), Status::Drawn);
        assert_eq!(drawn.get_outcome(), GameOutcome::Draw);
        assert_eq!(majority.status(), Status::Won(Mark::X));
    }

    #[test]
    fn random_playouts_always_terminate() {
        let mut rng = crate::random::StandardRandomGenerator::seeded(11);
        for _ in 0..50 {
            let mut board = UltimateBoard::default();
            let mut plies = 0;
            while board.get_outcome() == GameOutcome::InProgress {
                let moves = board.get_available_moves();
                let mv = *crate::random::RandomGenerator::pick(&mut rng, &moves).unwrap();
                board.apply(mv).unwrap();
                plies += 1;
            }
            assert!(plies <= 81);
            assert!(board.get_available_moves().is_empty());
        }
    }
}

/// The interface the Monte Carlo search uses to drive a game state.
///
/// To search a game with [`MonteCarloTreeSearch`](crate::mcts::MonteCarloTreeSearch), this trait must be implemented.
/// It owns the rules: which moves are legal, how a move changes the state and whether the game is over.
/// Players and outcomes are always reported from the perspective of the player the search runs for.
pub trait Board: Clone {
    /// The type representing a move in the game.
    type Move: Copy + PartialEq + std::fmt::Debug;

    /// Returns the player whose turn it is to make a move.
    fn get_current_player(&self) -> Player;

    /// Returns the current outcome of the game.
    fn get_outcome(&self) -> GameOutcome;

    /// Returns a list of all legal moves available from the current state.
    /// Empty once the game is over.
    fn get_available_moves(&self) -> Vec<Self::Move>;

    /// Applies a move previously returned by [`Board::get_available_moves`].
    fn perform_move(&mut self, b_move: &Self::Move);
}

/// Represents the possible results of a game or of a single sub-board.
///
/// The same enumeration scores a 3x3 sub-board and the meta grid built from the nine sub-board results.
#[derive(Debug, Default, PartialEq, Eq, Hash, Copy, Clone)]
pub enum GameOutcome {
    /// Still open: no line has been completed and empty cells remain.
    #[default]
    InProgress = 0,
    /// Won by [`Player::Me`].
    Win = 1,
    /// Won by [`Player::Other`].
    Lose = 2,
    /// Full with no completed line.
    Draw = 3,
}

impl GameOutcome {
    /// The outcome of `player` completing a line.
    pub fn won_by(player: Player) -> Self {
        match player {
            Player::Me => GameOutcome::Win,
            Player::Other => GameOutcome::Lose,
        }
    }

    pub fn is_decided(self) -> bool {
        self != GameOutcome::InProgress
    }

    /// The player who completed a line, if any.
    pub fn winner(self) -> Option<Player> {
        match self {
            GameOutcome::Win => Some(Player::Me),
            GameOutcome::Lose => Some(Player::Other),
            GameOutcome::InProgress | GameOutcome::Draw => None,
        }
    }
}

/// Represents the players in the game from the perspective of the engine.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Player {
    /// The player the engine is choosing moves for.
    Me = 1,
    /// The opponent.
    Other = 2,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Me => Player::Other,
            Player::Other => Player::Me,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GameOutcome, Player};

    #[test]
    fn outcome_names_its_winner() {
        assert_eq!(GameOutcome::won_by(Player::Me).winner(), Some(Player::Me));
        assert_eq!(GameOutcome::won_by(Player::Other).winner(), Some(Player::Other));
        assert_eq!(GameOutcome::Draw.winner(), None);
        assert_eq!(GameOutcome::InProgress.winner(), None);
    }

    #[test]
    fn only_in_progress_is_undecided() {
        assert!(!GameOutcome::InProgress.is_decided());
        assert!(GameOutcome::Win.is_decided());
        assert!(GameOutcome::Lose.is_decided());
        assert!(GameOutcome::Draw.is_decided());
    }
}

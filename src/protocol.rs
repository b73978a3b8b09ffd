//! The line protocol spoken with the referee.
//!
//! Each turn the referee sends the opponent's last move (`-1 -1` before the first move),
//! the number of legal moves, then one legal move per line. The engine answers with a
//! single `row col` line.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::state::Move;

/// No position has more legal moves than cells.
const MAX_VALID_MOVES: usize = 81;

/// Everything the referee sends for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnInput {
    /// `None` when the engine moves first.
    pub opponent_move: Option<Move>,
    pub valid_moves: Vec<Move>,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to talk to the referee")]
    Io(#[from] io::Error),

    #[error("input ended in the middle of a turn, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("malformed {expected} on line {line_number}: {line:?}")]
    Malformed {
        expected: &'static str,
        line_number: usize,
        line: String,
    },
}

/// Reads [`TurnInput`]s from any buffered source, typically locked stdin.
pub struct TurnReader<R: BufRead> {
    input: R,
    buffer: String,
    line_number: usize,
}

impl<R: BufRead> TurnReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buffer: String::new(),
            line_number: 0,
        }
    }

    /// Reads the next turn. `Ok(None)` when the input ends cleanly before a turn starts.
    pub fn read_turn(&mut self) -> Result<Option<TurnInput>, ProtocolError> {
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };
        let opponent_move = self.parse_move_line(&line, "opponent move")?;

        let line = self.require_line("valid move count")?;
        let count = line
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&count| count <= MAX_VALID_MOVES)
            .ok_or_else(|| self.malformed("valid move count", &line))?;

        let mut valid_moves = Vec::with_capacity(count);
        for _ in 0..count {
            let line = self.require_line("valid move")?;
            match self.parse_move_line(&line, "valid move")? {
                Some(mv) => valid_moves.push(mv),
                None => return Err(self.malformed("valid move", &line)),
            }
        }

        Ok(Some(TurnInput {
            opponent_move,
            valid_moves,
        }))
    }

    /// Next non-blank line, `None` at end of input.
    fn next_line(&mut self) -> Result<Option<String>, ProtocolError> {
        loop {
            self.buffer.clear();
            if self.input.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            if !self.buffer.trim().is_empty() {
                return Ok(Some(self.buffer.trim().to_string()));
            }
        }
    }

    fn require_line(&mut self, expected: &'static str) -> Result<String, ProtocolError> {
        self.next_line()?
            .ok_or(ProtocolError::UnexpectedEof { expected })
    }

    fn parse_move_line(
        &self,
        line: &str,
        expected: &'static str,
    ) -> Result<Option<Move>, ProtocolError> {
        parse_move(line).ok_or_else(|| self.malformed(expected, line))
    }

    fn malformed(&self, expected: &'static str, line: &str) -> ProtocolError {
        ProtocolError::Malformed {
            expected,
            line_number: self.line_number,
            line: line.to_string(),
        }
    }
}

/// Parses `row col`. `Some(None)` for the `-1 -1` sentinel, `None` when the line is not a
/// pair of coordinates on the grid.
pub fn parse_move(line: &str) -> Option<Option<Move>> {
    let mut parts = line.split_whitespace();
    let row: i32 = parts.next()?.parse().ok()?;
    let col: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    match (row, col) {
        (-1, -1) => Some(None),
        (0..=8, 0..=8) => Some(Some(Move::new(row as u8, col as u8))),
        _ => None,
    }
}

/// Writes the engine's answer and flushes so the referee sees it immediately.
pub fn write_move<W: Write>(output: &mut W, mv: Move) -> Result<(), ProtocolError> {
    writeln!(output, "{mv}")?;
    output.flush()?;
    Ok(())
}

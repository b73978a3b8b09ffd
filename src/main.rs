//! Ultimate Tic-Tac-Toe engine binary.
//!
//! Speaks the referee protocol on stdin/stdout for one game, then exits when the referee
//! closes its input.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use uttt_engine::driver::TurnDriver;
use uttt_engine::protocol::{TurnReader, write_move};
use uttt_engine::random::{RandomGenerator, StandardRandomGenerator};

mod cli;

use crate::cli::Cli;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(())
}

/// Plays turns until the input ends. Returns the number of moves played.
fn serve<R: BufRead, W: Write, K: RandomGenerator>(
    driver: &mut TurnDriver<K>,
    input: R,
    output: &mut W,
) -> Result<u32> {
    let mut reader = TurnReader::new(input);
    let mut moves = 0;

    while let Some(turn) = reader.read_turn().context("failed to read the turn input")? {
        let mv = driver
            .play_turn(&turn)
            .with_context(|| format!("failed to play turn {}", moves + 1))?;
        write_move(output, mv).context("failed to write the move")?;
        moves += 1;
    }

    Ok(moves)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    cli.validate()?;
    init_tracing(&cli.log_level)?;

    let config = cli.engine_config();
    info!(
        strategy = ?config.strategy,
        max_depth = config.max_depth,
        first_turn = ?config.budget.first_turn,
        later_turns = ?config.budget.later_turns,
        "engine starting"
    );

    let random = match cli.seed {
        Some(seed) => StandardRandomGenerator::seeded(seed),
        None => StandardRandomGenerator::from_entropy(),
    };
    let mut driver = TurnDriver::new(config, random);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let outcome = serve(&mut driver, stdin.lock(), &mut stdout.lock());
    Ok(ExitCode::from(exit_status(outcome)))
}

/// Logs how the game ended and maps it to the process exit status. Errors are logged here
/// only, `main` does not return them.
fn exit_status(outcome: Result<u32>) -> u8 {
    match outcome {
        Ok(moves) => {
            info!(moves, "input closed, shutting down");
            0
        }
        Err(err) => {
            error!("{err:#}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uttt_engine::config::{EngineConfig, Strategy};

    use super::*;

    fn driver() -> TurnDriver<StandardRandomGenerator> {
        let config = EngineConfig::default()
            .with_strategy(Strategy::AlphaBeta)
            .with_max_depth(2)
            .with_budget(Duration::from_millis(20), Duration::from_millis(5));
        TurnDriver::new(config, StandardRandomGenerator::seeded(1))
    }

    #[test]
    fn answers_each_turn_on_its_own_line() {
        // arrange
        let input = "-1 -1\n2\n4 4\n0 0\n";
        let mut output = Vec::new();

        // act
        let moves = serve(&mut driver(), input.as_bytes(), &mut output).unwrap();

        // assert
        assert_eq!(moves, 1);
        let text = String::from_utf8(output).unwrap();
        assert!(text == "4 4\n" || text == "0 0\n", "{text:?}");
    }

    #[test]
    fn empty_input_is_a_clean_shutdown() {
        let mut output: Vec<u8> = Vec::new();

        let moves = serve(&mut driver(), "".as_bytes(), &mut output).unwrap();

        assert_eq!(moves, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn illegal_opponent_move_is_fatal() {
        let input = "4 4\n1\n4 5\n0 0\n1\n0 1\n";
        let mut output = Vec::new();

        let err = serve(&mut driver(), input.as_bytes(), &mut output).unwrap_err();

        assert!(format!("{err:#}").contains("illegal"));
        assert_eq!(String::from_utf8(output).unwrap(), "4 5\n");
    }

    #[test]
    fn fatal_errors_exit_non_zero_without_propagating() {
        let mut output: Vec<u8> = Vec::new();

        let failed = serve(&mut driver(), "4 4\n1\n4 5\n0 0\n1\n0 1\n".as_bytes(), &mut output);
        let clean = serve(&mut driver(), "".as_bytes(), &mut output);

        assert_eq!(exit_status(failed), 1);
        assert_eq!(exit_status(clean), 0);
    }

    #[test]
    fn truncated_turn_is_fatal() {
        let mut output: Vec<u8> = Vec::new();

        let err = serve(&mut driver(), "-1 -1\n3\n0 0\n".as_bytes(), &mut output).unwrap_err();

        assert!(format!("{err:#}").contains("input ended"));
    }
}

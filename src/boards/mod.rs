//! Contains implementations of the `Board` trait driven by the Monte Carlo search.

/// Ultimate Tic-Tac-Toe with its own compact position, independent of [`crate::state`].
pub mod ultimate;

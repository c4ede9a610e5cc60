//! Command-line interface
//!
//! Argument parsing for the `testnet-fixtures` binary.

pub mod commands;

pub use commands::{Command, FeesArg, Opt};

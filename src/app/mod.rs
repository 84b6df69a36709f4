//! Command-line surface of the `runscope` binary.

pub mod cli;
pub mod commands;

pub use commands::run_cli;

//! Command-line front end: argument parsing and command execution.

pub mod cli;
pub mod commands;

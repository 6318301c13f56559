//! CLI module - argument parsing and the analysis run

pub mod args;
pub mod commands;

pub use args::Cli;

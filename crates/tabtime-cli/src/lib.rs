//! Tab time analysis CLI library.
//!
//! This crate provides the CLI interface for the batch analysis pipeline.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;

//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Reading-session tab time analysis.
///
/// Reconstructs per-participant attention timelines from exported
/// browser event logs, attributes session time to activities, and
/// cross-checks the result against independently recorded durations.
#[derive(Debug, Parser)]
#[command(name = "tabtime", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconstruct timelines and write the per-participant tab time table.
    Tabs,

    /// Check reconstructed timelines against the consistency invariants.
    Verify {
        /// Only check participants in this study condition (repeatable).
        #[arg(long)]
        condition: Vec<String>,
    },

    /// Analyze reading patterns by study condition and write a report.
    Patterns,
}

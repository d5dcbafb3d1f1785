//! Tabs command: reconstruct timelines and write the merge table.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use tabtime_core::{BatchSummary, reconstruct_all};
use tabtime_tables::write_tab_times;

use super::inputs;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let inputs = inputs::load(config)?;
    let result = reconstruct_all(&inputs.events, &inputs.anchors, &config.verify_config());

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;
    let table_path = config.output_dir.join("tab_times.csv");
    write_tab_times(&table_path, &result.outcomes)
        .with_context(|| format!("failed to write {}", table_path.display()))?;

    write!(writer, "{}", format_summary(&result.summary, &table_path))?;
    Ok(())
}

/// Formats the run summary printed after the table is written.
#[must_use]
pub fn format_summary(summary: &BatchSummary, table_path: &Path) -> String {
    let mut output = String::new();
    writeln!(output, "Tab times written to {}", table_path.display()).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "  participants: {}", summary.processed).unwrap();
    if summary.skipped > 0 {
        writeln!(
            output,
            "  skipped (no usable timestamps): {}",
            summary.skipped
        )
        .unwrap();
    }
    if summary.fallback > 0 {
        writeln!(
            output,
            "  unanchored fallback (approximate totals): {}",
            summary.fallback
        )
        .unwrap();
    }
    output
}

//! Verify command: invariant checks over all reconstructed timelines.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;

use tabtime_core::{BatchResult, reconstruct_all};

use super::inputs;
use super::util::format_ms;
use crate::Config;

/// Per-participant detail lines kept in the report.
const MAX_DETAIL_LINES: usize = 5;

pub fn run<W: Write>(writer: &mut W, config: &Config, conditions: &[String]) -> Result<()> {
    let mut inputs = inputs::load(config)?;

    if !conditions.is_empty() {
        let by_condition = inputs::load_conditions(config)?;
        inputs
            .events
            .retain(|pid, _| by_condition.get(pid).is_some_and(|c| conditions.contains(c)));
        inputs
            .anchors
            .retain(|pid, _| inputs.events.contains_key(pid));
        tracing::debug!(
            retained = inputs.events.len(),
            ?conditions,
            "filtered participants by condition"
        );
    }

    let result = reconstruct_all(&inputs.events, &inputs.anchors, &config.verify_config());
    write!(writer, "{}", format_report(&result, config))?;
    Ok(())
}

/// Formats the verification report. Findings are for human review;
/// the command succeeds regardless of their count.
#[must_use]
pub fn format_report(result: &BatchResult, config: &Config) -> String {
    let summary = &result.summary;
    let mut output = String::new();

    writeln!(output, "Verification report").unwrap();
    writeln!(output, "===================").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "participants checked: {}", summary.processed).unwrap();
    if summary.skipped > 0 {
        writeln!(
            output,
            "skipped (no usable timestamps): {}",
            summary.skipped
        )
        .unwrap();
    }
    if summary.fallback > 0 {
        writeln!(
            output,
            "unanchored (duration not checkable): {}",
            summary.fallback
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "invariant failures:").unwrap();
    writeln!(output, "  overlapping segments: {}", summary.overlap_failures).unwrap();
    writeln!(
        output,
        "  gaps beyond {} ms: {}",
        config.gap_tolerance_ms, summary.gap_failures
    )
    .unwrap();
    writeln!(
        output,
        "  duration mismatch beyond {} ms: {}",
        config.duration_tolerance_ms, summary.duration_failures
    )
    .unwrap();

    if !summary.worst_offenders.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "worst duration offenders:").unwrap();
        for (pid, delta) in &summary.worst_offenders {
            writeln!(output, "  {pid}  {delta:+.0} ms ({})", format_ms(*delta)).unwrap();
        }
    }

    let failing: Vec<_> = result
        .outcomes
        .iter()
        .filter_map(|(pid, outcome)| {
            outcome
                .check
                .as_ref()
                .filter(|check| !check.passed())
                .map(|check| (pid, check))
        })
        .take(MAX_DETAIL_LINES)
        .collect();

    if failing.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "all anchored timelines passed.").unwrap();
    } else {
        writeln!(output).unwrap();
        writeln!(output, "details:").unwrap();
        for (pid, check) in failing {
            writeln!(
                output,
                "  {pid}: duration delta {:+.0} ms, gaps {}, overlap {}",
                check.duration_delta_ms,
                check.gaps.len(),
                if check.overlap { "yes" } else { "no" }
            )
            .unwrap();
            if !check.focus_deltas.is_empty() {
                let diffs: Vec<String> = check
                    .focus_deltas
                    .iter()
                    .map(|(activity, delta)| format!("{activity} {delta:+.0} ms"))
                    .collect();
                writeln!(
                    output,
                    "      recorded focus time deltas: {}",
                    diffs.join(", ")
                )
                .unwrap();
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_fixture(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    /// p1 reconstructs cleanly; p2's trailing switch falls past the
    /// recorded window, so its summed duration overshoots.
    fn fixture_config(temp: &tempfile::TempDir) -> Config {
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(&data_dir).unwrap();
        write_fixture(
            &data_dir,
            "reading_events.csv",
            "participantId,timestamp,eventType,to\n\
             p1,0,focus_switch,chat\n\
             p1,900,focus_switch,reading\n\
             p2,0,scroll_action,\n\
             p2,10000,focus_switch,chat\n",
        );
        write_fixture(
            &data_dir,
            "reading_summary.csv",
            "participantId,duration,focusTime_reading,focusTime_chat\n\
             p1,1000,100,900\n\
             p2,5000,4000,1000\n",
        );
        write_fixture(
            &data_dir,
            "experiments.csv",
            "participantId,condition\np1,with_llm\np2,without_llm\n",
        );
        Config {
            data_dir,
            output_dir: temp.path().join("out"),
            ..Config::default()
        }
    }

    #[test]
    fn report_counts_duration_failures() {
        let temp = tempfile::tempdir().unwrap();
        let config = fixture_config(&temp);

        let mut output = Vec::new();
        run(&mut output, &config, &[]).unwrap();
        let report = String::from_utf8(output).unwrap();

        assert!(report.contains("participants checked: 2"));
        assert!(report.contains("overlapping segments: 0"));
        assert!(report.contains("duration mismatch beyond 100 ms: 1"));
        assert!(report.contains("p2  +5000 ms (5.0s)"));
        assert!(report.contains("p2: duration delta +5000 ms"));
    }

    /// p2's reconstructed totals are all reading, so the report shows how
    /// far they drift from the live focus-time counters.
    #[test]
    fn report_lists_focus_time_deltas_for_failures() {
        let temp = tempfile::tempdir().unwrap();
        let config = fixture_config(&temp);

        let mut output = Vec::new();
        run(&mut output, &config, &[]).unwrap();
        let report = String::from_utf8(output).unwrap();

        assert!(report.contains("recorded focus time deltas: reading +6000 ms, chat -1000 ms"));
    }

    #[test]
    fn condition_filter_restricts_participants() {
        let temp = tempfile::tempdir().unwrap();
        let config = fixture_config(&temp);

        let mut output = Vec::new();
        run(&mut output, &config, &["with_llm".to_string()]).unwrap();
        let report = String::from_utf8(output).unwrap();

        assert!(report.contains("participants checked: 1"));
        assert!(report.contains("all anchored timelines passed."));
        assert!(!report.contains("p2"));
    }
}

//! Patterns command: reading-pattern analysis by study condition.
//!
//! Compares how participants split their attention across conditions:
//! the share of classified reading within all classified interaction,
//! and mean section pause times, with a one-way ANOVA across conditions
//! and a correlation of the two measures across all participants.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use tabtime_core::stats::{
    describe, linear_regression, one_way_anova, pearson, significance_marker, spearman,
};
use tabtime_core::{Event, ParticipantId};
use tabtime_tables::{SummaryRow, parse_ms};

use super::inputs;
use crate::Config;

/// Per-condition samples extracted from the input tables.
#[derive(Debug, Default)]
pub struct ConditionSamples {
    /// Classified reading time over all classified interaction, one
    /// value per participant.
    pub reading_ratios: Vec<f64>,
    /// Mean pause duration per participant, milliseconds.
    pub mean_pauses_ms: Vec<f64>,
}

/// Paired per-participant measures, pooled across conditions.
#[derive(Debug, Default)]
pub struct PairedMeasures {
    /// Reading ratio per participant.
    pub reading_ratios: Vec<f64>,
    /// That participant's mean pause duration, milliseconds.
    pub mean_pauses_ms: Vec<f64>,
}

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let inputs = inputs::load(config)?;
    let conditions = inputs::load_conditions(config)?;

    let groups = collect_samples(&inputs.summaries, &inputs.events, &conditions);
    let pairs = collect_pairs(&inputs.summaries, &inputs.events);
    let report = format_report(&groups, &pairs, Utc::now());

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;
    let report_path = config.output_dir.join("reading_patterns.md");
    std::fs::write(&report_path, &report)
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    writeln!(
        writer,
        "Reading pattern report written to {}",
        report_path.display()
    )?;
    Ok(())
}

/// Share of classified reading within all classified interaction.
///
/// Missing classification totals count as zero; `None` when the
/// participant has no classified interaction at all.
#[must_use]
pub fn reading_ratio(row: &SummaryRow) -> Option<f64> {
    let reading = parse_ms(&row.reading_total_duration).unwrap_or(0.0);
    let scanning = parse_ms(&row.scanning_total_duration).unwrap_or(0.0);
    let scrolling = parse_ms(&row.scrolling_total_duration).unwrap_or(0.0);
    let total = reading + scanning + scrolling;
    if total > 0.0 { Some(reading / total) } else { None }
}

/// Mean pause duration across a participant's events, if any carry one.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "event counts are small")]
pub fn mean_pause_ms(events: &[Event]) -> Option<f64> {
    let pauses: Vec<f64> = events.iter().filter_map(|e| e.pause_duration).collect();
    if pauses.is_empty() {
        return None;
    }
    Some(pauses.iter().sum::<f64>() / pauses.len() as f64)
}

/// Groups per-participant measures by study condition.
///
/// Participants without a condition assignment are dropped.
#[must_use]
pub fn collect_samples(
    summaries: &[SummaryRow],
    events: &BTreeMap<ParticipantId, Vec<Event>>,
    conditions: &BTreeMap<ParticipantId, String>,
) -> BTreeMap<String, ConditionSamples> {
    let mut groups: BTreeMap<String, ConditionSamples> = BTreeMap::new();

    for row in summaries {
        let Ok(pid) = ParticipantId::new(row.participant_id.clone()) else {
            continue;
        };
        let Some(condition) = conditions.get(&pid) else {
            continue;
        };
        if let Some(ratio) = reading_ratio(row) {
            groups
                .entry(condition.clone())
                .or_default()
                .reading_ratios
                .push(ratio);
        }
    }

    for (pid, participant_events) in events {
        let Some(condition) = conditions.get(pid) else {
            continue;
        };
        if let Some(mean) = mean_pause_ms(participant_events) {
            groups
                .entry(condition.clone())
                .or_default()
                .mean_pauses_ms
                .push(mean);
        }
    }

    groups
}

/// Joins both measures by participant, condition-blind.
///
/// Only participants with a reading ratio and at least one pause event
/// contribute a pair.
#[must_use]
pub fn collect_pairs(
    summaries: &[SummaryRow],
    events: &BTreeMap<ParticipantId, Vec<Event>>,
) -> PairedMeasures {
    let mut pairs = PairedMeasures::default();
    for row in summaries {
        let Ok(pid) = ParticipantId::new(row.participant_id.clone()) else {
            continue;
        };
        let Some(ratio) = reading_ratio(row) else {
            continue;
        };
        let Some(mean) = events.get(&pid).and_then(|e| mean_pause_ms(e)) else {
            continue;
        };
        pairs.reading_ratios.push(ratio);
        pairs.mean_pauses_ms.push(mean);
    }
    pairs
}

/// Renders the Markdown report.
#[must_use]
pub fn format_report(
    groups: &BTreeMap<String, ConditionSamples>,
    pairs: &PairedMeasures,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    writeln!(output, "# Reading patterns").unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "Generated: {}",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
    .unwrap();

    writeln!(output).unwrap();
    writeln!(output, "## Reading ratio by condition").unwrap();
    writeln!(output).unwrap();
    write_measure_section(&mut output, groups, |samples| &samples.reading_ratios, 3);

    writeln!(output).unwrap();
    writeln!(output, "## Mean pause time by condition (ms)").unwrap();
    writeln!(output).unwrap();
    write_measure_section(&mut output, groups, |samples| &samples.mean_pauses_ms, 1);

    writeln!(output).unwrap();
    writeln!(output, "## Reading ratio vs mean pause time").unwrap();
    writeln!(output).unwrap();
    output.push_str(&association_section(
        &pairs.reading_ratios,
        &pairs.mean_pauses_ms,
    ));

    output
}

/// Correlation and regression lines for the paired measures, or a note
/// when too few pairs exist.
#[must_use]
pub fn association_section(x: &[f64], y: &[f64]) -> String {
    let (Some(r), Some(rho), Some(fit)) = (pearson(x, y), spearman(x, y), linear_regression(x, y))
    else {
        return "Insufficient paired observations for correlation (need 3 or more).\n".to_string();
    };

    let mut output = String::new();
    writeln!(output, "n = {} paired participants", r.n).unwrap();
    let r_marker = significance_marker(r.p);
    writeln!(output, "Pearson r = {:.3}, p = {:.4}{r_marker}", r.r, r.p).unwrap();
    let rho_marker = significance_marker(rho.p);
    writeln!(
        output,
        "Spearman rho = {:.3}, p = {:.4}{rho_marker}",
        rho.r, rho.p
    )
    .unwrap();
    writeln!(
        output,
        "Regression: pause_ms = {:.1} * ratio + {:.1}, r-squared = {:.3}",
        fit.slope, fit.intercept, fit.r_squared
    )
    .unwrap();
    output
}

/// Writes a descriptives table and ANOVA line for one measure.
fn write_measure_section(
    output: &mut String,
    groups: &BTreeMap<String, ConditionSamples>,
    measure: impl Fn(&ConditionSamples) -> &Vec<f64>,
    decimals: usize,
) {
    writeln!(output, "| condition | n | mean | sd | min | max |").unwrap();
    writeln!(output, "|---|--:|--:|--:|--:|--:|").unwrap();

    let mut samples_with_data = Vec::new();
    for (condition, samples) in groups {
        let values = measure(samples);
        let Some(stats) = describe(values) else {
            writeln!(output, "| {condition} | 0 | - | - | - | - |").unwrap();
            continue;
        };
        writeln!(
            output,
            "| {condition} | {} | {:.decimals$} | {:.decimals$} | {:.decimals$} | {:.decimals$} |",
            stats.n, stats.mean, stats.sd, stats.min, stats.max,
        )
        .unwrap();
        samples_with_data.push(values.clone());
    }

    writeln!(output).unwrap();
    writeln!(output, "{}", anova_line(&samples_with_data)).unwrap();
}

/// One-line ANOVA result, or a note when the comparison is degenerate.
#[must_use]
pub fn anova_line(groups: &[Vec<f64>]) -> String {
    let Some(anova) = one_way_anova(groups) else {
        return "One-way ANOVA: insufficient data (need two or more conditions with samples)."
            .to_string();
    };
    format!(
        "One-way ANOVA: F({}, {}) = {:.2}, p = {:.4}{}, eta-squared = {:.3} ({})",
        anova.df_between,
        anova.df_within,
        anova.f,
        anova.p,
        significance_marker(anova.p),
        anova.eta_squared,
        anova.effect_size_label(),
    )
}

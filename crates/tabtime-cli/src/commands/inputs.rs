//! Shared input loading for the analysis commands.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use tabtime_core::{Event, ParticipantId, SessionAnchor};
use tabtime_tables::{SummaryRow, anchors_from_summaries, events_by_participant};

use crate::Config;

/// Everything the analysis commands read from the data directory.
#[derive(Debug)]
pub struct Inputs {
    /// Per-participant event streams, sorted by timestamp.
    pub events: BTreeMap<ParticipantId, Vec<Event>>,
    /// Session anchors for participants with a recorded duration.
    pub anchors: BTreeMap<ParticipantId, SessionAnchor>,
    /// Raw summary rows, kept for the classification totals.
    pub summaries: Vec<SummaryRow>,
}

/// Loads the event and summary tables from the configured data directory.
pub fn load(config: &Config) -> Result<Inputs> {
    let events_path = config.events_path();
    let event_rows = tabtime_tables::load_event_rows(&events_path)
        .with_context(|| format!("failed to load {}", events_path.display()))?;

    let summary_path = config.summary_path();
    let summaries = tabtime_tables::load_summary_rows(&summary_path)
        .with_context(|| format!("failed to load {}", summary_path.display()))?;

    let events = events_by_participant(&event_rows);
    let anchors = anchors_from_summaries(&summaries);
    tracing::debug!(
        participants = events.len(),
        anchored = anchors.len(),
        "loaded input tables"
    );

    Ok(Inputs {
        events,
        anchors,
        summaries,
    })
}

/// Loads the participant → condition map from `experiments.csv`.
pub fn load_conditions(config: &Config) -> Result<BTreeMap<ParticipantId, String>> {
    let path = config.experiments_path();
    tabtime_tables::load_conditions(&path)
        .with_context(|| format!("failed to load {}", path.display()))
}

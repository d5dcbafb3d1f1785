//! Delimited-table layer for the tab time pipeline.
//!
//! Reads the flattened CSV exports produced by the acquisition step
//! (`reading_events.csv`, `reading_summary.csv`, `experiments.csv`) into
//! the core event model, and writes the merged per-participant output
//! table. Malformed rows are skipped with a debug log; malformed numeric
//! fields coerce to absent and never abort a load.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use tabtime_core::{
    Activity, Event, ParticipantId, ParticipantOutcome, ReconstructionMode, SessionAnchor,
    SwitchTarget, sort_by_timestamp,
};

/// Errors reading or writing a table file.
///
/// Only whole-file problems surface here; field-level damage is absorbed
/// by [`parse_ms`] and row skipping.
#[derive(Debug, Error)]
pub enum TableError {
    /// Underlying file I/O failure.
    #[error("table I/O failed")]
    Io(#[from] std::io::Error),

    /// The file is not a readable CSV table.
    #[error("malformed table")]
    Csv(#[from] csv::Error),
}

/// Parses an exported numeric field as milliseconds.
///
/// Empty fields, the literal `"None"` the exporter writes for missing
/// values, and anything unparseable all yield `None`. Callers decide per
/// site whether absent means zero, skip, or exclude.
#[must_use]
pub fn parse_ms(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "None" {
        return None;
    }
    trimmed.parse().ok()
}

// ===== Input rows =====

/// One row of `reading_events.csv`, fields as exported.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRow {
    #[serde(rename = "participantId")]
    pub participant_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(rename = "eventType", default)]
    pub event_type: String,
    #[serde(default)]
    pub to: String,
    #[serde(rename = "from", default)]
    pub from_tab: String,
    #[serde(rename = "pauseDuration", default)]
    pub pause_duration: String,
    #[serde(rename = "scrollDuration", default)]
    pub scroll_duration: String,
    #[serde(rename = "timeSinceLast", default)]
    pub time_since_last: String,
    #[serde(rename = "sectionBeforeScroll", default)]
    pub section_before_scroll: String,
    #[serde(default)]
    pub classification: String,
}

impl EventRow {
    /// Converts to the core event model with try-parse coercion.
    #[must_use]
    pub fn to_event(&self) -> Event {
        Event {
            timestamp: parse_ms(&self.timestamp),
            kind: self.event_type.parse().ok(),
            to: SwitchTarget::parse(Some(self.to.as_str())),
            pause_duration: parse_ms(&self.pause_duration),
            time_since_last: parse_ms(&self.time_since_last),
        }
    }
}

/// One row of `reading_summary.csv` (the session anchor table).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "participantId")]
    pub participant_id: String,
    #[serde(default)]
    pub duration: String,
    #[serde(rename = "focusTime_reading", default)]
    pub focus_time_reading: String,
    #[serde(rename = "focusTime_chat", default)]
    pub focus_time_chat: String,
    #[serde(rename = "reading_totalDuration", default)]
    pub reading_total_duration: String,
    #[serde(rename = "scanning_totalDuration", default)]
    pub scanning_total_duration: String,
    #[serde(rename = "scrolling_totalDuration", default)]
    pub scrolling_total_duration: String,
}

/// One row of `experiments.csv`; maps participants to study conditions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperimentRow {
    #[serde(rename = "participantId")]
    pub participant_id: String,
    #[serde(default)]
    pub condition: String,
}

/// Loads rows from a CSV table, skipping rows that fail to deserialize.
fn load_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, TableError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for (index, result) in reader.deserialize().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                // Header is line 1, first record line 2.
                tracing::debug!(line = index + 2, error = %e, "skipping malformed row");
            }
        }
    }
    Ok(rows)
}

/// Loads `reading_events.csv`.
pub fn load_event_rows(path: &Path) -> Result<Vec<EventRow>, TableError> {
    load_rows(path)
}

/// Loads `reading_summary.csv`.
pub fn load_summary_rows(path: &Path) -> Result<Vec<SummaryRow>, TableError> {
    load_rows(path)
}

/// Loads `experiments.csv` into a participant → condition map.
pub fn load_conditions(path: &Path) -> Result<BTreeMap<ParticipantId, String>, TableError> {
    let rows: Vec<ExperimentRow> = load_rows(path)?;
    let mut map = BTreeMap::new();
    for row in rows {
        if row.condition.is_empty() {
            continue;
        }
        if let Ok(pid) = ParticipantId::new(row.participant_id) {
            map.insert(pid, row.condition);
        }
    }
    Ok(map)
}

/// Groups event rows by participant with events sorted by timestamp.
///
/// Rows without a participant ID are dropped. Events are never mutated
/// after this point.
#[must_use]
pub fn events_by_participant(rows: &[EventRow]) -> BTreeMap<ParticipantId, Vec<Event>> {
    let mut map: BTreeMap<ParticipantId, Vec<Event>> = BTreeMap::new();
    for row in rows {
        let Ok(pid) = ParticipantId::new(row.participant_id.clone()) else {
            tracing::debug!("skipping event row without participant ID");
            continue;
        };
        map.entry(pid).or_default().push(row.to_event());
    }
    for events in map.values_mut() {
        sort_by_timestamp(events);
    }
    map
}

/// Extracts session anchors from summary rows.
///
/// Rows without a parseable `duration` yield no anchor; those
/// participants fall back to unanchored reconstruction downstream.
#[must_use]
pub fn anchors_from_summaries(rows: &[SummaryRow]) -> BTreeMap<ParticipantId, SessionAnchor> {
    let mut map = BTreeMap::new();
    for row in rows {
        let Ok(pid) = ParticipantId::new(row.participant_id.clone()) else {
            continue;
        };
        let Some(duration_ms) = parse_ms(&row.duration) else {
            tracing::debug!(participant = %pid, "summary row without duration, no anchor");
            continue;
        };
        let mut anchor = SessionAnchor::new(duration_ms);
        if let Some(ms) = parse_ms(&row.focus_time_reading) {
            anchor.focus_times.insert(Activity::Reading, ms);
        }
        if let Some(ms) = parse_ms(&row.focus_time_chat) {
            anchor.focus_times.insert(Activity::Chat, ms);
        }
        map.insert(pid, anchor);
    }
    map
}

// ===== Output =====

/// Writes the merged per-participant tab time table.
///
/// One row per reconstructed participant: per-activity totals (ms) and
/// ratios, the overall total, and which variant produced the result.
pub fn write_tab_times(
    path: &Path,
    outcomes: &BTreeMap<ParticipantId, ParticipantOutcome>,
) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["participantId".to_string()];
    for activity in Activity::ALL {
        header.push(format!("tabTime_{activity}"));
    }
    for activity in Activity::ALL {
        header.push(format!("tabRatio_{activity}"));
    }
    header.push("tabTime_total".to_string());
    header.push("reconstruction".to_string());
    writer.write_record(&header)?;

    for (pid, outcome) in outcomes {
        let mut record = vec![pid.to_string()];
        for activity in Activity::ALL {
            record.push(format!("{:.1}", outcome.totals.get(activity)));
        }
        for activity in Activity::ALL {
            record.push(format!("{:.4}", outcome.totals.ratio(activity)));
        }
        record.push(format!("{:.1}", outcome.totals.total_ms()));
        record.push(
            match outcome.reconstruction.mode {
                ReconstructionMode::Anchored => "anchored",
                ReconstructionMode::Fallback => "fallback",
            }
            .to_string(),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

//! Segment reconstruction: the time-attribution engine.
//!
//! Rebuilds one participant's session timeline as an ordered, contiguous,
//! non-overlapping sequence of attention segments from switch events.
//!
//! # Algorithm Summary
//!
//! 1. Find the span of valid event timestamps
//! 2. Anchor the session window to the independently recorded duration
//!    (the instrumentation clock starts before the first logged event)
//! 3. Scan switch events in order, closing a segment at each boundary;
//!    the session starts in `reading` before any switch

use std::collections::BTreeMap;

use thiserror::Error;

use crate::activity::Activity;
use crate::event::Event;

/// A derived, half-open interval `[start, end)` attributed to one activity.
///
/// Segments exist only for the duration of one aggregation pass; they are
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Milliseconds since epoch, inclusive.
    pub start: f64,
    /// Milliseconds since epoch, exclusive.
    pub end: f64,
    /// The activity this interval is attributed to.
    pub tab: Activity,
}

impl Segment {
    /// Length of the interval in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.end - self.start
    }
}

/// Independently recorded ground truth for one participant's session.
///
/// Supplied by the live instrumentation, never derived from events. The
/// per-activity focus totals are used only for cross-validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnchor {
    /// Total elapsed milliseconds of the reading phase.
    pub duration_ms: f64,
    /// Per-activity focus totals recorded live (ms).
    pub focus_times: BTreeMap<Activity, f64>,
}

impl SessionAnchor {
    /// An anchor with a recorded duration and no focus totals.
    #[must_use]
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            focus_times: BTreeMap::new(),
        }
    }
}

/// Which reconstruction variant produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructionMode {
    /// Window anchored to the recorded session duration.
    Anchored,
    /// No anchor available: the window is the raw event span and the
    /// totals are approximate.
    Fallback,
}

/// The reconstructed timeline for one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// Segments ordered by start, covering the window by construction.
    pub segments: Vec<Segment>,
    /// Start of the reconstructed window (ms since epoch).
    pub session_start: f64,
    /// End of the reconstructed window, exclusive.
    pub session_end: f64,
    /// Variant that produced this result.
    pub mode: ReconstructionMode,
    /// True when the recorded duration was shorter than the event span,
    /// so the extrapolated lead-in was clamped to zero instead of
    /// producing a reversed interval. The duration invariant cannot hold
    /// for such a session; the verifier surfaces the shortfall.
    pub lead_in_clamped: bool,
}

/// Errors reconstructing a single participant. Handled by skip-and-continue
/// at the batch level, never fatal to a run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconstructError {
    /// The participant has no event with a parseable timestamp.
    #[error("no events with a valid timestamp")]
    InsufficientData,
}

/// Reconstructs the segment partition of one participant's session.
///
/// Events must be sorted by timestamp ascending
/// (see [`crate::event::sort_by_timestamp`]).
///
/// With an anchor, the window is extrapolated backwards from the first
/// event so its length equals the recorded duration: the instrumentation
/// starts its clock slightly before the first event fires, and the event
/// span alone under-counts the session. Without an anchor the window is
/// the raw event span.
///
/// Switch events close the current segment and retag via their `to`
/// field; the `phase_complete` sentinel and blank or unrecognized labels
/// leave the tag unchanged while still advancing the boundary. Degenerate
/// steps (duplicate or out-of-order timestamps) emit no segment.
pub fn reconstruct(
    events: &[Event],
    anchor: Option<&SessionAnchor>,
) -> Result<Reconstruction, ReconstructError> {
    let mut first_ts = f64::INFINITY;
    let mut last_ts = f64::NEG_INFINITY;
    for ts in events.iter().filter_map(|e| e.timestamp) {
        first_ts = first_ts.min(ts);
        last_ts = last_ts.max(ts);
    }
    if !first_ts.is_finite() {
        return Err(ReconstructError::InsufficientData);
    }

    let (session_start, session_end, mode, lead_in_clamped) = match anchor {
        Some(anchor) => {
            let event_span = last_ts - first_ts;
            let lead_in = anchor.duration_ms - event_span;
            if lead_in < 0.0 {
                // Recorded duration shorter than the event span: the
                // extrapolation would place the window start after the
                // first event. Clamp and flag.
                tracing::debug!(
                    shortfall_ms = -lead_in,
                    "recorded duration shorter than event span, clamping lead-in"
                );
                (
                    first_ts,
                    first_ts + anchor.duration_ms,
                    ReconstructionMode::Anchored,
                    true,
                )
            } else {
                let start = first_ts - lead_in;
                (
                    start,
                    start + anchor.duration_ms,
                    ReconstructionMode::Anchored,
                    false,
                )
            }
        }
        None => (first_ts, last_ts, ReconstructionMode::Fallback, false),
    };

    let mut segments = Vec::new();
    // Every session is defined to start in the reading activity.
    let mut current_tab = Activity::Reading;
    let mut segment_start = session_start;

    for event in events {
        if !event.is_switch() {
            continue;
        }
        let Some(ts) = event.timestamp else {
            continue;
        };

        if ts > segment_start {
            segments.push(Segment {
                start: segment_start,
                end: ts,
                tab: current_tab,
            });
        }
        // ts <= segment_start: degenerate zero or negative step, dropped.

        if let Some(tab) = event.to.tab() {
            current_tab = tab;
        }
        segment_start = ts;
    }

    // Final segment from the last switch to the session end.
    if session_end > segment_start {
        segments.push(Segment {
            start: segment_start,
            end: session_end,
            tab: current_tab,
        });
    }

    Ok(Reconstruction {
        segments,
        session_start,
        session_end,
        mode,
        lead_in_clamped,
    })
}

//! Batch driver: independent per-participant reconstruction.
//!
//! Each participant's events and anchor are self-contained, so the batch
//! is a parallel map with no shared mutable state; results merge into a
//! participant-keyed map without locking. The only per-participant
//! failure mode is insufficient data, handled by skip-and-continue.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::aggregate::ActivityTotals;
use crate::event::Event;
use crate::segment::{
    ReconstructError, Reconstruction, ReconstructionMode, SessionAnchor, reconstruct,
};
use crate::types::ParticipantId;
use crate::verify::{self, SegmentCheck, VerifyConfig};

/// Worst duration offenders kept in the summary.
pub const MAX_WORST_OFFENDERS: usize = 5;

/// Everything derived for one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantOutcome {
    /// The reconstructed timeline.
    pub reconstruction: Reconstruction,
    /// Per-activity totals aggregated from the segments.
    pub totals: ActivityTotals,
    /// Invariant check; present only when an anchor existed.
    pub check: Option<SegmentCheck>,
}

/// Tallies accumulated over one batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    /// Participants reconstructed.
    pub processed: usize,
    /// Participants with no valid timestamps, skipped.
    pub skipped: usize,
    /// Participants reconstructed without an anchor (approximate totals).
    pub fallback: usize,
    /// Participants with intersecting segments.
    pub overlap_failures: usize,
    /// Participants with at least one gap beyond tolerance.
    pub gap_failures: usize,
    /// Participants whose summed duration missed the recorded duration.
    pub duration_failures: usize,
    /// Largest duration deltas, biggest magnitude first, at most
    /// [`MAX_WORST_OFFENDERS`].
    pub worst_offenders: Vec<(ParticipantId, f64)>,
}

/// Result of a batch reconstruction run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// Per-participant outcomes, ordered by participant ID.
    pub outcomes: BTreeMap<ParticipantId, ParticipantOutcome>,
    /// Run-level tallies.
    pub summary: BatchSummary,
}

/// Reconstructs, aggregates, and checks every participant.
///
/// Participants without an anchor fall back to the unanchored variant;
/// participants without a valid timestamp are counted as skipped and
/// excluded from the outcome map. Deterministic for fixed input.
pub fn reconstruct_all(
    events_by_participant: &BTreeMap<ParticipantId, Vec<Event>>,
    anchors: &BTreeMap<ParticipantId, SessionAnchor>,
    config: &VerifyConfig,
) -> BatchResult {
    // Parallel map: each worker owns exactly one participant's slice.
    let per_participant: Vec<(ParticipantId, Result<ParticipantOutcome, ReconstructError>)> =
        events_by_participant
            .par_iter()
            .map(|(pid, events)| {
                let anchor = anchors.get(pid);
                let outcome = reconstruct(events, anchor).map(|reconstruction| {
                    let totals = ActivityTotals::from_segments(&reconstruction.segments);
                    let check =
                        anchor.map(|a| verify::check(&reconstruction.segments, a, config));
                    ParticipantOutcome {
                        reconstruction,
                        totals,
                        check,
                    }
                });
                (pid.clone(), outcome)
            })
            .collect();

    let mut outcomes = BTreeMap::new();
    let mut summary = BatchSummary::default();
    let mut offenders: Vec<(ParticipantId, f64)> = Vec::new();

    for (pid, result) in per_participant {
        match result {
            Ok(outcome) => {
                summary.processed += 1;
                if outcome.reconstruction.mode == ReconstructionMode::Fallback {
                    summary.fallback += 1;
                }
                if let Some(check) = &outcome.check {
                    if check.overlap {
                        summary.overlap_failures += 1;
                    }
                    if !check.gaps.is_empty() {
                        summary.gap_failures += 1;
                    }
                    if !check.duration_ok {
                        summary.duration_failures += 1;
                        offenders.push((pid.clone(), check.duration_delta_ms));
                    }
                }
                outcomes.insert(pid, outcome);
            }
            Err(ReconstructError::InsufficientData) => {
                tracing::debug!(participant = %pid, "skipping: no valid timestamps");
                summary.skipped += 1;
            }
        }
    }

    offenders.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    offenders.truncate(MAX_WORST_OFFENDERS);
    summary.worst_offenders = offenders;

    BatchResult { outcomes, summary }
}

#[cfg(test)]
#[expect(clippy::float_cmp, reason = "fixture durations are exact")]
mod tests {
    use super::*;
    use crate::activity::{Activity, SwitchTarget};
    use crate::event::EventType;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s).unwrap()
    }

    fn switch(ts: f64, to: &str) -> Event {
        Event {
            timestamp: Some(ts),
            kind: Some(EventType::FocusSwitch),
            to: SwitchTarget::parse(Some(to)),
            pause_duration: None,
            time_since_last: None,
        }
    }

    fn scroll(ts: Option<f64>) -> Event {
        Event {
            timestamp: ts,
            kind: Some(EventType::ScrollAction),
            to: SwitchTarget::Blank,
            pause_duration: None,
            time_since_last: None,
        }
    }

    fn fixture() -> (
        BTreeMap<ParticipantId, Vec<Event>>,
        BTreeMap<ParticipantId, SessionAnchor>,
    ) {
        let mut events = BTreeMap::new();
        let mut anchors = BTreeMap::new();

        // Clean anchored participant, with live focus times slightly off
        // the reconstructed totals.
        events.insert(pid("p1"), vec![switch(0.0, "chat"), scroll(Some(900.0))]);
        let mut p1_anchor = SessionAnchor::new(1000.0);
        p1_anchor.focus_times.insert(Activity::Reading, 80.0);
        p1_anchor.focus_times.insert(Activity::Chat, 920.0);
        anchors.insert(pid("p1"), p1_anchor);

        // Recorded duration 5s shorter than the event span: the lead-in
        // clamps and the switch past the window end inflates the sum.
        events.insert(pid("p2"), vec![scroll(Some(0.0)), switch(10_000.0, "chat")]);
        anchors.insert(pid("p2"), SessionAnchor::new(5000.0));

        // No anchor: fallback reconstruction.
        events.insert(
            pid("p3"),
            vec![scroll(Some(0.0)), switch(400.0, "video"), scroll(Some(1000.0))],
        );

        // No valid timestamps: skipped.
        events.insert(pid("p4"), vec![scroll(None)]);

        (events, anchors)
    }

    #[test]
    fn batch_tallies_skips_fallbacks_and_failures() {
        let (events, anchors) = fixture();
        let result = reconstruct_all(&events, &anchors, &VerifyConfig::default());

        assert_eq!(result.summary.processed, 3);
        assert_eq!(result.summary.skipped, 1);
        assert_eq!(result.summary.fallback, 1);
        assert_eq!(result.summary.duration_failures, 1);
        assert_eq!(result.summary.overlap_failures, 0);
        assert_eq!(result.summary.gap_failures, 0);
        assert!(!result.outcomes.contains_key(&pid("p4")));

        // p2: the single reading segment runs to the late switch, so the
        // sum overshoots the recorded duration by the 5s clamp shortfall.
        let p2 = &result.outcomes[&pid("p2")];
        assert!(p2.reconstruction.lead_in_clamped);
        let check = p2.check.as_ref().unwrap();
        assert!(!check.duration_ok);
        assert_eq!(check.duration_delta_ms, 5000.0);
        assert_eq!(result.summary.worst_offenders, vec![(pid("p2"), 5000.0)]);
    }

    #[test]
    fn totals_follow_segment_tags() {
        let (events, anchors) = fixture();
        let result = reconstruct_all(&events, &anchors, &VerifyConfig::default());

        let p1 = &result.outcomes[&pid("p1")];
        assert_eq!(p1.totals.get(Activity::Reading), 100.0);
        assert_eq!(p1.totals.get(Activity::Chat), 900.0);
        let check = p1.check.as_ref().unwrap();
        assert_eq!(
            check.focus_deltas,
            vec![(Activity::Reading, 20.0), (Activity::Chat, -20.0)]
        );

        let p3 = &result.outcomes[&pid("p3")];
        assert!(p3.check.is_none());
        assert_eq!(p3.totals.get(Activity::Video), 600.0);
    }

    #[test]
    fn batch_is_deterministic() {
        let (events, anchors) = fixture();
        let a = reconstruct_all(&events, &anchors, &VerifyConfig::default());
        let b = reconstruct_all(&events, &anchors, &VerifyConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn empty_batch_is_all_zero() {
        let result = reconstruct_all(&BTreeMap::new(), &BTreeMap::new(), &VerifyConfig::default());
        assert!(result.outcomes.is_empty());
        assert_eq!(result.summary, BatchSummary::default());
    }
}

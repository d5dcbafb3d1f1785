//! Consistency checks for reconstructed segment lists.
//!
//! Three invariants: no overlapping segments, no gaps between adjacent
//! segments, and the summed duration matches the independently recorded
//! session duration. A fourth comparison diffs reconstructed totals
//! against the live-recorded focus times; those diffs are informational
//! and never gate a pass. Violations are findings for human review,
//! never errors; a batch run always completes.

use crate::activity::Activity;
use crate::aggregate::ActivityTotals;
use crate::segment::{Segment, SessionAnchor};

/// Tolerances for the verifier.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Adjacent segments further apart than this are flagged as a gap.
    /// Absorbs timestamp rounding. Default: 1 ms.
    pub gap_tolerance_ms: f64,

    /// Allowed difference between summed segment durations and the
    /// recorded session duration. Absorbs clock skew between the
    /// instrumentation and the event logger. Default: 100 ms.
    pub duration_tolerance_ms: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            gap_tolerance_ms: 1.0,
            duration_tolerance_ms: 100.0,
        }
    }
}

/// A gap (or overshoot) between two adjacent segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapRecord {
    /// Index of the segment the gap follows.
    pub after_segment: usize,
    /// `next.start - prev.end`; negative when the neighbors overlap.
    pub gap_ms: f64,
}

/// True if any pair of segments intersects.
#[must_use]
pub fn has_overlap(segments: &[Segment]) -> bool {
    for (i, a) in segments.iter().enumerate() {
        for b in &segments[i + 1..] {
            if a.end > b.start && b.end > a.start {
                return true;
            }
        }
    }
    false
}

/// Flags adjacent pairs whose boundary mismatch exceeds the tolerance.
#[must_use]
pub fn find_gaps(segments: &[Segment], tolerance_ms: f64) -> Vec<GapRecord> {
    segments
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let gap_ms = pair[1].start - pair[0].end;
            (gap_ms.abs() > tolerance_ms).then_some(GapRecord {
                after_segment: i,
                gap_ms,
            })
        })
        .collect()
}

/// `sum(durations) - recorded` in milliseconds.
#[must_use]
pub fn duration_delta_ms(segments: &[Segment], recorded_duration_ms: f64) -> f64 {
    let total: f64 = segments.iter().map(Segment::duration_ms).sum();
    total - recorded_duration_ms
}

/// Reconstructed minus recorded total, per activity the instrumentation
/// recorded a focus time for.
///
/// The recorded focus times are cross-validation material only, never a
/// source of truth for reconstruction, so the diffs carry no verdict.
#[must_use]
pub fn focus_time_deltas(
    totals: &ActivityTotals,
    anchor: &SessionAnchor,
) -> Vec<(Activity, f64)> {
    anchor
        .focus_times
        .iter()
        .map(|(&activity, &recorded_ms)| (activity, totals.get(activity) - recorded_ms))
        .collect()
}

/// Outcome of checking one participant's segments against all three
/// invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCheck {
    /// Some pair of segments intersects.
    pub overlap: bool,
    /// Boundary mismatches beyond the gap tolerance.
    pub gaps: Vec<GapRecord>,
    /// Signed difference between summed durations and the recorded
    /// session duration.
    pub duration_delta_ms: f64,
    /// `|duration_delta_ms| <= duration_tolerance_ms`.
    pub duration_ok: bool,
    /// Reconstructed minus recorded per-activity totals, informational.
    pub focus_deltas: Vec<(Activity, f64)>,
}

impl SegmentCheck {
    /// All three invariants hold. Focus-time diffs do not participate.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.overlap && self.gaps.is_empty() && self.duration_ok
    }
}

/// Runs all three checks plus the focus-time comparison against one
/// participant's anchor.
#[must_use]
pub fn check(
    segments: &[Segment],
    anchor: &SessionAnchor,
    config: &VerifyConfig,
) -> SegmentCheck {
    let delta = duration_delta_ms(segments, anchor.duration_ms);
    let totals = ActivityTotals::from_segments(segments);
    SegmentCheck {
        overlap: has_overlap(segments),
        gaps: find_gaps(segments, config.gap_tolerance_ms),
        duration_delta_ms: delta,
        duration_ok: delta.abs() <= config.duration_tolerance_ms,
        focus_deltas: focus_time_deltas(&totals, anchor),
    }
}

#[cfg(test)]
#[expect(clippy::float_cmp, reason = "deltas are exact in fixtures")]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::event::{Event, EventType};
    use crate::segment::{SessionAnchor, reconstruct};

    fn seg(start: f64, end: f64) -> Segment {
        Segment {
            start,
            end,
            tab: Activity::Reading,
        }
    }

    fn switch(ts: f64, to: &str) -> Event {
        Event {
            timestamp: Some(ts),
            kind: Some(EventType::ResourceTabSwitch),
            to: crate::activity::SwitchTarget::parse(Some(to)),
            pause_duration: None,
            time_since_last: None,
        }
    }

    #[test]
    fn clean_reconstruction_passes_all_checks() {
        let events = vec![switch(200.0, "chat"), switch(700.0, "reading")];
        let anchor = SessionAnchor::new(1500.0);
        let r = reconstruct(&events, Some(&anchor)).unwrap();

        let result = check(&r.segments, &anchor, &VerifyConfig::default());
        assert!(result.passed());
        assert_eq!(result.duration_delta_ms, 0.0);
        // No recorded focus times, nothing to diff against.
        assert!(result.focus_deltas.is_empty());
    }

    #[test]
    fn focus_time_deltas_compare_recorded_totals() {
        let segments = vec![
            Segment {
                start: 0.0,
                end: 500.0,
                tab: Activity::Reading,
            },
            Segment {
                start: 500.0,
                end: 1200.0,
                tab: Activity::Chat,
            },
        ];
        let mut anchor = SessionAnchor::new(1200.0);
        anchor.focus_times.insert(Activity::Reading, 450.0);
        anchor.focus_times.insert(Activity::Chat, 760.0);

        let result = check(&segments, &anchor, &VerifyConfig::default());
        assert_eq!(
            result.focus_deltas,
            vec![(Activity::Reading, 50.0), (Activity::Chat, -60.0)]
        );
        // Diffs are informational; the invariants still pass.
        assert!(result.passed());
    }

    #[test]
    fn detects_overlap() {
        let segments = vec![seg(0.0, 600.0), seg(500.0, 1000.0)];
        assert!(has_overlap(&segments));
        // Touching boundaries never intersect: half-open intervals.
        let touching = vec![seg(0.0, 500.0), seg(500.0, 1000.0)];
        assert!(!has_overlap(&touching));
    }

    #[test]
    fn detects_gap_beyond_tolerance() {
        let segments = vec![seg(0.0, 500.0), seg(503.0, 1000.0)];
        let gaps = find_gaps(&segments, 1.0);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].after_segment, 0);
        assert_eq!(gaps[0].gap_ms, 3.0);

        // Sub-tolerance rounding noise is absorbed.
        let near = vec![seg(0.0, 500.0), seg(500.5, 1000.0)];
        assert!(find_gaps(&near, 1.0).is_empty());
    }

    #[test]
    fn duration_shortfall_reported_with_delta() {
        let segments = vec![seg(0.0, 5000.0)];
        let anchor = SessionAnchor::new(10_000.0);
        let result = check(&segments, &anchor, &VerifyConfig::default());
        assert!(!result.duration_ok);
        assert_eq!(result.duration_delta_ms, -5000.0);
        assert!(!result.passed());
    }

    #[test]
    fn duration_within_tolerance_passes() {
        let segments = vec![seg(0.0, 9950.0)];
        let anchor = SessionAnchor::new(10_000.0);
        let result = check(&segments, &anchor, &VerifyConfig::default());
        assert!(result.duration_ok);
    }

    #[test]
    fn empty_segment_list_checks_trivially() {
        assert!(!has_overlap(&[]));
        assert!(find_gaps(&[], 1.0).is_empty());
        assert_eq!(duration_delta_ms(&[], 0.0), 0.0);
    }
}

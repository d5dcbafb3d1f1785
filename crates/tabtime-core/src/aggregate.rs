//! Per-activity duration totals and ratios.

use std::collections::BTreeMap;

use crate::activity::Activity;
use crate::segment::Segment;

/// Mapping from activity label to total attributed duration (ms).
///
/// An order-independent sum over segments. Adjacent segments sharing a
/// label need no coalescing: aggregation is label-keyed, so a split
/// segment contributes the same total as an unsplit one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTotals {
    totals: BTreeMap<Activity, f64>,
}

impl ActivityTotals {
    /// Sums segment durations by label. Empty input yields empty totals.
    #[must_use]
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut totals = BTreeMap::new();
        for segment in segments {
            *totals.entry(segment.tab).or_insert(0.0) += segment.duration_ms();
        }
        Self { totals }
    }

    /// Total milliseconds attributed to `activity`; 0 when it never appeared.
    #[must_use]
    pub fn get(&self, activity: Activity) -> f64 {
        self.totals.get(&activity).copied().unwrap_or(0.0)
    }

    /// Sum over all activities.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.totals.values().sum()
    }

    /// Share of the session attributed to `activity`.
    ///
    /// Defined as 0 when nothing was attributed at all.
    #[must_use]
    pub fn ratio(&self, activity: Activity) -> f64 {
        let total = self.total_ms();
        if total > 0.0 {
            self.get(activity) / total
        } else {
            0.0
        }
    }

    /// True when no segment contributed any time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Iterates totals in activity order.
    pub fn iter(&self) -> impl Iterator<Item = (Activity, f64)> + '_ {
        self.totals.iter().map(|(&activity, &ms)| (activity, ms))
    }
}

#[cfg(test)]
#[expect(clippy::float_cmp, reason = "sums of exact test durations")]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, tab: Activity) -> Segment {
        Segment { start, end, tab }
    }

    #[test]
    fn sums_by_label() {
        let segments = vec![
            seg(0.0, 400.0, Activity::Reading),
            seg(400.0, 700.0, Activity::Chat),
            seg(700.0, 1000.0, Activity::Reading),
        ];
        let totals = ActivityTotals::from_segments(&segments);
        assert_eq!(totals.get(Activity::Reading), 700.0);
        assert_eq!(totals.get(Activity::Chat), 300.0);
        assert_eq!(totals.get(Activity::Video), 0.0);
        assert_eq!(totals.total_ms(), 1000.0);
    }

    #[test]
    fn split_same_label_segments_sum_identically() {
        let split = vec![
            seg(0.0, 300.0, Activity::Reading),
            seg(300.0, 1000.0, Activity::Reading),
        ];
        let whole = vec![seg(0.0, 1000.0, Activity::Reading)];
        assert_eq!(
            ActivityTotals::from_segments(&split).get(Activity::Reading),
            ActivityTotals::from_segments(&whole).get(Activity::Reading),
        );
    }

    #[test]
    fn order_independent() {
        let forward = vec![
            seg(0.0, 500.0, Activity::Reading),
            seg(500.0, 800.0, Activity::Video),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(
            ActivityTotals::from_segments(&forward),
            ActivityTotals::from_segments(&reversed)
        );
    }

    #[test]
    fn ratio_handles_zero_denominator() {
        let totals = ActivityTotals::from_segments(&[]);
        assert!(totals.is_empty());
        assert_eq!(totals.ratio(Activity::Reading), 0.0);
    }

    #[test]
    fn ratios_sum_to_one() {
        let segments = vec![
            seg(0.0, 250.0, Activity::Reading),
            seg(250.0, 1000.0, Activity::Chat),
        ];
        let totals = ActivityTotals::from_segments(&segments);
        assert_eq!(totals.ratio(Activity::Reading), 0.25);
        assert_eq!(totals.ratio(Activity::Chat), 0.75);
    }
}

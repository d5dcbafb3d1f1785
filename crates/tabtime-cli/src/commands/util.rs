//! Shared formatting helpers for CLI commands.

/// Formats a millisecond quantity for report text.
///
/// Under a minute: seconds with one decimal. Otherwise `Xm Y.Ys`.
/// Sign is preserved so deltas read naturally.
#[must_use]
pub fn format_ms(ms: f64) -> String {
    let sign = if ms < 0.0 { "-" } else { "" };
    let total_seconds = ms.abs() / 1000.0;
    if total_seconds < 60.0 {
        return format!("{sign}{total_seconds:.1}s");
    }
    let minutes = (total_seconds / 60.0).floor();
    let seconds = total_seconds - minutes * 60.0;
    format!("{sign}{minutes:.0}m {seconds:.1}s")
}

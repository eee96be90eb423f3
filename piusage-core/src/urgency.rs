//! Account recommendation scoring.
//!
//! Urgency is how fast an account is burning through its quota relative to
//! the time left before the quota resets:
//!
//! ```text
//! urgency = max over windows of used_percent / max(hours_until_reset, 0.1)
//! ```
//!
//! Lower urgency means more headroom. Among several accounts of the same
//! provider the one with the lowest urgency is recommended.

use chrono::{DateTime, Utc};

use crate::models::{RateWindow, UsageSnapshot};

/// Floor for the time remaining in a window, in hours.
///
/// Keeps urgency finite for windows that reset within six minutes or whose
/// reset time has already passed.
pub const MIN_HOURS_REMAINING: f64 = 0.1;

/// Urgency of a single window, `None` when it has no reset time.
pub fn window_urgency(window: &RateWindow, now: DateTime<Utc>) -> Option<f64> {
    let until = window.time_until_reset(now)?;
    #[allow(clippy::cast_precision_loss)]
    let hours = until.num_milliseconds() as f64 / 3_600_000.0;
    Some(window.used_percent / hours.max(MIN_HOURS_REMAINING))
}

/// Highest window urgency, `None` when no window has a reset time.
pub fn compute_urgency(windows: &[RateWindow], now: DateTime<Utc>) -> Option<f64> {
    windows
        .iter()
        .filter_map(|w| window_urgency(w, now))
        .reduce(f64::max)
}

/// Urgency of a fetched snapshot.
///
/// Missing and errored snapshots have no urgency and can never be
/// recommended.
pub fn snapshot_urgency(snapshot: Option<&UsageSnapshot>, now: DateTime<Utc>) -> Option<f64> {
    let snapshot = snapshot?;
    if snapshot.error.is_some() {
        return None;
    }
    compute_urgency(&snapshot.windows, now)
}

/// Picks the candidate with the lowest urgency.
///
/// Candidates without an urgency are skipped, not treated as zero. Ties go
/// to the first candidate in iteration order. Returns `None` when no
/// candidate has an urgency.
pub fn recommend<K>(candidates: impl IntoIterator<Item = (K, Option<f64>)>) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (key, urgency) in candidates {
        let Some(urgency) = urgency.filter(|u| u.is_finite()) else {
            continue;
        };
        match &best {
            Some((_, current)) if urgency >= *current => {}
            _ => best = Some((key, urgency)),
        }
    }
    best.map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::ProviderKind;

    fn window(used: f64, reset_in: Duration, now: DateTime<Utc>) -> RateWindow {
        RateWindow::new("5h", used).resetting_at(Some(now + reset_in))
    }

    #[test]
    fn test_higher_usage_is_more_urgent() {
        let now = Utc::now();
        let a = compute_urgency(&[window(90.0, Duration::hours(1), now)], now).unwrap();
        let b = compute_urgency(&[window(50.0, Duration::hours(1), now)], now).unwrap();
        assert!((a - 90.0).abs() < 1e-6);
        assert!((b - 50.0).abs() < 1e-6);

        let pick = recommend([("a", Some(a)), ("b", Some(b))]);
        assert_eq!(pick, Some("b"));
    }

    #[test]
    fn test_past_reset_is_floored() {
        let now = Utc::now();
        let urgency = compute_urgency(&[window(50.0, Duration::minutes(-1), now)], now).unwrap();
        assert!(urgency.is_finite());
        assert!((urgency - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset_within_six_minutes_is_floored() {
        let now = Utc::now();
        let urgency = compute_urgency(&[window(10.0, Duration::minutes(3), now)], now).unwrap();
        assert!((urgency - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_max_over_windows() {
        let now = Utc::now();
        let windows = [
            window(20.0, Duration::hours(2), now),
            window(60.0, Duration::hours(100), now),
            RateWindow::new("Opus", 99.0),
        ];
        let urgency = compute_urgency(&windows, now).unwrap();
        assert!((urgency - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_windows_without_reset_have_no_urgency() {
        let now = Utc::now();
        assert!(compute_urgency(&[RateWindow::new("5h", 40.0)], now).is_none());
        assert!(compute_urgency(&[], now).is_none());
    }

    #[test]
    fn test_missing_urgency_never_wins() {
        assert_eq!(recommend([("a", None), ("b", Some(300.0))]), Some("b"));
        assert_eq!(recommend::<&str>([("a", None), ("b", None)]), None);
        assert_eq!(recommend::<&str>([]), None);
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        assert_eq!(
            recommend([("a", Some(5.0)), ("b", Some(5.0)), ("c", Some(7.0))]),
            Some("a")
        );
    }

    #[test]
    fn test_errored_snapshot_has_no_urgency() {
        let now = Utc::now();
        let mut snap = UsageSnapshot::new(ProviderKind::Claude);
        snap.push_window(window(10.0, Duration::hours(1), now));
        assert!(snapshot_urgency(Some(&snap), now).is_some());

        snap.error = Some("http 500".into());
        assert!(snapshot_urgency(Some(&snap), now).is_none());
        assert!(snapshot_urgency(None, now).is_none());
    }
}

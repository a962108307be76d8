//! Pre/post launch window selection

use crate::catalog::LaunchEvent;
use crate::config::WindowConfig;
use crate::error::{ImpactError, Result};
use demand_forecast::{PeriodRange, SeriesStore};
use serde::Serialize;

/// Equal-length windows either side of a launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaunchWindows {
    pub pre: PeriodRange,
    pub post: PeriodRange,
}

impl LaunchWindows {
    /// Periods per window
    pub fn len(&self) -> usize {
        self.post.len()
    }

    pub fn is_empty(&self) -> bool {
        self.post.is_empty()
    }
}

/// Choose the pre and post windows for `event`.
///
/// Pre-launch history is measured over the whole store, so a target whose
/// series starts at its launch still gets a baseline from its market. The
/// window length is the configured length clipped to the history available
/// on either side of the launch.
pub fn select_windows(
    event: &LaunchEvent,
    store: &SeriesStore,
    config: &WindowConfig,
) -> Result<LaunchWindows> {
    let target = store.get(&event.target)?;
    let target_span = target.span().ok_or_else(|| {
        ImpactError::InputError(format!("Target series '{}' is empty", target.id()))
    })?;
    let history = store.span().unwrap_or(target_span);
    let launch = event.launch_period;
    if !history.contains(launch) || launch >= target_span.end {
        return Err(ImpactError::InputError(format!(
            "Launch period {} of '{}' is outside its history {}..{}",
            launch, event.target, target_span.start, target_span.end
        )));
    }

    let pre_available = launch.since(history.start) as usize;
    let post_available = history.end.since(launch) as usize;
    if pre_available < config.min_pre_periods {
        return Err(ImpactError::InputError(format!(
            "No baseline for '{}': {} pre-launch periods, {} required",
            event.target, pre_available, config.min_pre_periods
        )));
    }
    if post_available < config.min_post_periods {
        return Err(ImpactError::InputError(format!(
            "Too little post-launch history for '{}': {} periods, {} required",
            event.target, post_available, config.min_post_periods
        )));
    }

    let length = config.length.min(pre_available).min(post_available) as i64;
    Ok(LaunchWindows {
        pre: PeriodRange::new(launch.offset(-length), launch),
        post: PeriodRange::new(launch, launch.offset(length)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use demand_forecast::{Granularity, Period, Series};
    use rstest::rstest;

    fn series(id: &str, start: i64, n: usize) -> Series {
        Series::from_volumes(id, Period(start), &vec![10.0; n]).unwrap()
    }

    fn store(series: Vec<Series>) -> SeriesStore {
        SeriesStore::from_series(Granularity::Monthly, series).unwrap()
    }

    fn event(launch: i64) -> LaunchEvent {
        LaunchEvent::new("t", Period(launch), "c", "b")
    }

    #[rstest]
    #[case(10, 6)]
    #[case(3, 3)]
    #[case(17, 3)]
    fn test_window_length_is_clipped(#[case] launch: i64, #[case] expected: usize) {
        let store = store(vec![series("t", 0, 20)]);
        let windows = select_windows(&event(launch), &store, &WindowConfig::default()).unwrap();
        assert_eq!(windows.len(), expected);
        assert_eq!(windows.pre.len(), expected);
        assert_eq!(windows.pre.end, Period(launch));
        assert_eq!(windows.post.start, Period(launch));
        assert!(!windows.pre.overlaps(&windows.post));
        let span = store.span().unwrap();
        assert!(span.covers(&windows.pre));
        assert!(span.covers(&windows.post));
    }

    #[test]
    fn test_launch_outside_history() {
        let store = store(vec![series("t", 0, 20)]);
        let err = select_windows(&event(25), &store, &WindowConfig::default()).unwrap_err();
        assert!(err.is_input_error());
        let err = select_windows(&event(-1), &store, &WindowConfig::default()).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_launch_after_target_ends() {
        let store = store(vec![series("t", 0, 10), series("other", 0, 20)]);
        let err = select_windows(&event(12), &store, &WindowConfig::default()).unwrap_err();
        assert!(err.to_string().contains("outside its history"));
    }

    #[test]
    fn test_launch_at_first_period_has_no_baseline() {
        let store = store(vec![series("t", 5, 10), series("peer", 5, 10)]);
        let err = select_windows(&event(5), &store, &WindowConfig::default()).unwrap_err();
        assert!(err.to_string().contains("No baseline"));
    }

    #[test]
    fn test_series_starting_at_launch_uses_market_history() {
        let store = store(vec![series("t", 8, 12), series("sibling", 0, 20)]);
        let windows = select_windows(&event(8), &store, &WindowConfig::default()).unwrap();
        assert_eq!(windows.pre, PeriodRange::new(Period(2), Period(8)));
        assert_eq!(windows.post, PeriodRange::new(Period(8), Period(14)));
    }

    #[test]
    fn test_minimum_post_history() {
        let config = WindowConfig {
            min_post_periods: 3,
            ..WindowConfig::default()
        };
        let store = store(vec![series("t", 0, 20)]);
        let err = select_windows(&event(18), &store, &config).unwrap_err();
        assert!(err.is_input_error());
    }
}

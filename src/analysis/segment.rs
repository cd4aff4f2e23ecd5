//! Coast-down period search over a normalized sample series.
//!
//! A strict pass looks for runs where the equipment was fully off. When none
//! qualifies, a fallback pass accepts "mostly off" runs with a small number of
//! short cycling gaps.

use std::ops::Range;

use chrono::NaiveTime;
use log::debug;

use super::types::{CoastDownPeriod, Sample, SearchMode};

/// Minimum spanned duration for a period to qualify (h).
pub const MIN_COAST_DOWN_HOURS: f64 = 3.0;
/// Combined runtime at or below which an interval counts as "off" (s).
pub const STRICT_OFF_RUNTIME_SEC: f64 = 30.0;
/// Combined runtime below which an interval continues a fallback run (s).
pub const FALLBACK_CONTINUE_RUNTIME_SEC: f64 = 60.0;
/// Combined runtime below which an interval is a tolerated gap (s).
pub const FALLBACK_GAP_RUNTIME_SEC: f64 = 120.0;
/// Maximum consecutive tolerated gaps inside one fallback run.
pub const FALLBACK_MAX_GAPS: usize = 2;
/// Minimum sample count for a fallback run.
pub const FALLBACK_MIN_SAMPLES: usize = 36;
/// Average combined runtime a fallback run must stay below (s).
pub const FALLBACK_MAX_AVG_RUNTIME_SEC: f64 = 45.0;
/// Share of the best duration a nighttime run needs to be preferred.
pub const DEFAULT_NIGHTTIME_PREFERENCE_RATIO: f64 = 0.8;
/// First hour of the nighttime window (inclusive).
pub const NIGHT_START_HOUR: u32 = 20;
/// End of the nighttime window (exclusive).
pub const NIGHT_END_HOUR: u32 = 8;
/// Interval assumed when timestamps give no usable spacing (min).
pub const DEFAULT_INTERVAL_MINUTES: f64 = 5.0;

/// Median positive spacing between consecutive samples, in minutes.
///
/// Falls back to [`DEFAULT_INTERVAL_MINUTES`] for fewer than two samples or
/// when every timestamp repeats.
pub fn detect_interval_minutes(samples: &[Sample]) -> f64 {
    let mut diffs: Vec<f64> = samples
        .windows(2)
        .map(|w| (w[1].timestamp() - w[0].timestamp()).num_seconds() as f64 / 60.0)
        .filter(|d| *d > 0.0)
        .collect();
    if diffs.is_empty() {
        return DEFAULT_INTERVAL_MINUTES;
    }
    diffs.sort_by(f64::total_cmp);
    diffs[diffs.len() / 2]
}

/// Duration spanned by a run of samples (h).
///
/// Same-day runs use the wall-clock difference between the first and last
/// time, wrapping past midnight. Runs that cross a date boundary are measured
/// as `(n - 1) × interval`.
pub fn span_hours(samples: &[Sample], interval_minutes: f64) -> f64 {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return 0.0;
    };
    if first.date == last.date {
        let mut hours = wall_clock_hours(first.time, last.time);
        if hours < 0.0 {
            hours += 24.0;
        }
        hours
    } else {
        (samples.len() - 1) as f64 * interval_minutes / 60.0
    }
}

fn wall_clock_hours(start: NaiveTime, end: NaiveTime) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

/// Maximal runs where every interval is fully off.
pub fn strict_runs(samples: &[Sample]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, s) in samples.iter().enumerate() {
        if s.combined_runtime_sec() <= STRICT_OFF_RUNTIME_SEC {
            start.get_or_insert(i);
        } else if let Some(st) = start.take() {
            runs.push(st..i);
        }
    }
    if let Some(st) = start {
        runs.push(st..samples.len());
    }
    runs
}

/// Gap-tolerant runs of mostly-off intervals.
///
/// An interval under 60 s extends the run and restores the gap budget. An
/// interval under 120 s is absorbed as a gap while the budget lasts. Anything
/// else closes the run, which always ends at its last sub-60 s interval.
pub fn fallback_runs(samples: &[Sample]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    let mut last_good = 0;
    let mut gaps = 0;

    for (i, s) in samples.iter().enumerate() {
        let runtime = s.combined_runtime_sec();
        if runtime < FALLBACK_CONTINUE_RUNTIME_SEC {
            start.get_or_insert(i);
            last_good = i;
            gaps = 0;
        } else if runtime < FALLBACK_GAP_RUNTIME_SEC
            && start.is_some()
            && gaps < FALLBACK_MAX_GAPS
        {
            gaps += 1;
        } else {
            if let Some(st) = start.take() {
                runs.push(st..last_good + 1);
            }
            gaps = 0;
        }
    }
    if let Some(st) = start {
        runs.push(st..last_good + 1);
    }
    runs
}

fn average_runtime_sec(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(Sample::combined_runtime_sec).sum::<f64>() / samples.len() as f64
}

/// Picks among qualifying `(run, duration)` candidates.
///
/// The longest run wins, earliest on ties, unless the best nighttime-start
/// run reaches `nighttime_ratio` of that duration.
fn select(
    samples: &[Sample],
    candidates: &[(Range<usize>, f64)],
    nighttime_ratio: f64,
) -> Option<usize> {
    let longest = |filter: &dyn Fn(&Range<usize>) -> bool| {
        candidates
            .iter()
            .enumerate()
            .filter(|(_, (r, _))| filter(r))
            .fold(None::<(usize, f64)>, |best, (i, (_, d))| match best {
                Some((_, bd)) if bd >= *d => best,
                _ => Some((i, *d)),
            })
    };

    let (best_idx, best_hours) = longest(&|_| true)?;
    if let Some((night_idx, night_hours)) = longest(&|r| samples[r.start].is_nighttime())
        && night_idx != best_idx
        && night_hours >= nighttime_ratio * best_hours
    {
        debug!(
            "preferring nighttime run ({night_hours:.2} h) over longest run ({best_hours:.2} h)"
        );
        return Some(night_idx);
    }
    Some(best_idx)
}

/// Runs one search pass and returns the selected period, if any qualifies.
///
/// # Arguments
///
/// * `samples` - Chronologically ordered samples
/// * `mode` - Which pass to run
/// * `interval_minutes` - Detected sample interval
/// * `nighttime_ratio` - Nighttime preference ratio (0–1)
pub fn find_period(
    samples: &[Sample],
    mode: SearchMode,
    interval_minutes: f64,
    nighttime_ratio: f64,
) -> Option<CoastDownPeriod> {
    let runs = match mode {
        SearchMode::Strict => strict_runs(samples),
        SearchMode::Fallback => fallback_runs(samples),
    };

    let candidates: Vec<(Range<usize>, f64)> = runs
        .into_iter()
        .filter_map(|r| {
            let run = &samples[r.clone()];
            let hours = span_hours(run, interval_minutes);
            let qualifies = hours >= MIN_COAST_DOWN_HOURS
                && match mode {
                    SearchMode::Strict => true,
                    SearchMode::Fallback => {
                        run.len() >= FALLBACK_MIN_SAMPLES
                            && average_runtime_sec(run) < FALLBACK_MAX_AVG_RUNTIME_SEC
                    }
                };
            qualifies.then_some((r, hours))
        })
        .collect();

    debug!("{mode} search: {} qualifying run(s)", candidates.len());

    let idx = select(samples, &candidates, nighttime_ratio)?;
    let (range, hours) = candidates[idx].clone();
    CoastDownPeriod::new(samples[range].to_vec(), hours, mode)
}

/// Longest fully-off streak in the series (h), for diagnostics.
pub fn longest_off_streak_hours(samples: &[Sample], interval_minutes: f64) -> f64 {
    strict_runs(samples)
        .into_iter()
        .map(|r| span_hours(&samples[r], interval_minutes))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn series(start: NaiveDateTime, runtimes: &[f64]) -> Vec<Sample> {
        runtimes
            .iter()
            .enumerate()
            .map(|(i, &rt)| {
                let ts = start + Duration::minutes(5 * i as i64);
                Sample::new(ts.date(), ts.time(), Some(30.0), Some(68.0), rt, 0.0)
            })
            .collect()
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn interval_is_median_spacing() {
        let s = series(at(0), &[0.0; 10]);
        assert_eq!(detect_interval_minutes(&s), 5.0);
        assert_eq!(detect_interval_minutes(&s[..1]), DEFAULT_INTERVAL_MINUTES);
    }

    #[test]
    fn span_same_day_uses_wall_clock() {
        let s = series(at(9), &[0.0; 37]);
        assert!((span_hours(&s, 5.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn span_cross_day_uses_sample_count() {
        let s = series(at(22), &[0.0; 49]);
        assert!((span_hours(&s, 5.0) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn strict_runs_split_on_runtime() {
        let s = series(at(0), &[0.0, 10.0, 31.0, 0.0, 30.0]);
        assert_eq!(strict_runs(&s), vec![0..2, 3..5]);
    }

    #[test]
    fn fallback_tolerates_two_gaps_and_ends_on_good_sample() {
        let s = series(at(0), &[10.0, 90.0, 90.0, 10.0, 90.0, 90.0, 90.0, 10.0]);
        // Third consecutive gap closes the first run at index 3.
        assert_eq!(fallback_runs(&s), vec![0..4, 7..8]);
    }

    #[test]
    fn fallback_closes_on_long_cycle() {
        let s = series(at(0), &[10.0, 200.0, 10.0, 70.0]);
        assert_eq!(fallback_runs(&s), vec![0..1, 2..3]);
    }

    #[test]
    fn gap_cannot_start_a_run() {
        let s = series(at(0), &[90.0, 10.0]);
        assert_eq!(fallback_runs(&s), vec![1..2]);
    }

    #[test]
    fn two_hour_run_does_not_qualify() {
        let s = series(at(9), &[0.0; 25]);
        assert!(find_period(&s, SearchMode::Strict, 5.0, 0.8).is_none());
    }

    #[test]
    fn longest_run_wins_ties_keep_earliest() {
        let mut rt = vec![0.0; 37];
        rt.push(300.0);
        rt.extend(vec![0.0; 37]);
        let s = series(at(9), &rt);
        let p = find_period(&s, SearchMode::Strict, 5.0, 0.8).expect("period");
        assert_eq!(p.start().time, at(9).time());
    }

    #[test]
    fn nighttime_run_preferred_within_ratio() {
        // Day run 09:00-15:00 (6 h), night run 21:00-02:00 (5 h).
        let mut rt = vec![0.0; 73];
        rt.extend(vec![300.0; 71]);
        rt.extend(vec![0.0; 61]);
        let s = series(at(9), &rt);
        let p = find_period(&s, SearchMode::Strict, 5.0, 0.8).expect("period");
        assert!(p.is_nighttime);
        assert!((p.duration_hours - 5.0).abs() < 1e-9);

        let p = find_period(&s, SearchMode::Strict, 5.0, 0.9).expect("period");
        assert!(!p.is_nighttime);
        assert!((p.duration_hours - 6.0).abs() < 1e-9);
    }

    #[test]
    fn fallback_requires_low_average() {
        // 40 samples all at 50 s: continues, but average is too high.
        let s = series(at(9), &[50.0; 40]);
        assert!(find_period(&s, SearchMode::Fallback, 5.0, 0.8).is_none());
        let s = series(at(9), &[40.0; 40]);
        let p = find_period(&s, SearchMode::Fallback, 5.0, 0.8).expect("period");
        assert_eq!(p.mode, SearchMode::Fallback);
        assert_eq!(p.samples().len(), 40);
    }
}

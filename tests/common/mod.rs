//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use heatloss_sim::analysis::Sample;
use heatloss_sim::config::{AnalysisConfig, EngineConfig};
use heatloss_sim::sim::estimate::CostEstimateRequest;
use heatloss_sim::synthetic::SyntheticHome;

/// True coefficient of the reference synthetic home (BTU/hr/°F).
pub const REFERENCE_K: f64 = 850.0;

/// Local midnight on 2024-01-15 plus `hours`.
pub fn at(hours: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::hours(hours)
}

/// 2000 ft² home at the default thermal mass with a nightly 6 h setback.
pub fn reference_home(seed: u64) -> SyntheticHome {
    SyntheticHome::new(REFERENCE_K, 2000.0, seed).with_off_window(22.0, 6.0)
}

/// Analyzer settings matching [`reference_home`].
pub fn analysis_config() -> AnalysisConfig {
    AnalysisConfig {
        square_feet: 2000.0,
        ..AnalysisConfig::default()
    }
}

/// Fully-off 5-minute samples whose indoor temperature moves linearly from
/// `indoor_start` by `indoor_step` per sample at a constant outdoor value.
pub fn coast(
    start: NaiveDateTime,
    n: usize,
    indoor_start: f64,
    indoor_step: f64,
    outdoor: f64,
) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let ts = start + Duration::minutes(5 * i as i64);
            Sample::new(
                ts.date(),
                ts.time(),
                Some(outdoor),
                Some(indoor_start + indoor_step * i as f64),
                0.0,
                0.0,
            )
        })
        .collect()
}

/// Baseline configuration with K-independent defaults.
pub fn baseline() -> EngineConfig {
    EngineConfig::baseline()
}

pub fn constant_request(outdoor: f64, target: f64, hours: f64) -> CostEstimateRequest {
    CostEstimateRequest {
        outdoor_temp: Some(outdoor),
        outdoor_temps_array: None,
        target_temp: target,
        duration_hours: hours,
    }
}

/// 2024-01-15T00:00 at UTC−05:00.
pub fn eastern_midnight() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-01-15T00:00:00-05:00").unwrap()
}

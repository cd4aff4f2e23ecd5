//! Forecast construction: constant temperatures, hourly arrays, and daily
//! low/high expansion into hourly profiles.

use std::f64::consts::PI;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::sim::types::ForecastHour;

/// Hour of the daily temperature minimum.
const DAILY_MIN_HOUR: f64 = 6.0;

/// Holds `temp_f` constant from `start` for `duration_hours`.
///
/// Whole hours come first; a fractional remainder becomes a shorter final
/// interval. Returns an empty forecast for non-positive durations.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use heatloss_sim::forecast::constant;
///
/// let start = DateTime::parse_from_rfc3339("2024-01-15T00:00:00-05:00").unwrap();
/// let hours = constant(start, 30.0, 2.5, 60.0);
/// assert_eq!(hours.len(), 3);
/// assert_eq!(hours[2].duration_hours, 0.5);
/// ```
pub fn constant(
    start: DateTime<FixedOffset>,
    temp_f: f64,
    duration_hours: f64,
    humidity_pct: f64,
) -> Vec<ForecastHour> {
    if !duration_hours.is_finite() || duration_hours <= 0.0 {
        return Vec::new();
    }
    let whole = duration_hours.floor() as usize;
    let remainder = duration_hours - whole as f64;

    let mut hours: Vec<ForecastHour> = (0..whole)
        .map(|h| hour_at(start, h, temp_f, humidity_pct, 1.0))
        .collect();
    if remainder > 1e-9 {
        hours.push(hour_at(start, whole, temp_f, humidity_pct, remainder));
    }
    hours
}

/// One interval per temperature, one hour apart from `start`.
pub fn from_hourly_temps(
    start: DateTime<FixedOffset>,
    temps_f: &[f64],
    humidity_pct: f64,
) -> Vec<ForecastHour> {
    temps_f
        .iter()
        .enumerate()
        .map(|(h, &t)| hour_at(start, h, t, humidity_pct, 1.0))
        .collect()
}

fn hour_at(
    start: DateTime<FixedOffset>,
    offset_hours: usize,
    temp_f: f64,
    humidity_pct: f64,
    duration_hours: f64,
) -> ForecastHour {
    ForecastHour {
        time: start + Duration::hours(offset_hours as i64),
        outdoor_temp_f: temp_f,
        humidity_pct,
        duration_hours,
    }
}

/// Temperature at `hour` (0–24) on a sinusoid between the daily low and high.
///
/// The minimum falls at 06:00 and the maximum at 18:00.
pub fn hourly_temp_from_daily(low_f: f64, high_f: f64, hour: f64) -> f64 {
    let avg = (low_f + high_f) / 2.0;
    hourly_temp_around(avg, low_f, high_f, hour)
}

fn hourly_temp_around(avg_f: f64, low_f: f64, high_f: f64, hour: f64) -> f64 {
    let phase = ((hour - DAILY_MIN_HOUR) / 12.0) * PI;
    avg_f + (phase - PI).cos() * (high_f - low_f) / 2.0
}

/// One day of weather used to build an hourly profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub low_f: f64,
    pub high_f: f64,
    /// Daily mean; the midpoint of low and high when absent.
    #[serde(default)]
    pub avg_f: Option<f64>,
    /// Relative humidity (%); the configured default when absent.
    #[serde(default)]
    pub humidity_pct: Option<f64>,
}

impl DailyWeather {
    /// Temperature at `hour` of this day.
    pub fn temp_at(&self, hour: f64) -> f64 {
        let avg = self.avg_f.unwrap_or((self.low_f + self.high_f) / 2.0);
        hourly_temp_around(avg, self.low_f, self.high_f, hour)
    }
}

/// Expands daily weather into 24 local hours per day at `offset`.
pub fn from_daily(
    days: &[DailyWeather],
    offset: FixedOffset,
    default_humidity_pct: f64,
) -> Vec<ForecastHour> {
    days.iter()
        .flat_map(|day| {
            let midnight = at_local(day.date.and_time(chrono::NaiveTime::MIN), offset);
            let humidity = day.humidity_pct.unwrap_or(default_humidity_pct);
            (0..24).map(move |h| {
                hour_at(midnight, h, day.temp_at(h as f64), humidity, 1.0)
            })
        })
        .collect()
}

/// Attaches a fixed UTC offset to a local wall-clock time.
pub fn at_local(local: NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    DateTime::from_naive_utc_and_offset(local - offset, offset)
}

/// Start of the current local hour.
pub fn current_hour_start() -> DateTime<FixedOffset> {
    let now = Local::now().fixed_offset();
    let naive = now.naive_local();
    let truncated = naive
        .date()
        .and_hms_opt(naive.hour(), 0, 0)
        .unwrap_or(naive);
    at_local(truncated, *now.offset())
}

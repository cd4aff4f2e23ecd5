//! Telemetry samples and the values produced by coast-down analysis.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::segment::{NIGHT_END_HOUR, NIGHT_START_HOUR};

/// One normalized thermostat telemetry row.
///
/// Temperatures are `None` when the export cell was blank or not a finite
/// number. Runtimes are seconds of equipment operation within the sample
/// interval and are clamped to `[0, interval_seconds]` during import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Local calendar date of the row.
    pub date: NaiveDate,
    /// Local wall-clock time of the row.
    pub time: NaiveTime,
    /// Outdoor temperature (°F).
    pub outdoor_temp_f: Option<f64>,
    /// Indoor (thermostat) temperature (°F).
    pub indoor_temp_f: Option<f64>,
    /// Primary heat (compressor) runtime within the interval (s).
    pub primary_runtime_sec: f64,
    /// Auxiliary (resistive) heat runtime within the interval (s).
    pub aux_runtime_sec: f64,
}

impl Sample {
    /// Creates a sample from already-parsed values.
    pub fn new(
        date: NaiveDate,
        time: NaiveTime,
        outdoor_temp_f: Option<f64>,
        indoor_temp_f: Option<f64>,
        primary_runtime_sec: f64,
        aux_runtime_sec: f64,
    ) -> Self {
        Self {
            date,
            time,
            outdoor_temp_f,
            indoor_temp_f,
            primary_runtime_sec,
            aux_runtime_sec,
        }
    }

    /// Local timestamp of the row.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Primary plus auxiliary runtime (s).
    pub fn combined_runtime_sec(&self) -> f64 {
        self.primary_runtime_sec + self.aux_runtime_sec
    }

    /// Whether the row falls in the 20:00–08:00 nighttime window.
    pub fn is_nighttime(&self) -> bool {
        let hour = self.time.hour();
        hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
    }
}

impl fmt::Display for Sample {
    /// Raw row dump used in error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let temp = |v: Option<f64>| v.map_or_else(|| "missing".to_string(), |t| format!("{t:.2}"));
        write!(
            f,
            "date={} time={} outdoor_f={} indoor_f={} primary_sec={:.0} aux_sec={:.0}",
            self.date,
            self.time,
            temp(self.outdoor_temp_f),
            temp(self.indoor_temp_f),
            self.primary_runtime_sec,
            self.aux_runtime_sec,
        )
    }
}

/// Which search pass produced a coast-down period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Combined runtime at or below 30 s in every interval.
    Strict,
    /// Gap-tolerant "mostly off" pass.
    Fallback,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Contiguous run of off or mostly-off samples.
///
/// Only built by the segment search, which guarantees the run is non-empty,
/// spans at least three hours and that every sample met the runtime
/// threshold of `mode`.
#[derive(Debug, Clone)]
pub struct CoastDownPeriod {
    samples: Vec<Sample>,
    /// Spanned duration (h).
    pub duration_hours: f64,
    /// Whether the period starts inside the nighttime window.
    pub is_nighttime: bool,
    /// Search pass that selected the period.
    pub mode: SearchMode,
}

impl CoastDownPeriod {
    pub(crate) fn new(samples: Vec<Sample>, duration_hours: f64, mode: SearchMode) -> Option<Self> {
        let is_nighttime = samples.first()?.is_nighttime();
        Some(Self {
            samples,
            duration_hours,
            is_nighttime,
            mode,
        })
    }

    /// Samples in chronological order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// First sample of the period.
    pub fn start(&self) -> &Sample {
        &self.samples[0]
    }

    /// Last sample of the period.
    pub fn end(&self) -> &Sample {
        &self.samples[self.samples.len() - 1]
    }
}

/// Whole-building heat-loss estimate derived from one coast-down period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatLossEstimate {
    /// Heat-loss coefficient (BTU/hr/°F), always > 0.
    pub heat_loss_factor: f64,
    /// Practical balance-point temperature (°F).
    pub balance_point_f: f64,
    /// Average indoor minus outdoor temperature over the period (°F).
    pub avg_temp_diff_f: f64,
    /// Heat loss at a 70 °F design difference (BTU/hr).
    #[serde(rename = "heatLossAt70F")]
    pub heat_loss_at_70f: f64,
    /// Measured indoor drop, start minus end (°F).
    pub temp_drop_f: f64,
    /// Drop actually used in the coefficient (°F).
    pub adjusted_temp_drop_f: f64,
    /// Period duration (h).
    pub duration_hours: f64,
    /// Local timestamp of the first period sample.
    pub period_start: NaiveDateTime,
    /// Local timestamp of the last period sample.
    pub period_end: NaiveDateTime,
    /// Number of samples in the period.
    pub sample_count: usize,
    /// Whether the period started at night.
    pub nighttime: bool,
    /// Search pass that found the period.
    pub search_mode: SearchMode,
    /// Set when the measured drop was inside the stability band and the
    /// minimal drop was substituted.
    pub minimal_drop_applied: bool,
}

impl fmt::Display for HeatLossEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Heat Loss Estimate ---")?;
        writeln!(f, "Heat loss factor:      {:.1} BTU/hr/°F", self.heat_loss_factor)?;
        writeln!(f, "Heat loss at 70°F ΔT:  {:.0} BTU/hr", self.heat_loss_at_70f)?;
        writeln!(f, "Balance point:         {:.1} °F", self.balance_point_f)?;
        writeln!(f, "Avg indoor-outdoor ΔT: {:.1} °F", self.avg_temp_diff_f)?;
        writeln!(
            f,
            "Coast-down period:     {} → {} ({:.2} h, {} samples, {} search{})",
            self.period_start,
            self.period_end,
            self.duration_hours,
            self.sample_count,
            self.search_mode,
            if self.nighttime { ", night" } else { "" },
        )?;
        write!(
            f,
            "Indoor drop:           {:.2} °F (used {:.2} °F{})",
            self.temp_drop_f,
            self.adjusted_temp_drop_f,
            if self.minimal_drop_applied {
                ", minimal drop substituted"
            } else {
                ""
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(h: u32, m: u32) -> Sample {
        Sample::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            Some(30.0),
            Some(68.0),
            10.0,
            5.0,
        )
    }

    #[test]
    fn nighttime_window_boundaries() {
        assert!(sample_at(20, 0).is_nighttime());
        assert!(sample_at(23, 55).is_nighttime());
        assert!(sample_at(0, 0).is_nighttime());
        assert!(sample_at(7, 55).is_nighttime());
        assert!(!sample_at(8, 0).is_nighttime());
        assert!(!sample_at(19, 55).is_nighttime());
    }

    #[test]
    fn combined_runtime_sums_both_stages() {
        assert_eq!(sample_at(1, 0).combined_runtime_sec(), 15.0);
    }

    #[test]
    fn display_marks_missing_temperatures() {
        let mut s = sample_at(3, 0);
        s.indoor_temp_f = None;
        let dump = s.to_string();
        assert!(dump.contains("indoor_f=missing"));
        assert!(dump.contains("outdoor_f=30.00"));
    }

    #[test]
    fn period_rejects_empty_sample_list() {
        assert!(CoastDownPeriod::new(Vec::new(), 3.0, SearchMode::Strict).is_none());
    }
}

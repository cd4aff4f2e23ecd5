//! Diagnostic report attached to `InsufficientData` failures.

use std::fmt;

use serde::Serialize;

use super::segment::{
    FALLBACK_MIN_SAMPLES, MIN_COAST_DOWN_HOURS, STRICT_OFF_RUNTIME_SEC, longest_off_streak_hours,
};
use super::types::Sample;

/// Number of leading sample runtimes echoed in the report.
const RUNTIME_PREVIEW_LEN: usize = 10;
/// Duty cycle above which the system is assumed to have run continuously (%).
const HIGH_DUTY_CYCLE_PCT: f64 = 80.0;

/// Summary of why no coast-down period could be found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticReport {
    /// Usable rows in the upload.
    pub total_rows: usize,
    /// Detected sample interval (min).
    pub interval_minutes: f64,
    /// Share of the covered time the equipment was running (%).
    pub duty_cycle_pct: f64,
    /// Longest fully-off streak (h).
    pub longest_off_streak_hours: f64,
    /// Intervals at or below the strict off threshold.
    pub off_interval_count: usize,
    /// Combined runtimes of the first rows (s).
    pub sample_runtimes: Vec<f64>,
    /// Actionable next steps.
    pub suggestions: Vec<String>,
}

impl DiagnosticReport {
    /// Builds the report from the full sample series.
    pub fn from_samples(samples: &[Sample], interval_minutes: f64) -> Self {
        let interval_sec = interval_minutes * 60.0;
        let total_runtime: f64 = samples.iter().map(Sample::combined_runtime_sec).sum();
        let covered = samples.len() as f64 * interval_sec;
        let duty_cycle_pct = if covered > 0.0 {
            (100.0 * total_runtime / covered).min(100.0)
        } else {
            0.0
        };
        let off_interval_count = samples
            .iter()
            .filter(|s| s.combined_runtime_sec() <= STRICT_OFF_RUNTIME_SEC)
            .count();
        let longest = longest_off_streak_hours(samples, interval_minutes);

        let mut suggestions = Vec::new();
        if duty_cycle_pct > HIGH_DUTY_CYCLE_PCT {
            suggestions.push(
                "Heating ran almost continuously; export a period with milder weather.".to_string(),
            );
        }
        if longest < MIN_COAST_DOWN_HOURS {
            suggestions.push(format!(
                "Turn the heat off for at least {MIN_COAST_DOWN_HOURS:.0} hours (overnight works best) \
                 and export again."
            ));
        }
        if samples.len() < FALLBACK_MIN_SAMPLES {
            suggestions.push(format!(
                "Upload covers only {} rows; export at least several days of data.",
                samples.len()
            ));
        }
        suggestions.push(
            "Confirm the export includes the heat-stage runtime columns in seconds.".to_string(),
        );

        Self {
            total_rows: samples.len(),
            interval_minutes,
            duty_cycle_pct,
            longest_off_streak_hours: longest,
            off_interval_count,
            sample_runtimes: samples
                .iter()
                .take(RUNTIME_PREVIEW_LEN)
                .map(Sample::combined_runtime_sec)
                .collect(),
            suggestions,
        }
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Coast-Down Diagnostics ---")?;
        writeln!(f, "Rows analysed:         {}", self.total_rows)?;
        writeln!(f, "Sample interval:       {:.1} min", self.interval_minutes)?;
        writeln!(f, "Duty cycle:            {:.1}%", self.duty_cycle_pct)?;
        writeln!(
            f,
            "Longest off streak:    {:.2} h (need {MIN_COAST_DOWN_HOURS:.1} h)",
            self.longest_off_streak_hours
        )?;
        writeln!(f, "Off intervals:         {}", self.off_interval_count)?;
        let runtimes: Vec<String> = self
            .sample_runtimes
            .iter()
            .map(|r| format!("{r:.0}"))
            .collect();
        writeln!(f, "Sample runtimes (s):   [{}]", runtimes.join(", "))?;
        write!(f, "Suggestions:")?;
        for s in &self.suggestions {
            write!(f, "\n  - {s}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn running(n: usize, runtime: f64) -> Vec<Sample> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let ts = start + Duration::minutes(5 * i as i64);
                Sample::new(ts.date(), ts.time(), Some(20.0), Some(68.0), runtime, 0.0)
            })
            .collect()
    }

    #[test]
    fn continuous_heating_reports_full_duty_cycle() {
        let report = DiagnosticReport::from_samples(&running(100, 300.0), 5.0);
        assert_eq!(report.total_rows, 100);
        assert!((report.duty_cycle_pct - 100.0).abs() < 1e-9);
        assert_eq!(report.off_interval_count, 0);
        assert_eq!(report.longest_off_streak_hours, 0.0);
        assert_eq!(report.sample_runtimes.len(), RUNTIME_PREVIEW_LEN);
        assert!(report.suggestions.iter().any(|s| s.contains("continuously")));
    }

    #[test]
    fn display_is_stable() {
        let report = DiagnosticReport::from_samples(&running(3, 150.0), 5.0);
        let text = report.to_string();
        assert_eq!(text, report.to_string());
        assert!(text.contains("Duty cycle:            50.0%"));
        assert!(text.contains("Sample runtimes (s):   [150, 150, 150]"));
    }
}

//! Heat-loss coefficient estimation from an unheated indoor temperature decay.
//!
//! While the heating system is off, the indoor temperature of a lumped
//! thermal mass decays toward the outdoor temperature at a rate proportional
//! to the indoor/outdoor difference. Dividing the observed drop rate by the
//! average difference and scaling by an assumed thermal mass per square foot
//! yields the whole-building coefficient in BTU/hr/°F.
//!
//! The thermal-mass constant (8 BTU/°F per ft² by default) is a coarse
//! assumption and is the main precision limit of the estimate.

use log::{debug, info, warn};

use crate::config::AnalysisConfig;

use super::diagnostics::DiagnosticReport;
use super::error::AnalysisError;
use super::segment::{detect_interval_minutes, find_period};
use super::types::{CoastDownPeriod, HeatLossEstimate, Sample, SearchMode};

/// Indoor drops at or below this are treated as flat (°F).
pub const STABILITY_BAND_F: f64 = 0.1;
/// Drop substituted for a flat period (°F).
pub const MINIMAL_TEMP_DROP_F: f64 = 0.1;
/// Design temperature difference for the headline heat-loss figure (°F).
pub const DESIGN_DELTA_T_F: f64 = 70.0;

/// Finds a coast-down period in a telemetry series and derives the
/// whole-building heat-loss coefficient from it.
#[derive(Debug, Clone)]
pub struct CoastDownAnalyzer {
    config: AnalysisConfig,
}

impl CoastDownAnalyzer {
    /// Creates an analyzer.
    ///
    /// # Arguments
    ///
    /// * `config` - Floor area, thermal mass and nighttime preference
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Returns the analysis configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Estimates the heat-loss coefficient from chronologically ordered samples.
    ///
    /// # Errors
    ///
    /// * `InsufficientData` when neither search pass finds a period
    /// * `InvalidTemperature` when a period boundary row lacks a temperature
    /// * `ImplausibleTrend` when the indoor temperature rose across the period
    /// * `DegenerateTempDiff` when outdoor air was not colder than indoor air
    pub fn analyze(&self, samples: &[Sample]) -> Result<HeatLossEstimate, AnalysisError> {
        let interval = detect_interval_minutes(samples);
        debug!(
            "analyzing {} samples at {interval:.1} min interval",
            samples.len()
        );

        let ratio = self.config.nighttime_preference_ratio;
        let period = find_period(samples, SearchMode::Strict, interval, ratio)
            .or_else(|| {
                debug!("no strict coast-down period, trying fallback search");
                find_period(samples, SearchMode::Fallback, interval, ratio)
            })
            .ok_or_else(|| {
                AnalysisError::InsufficientData(Box::new(DiagnosticReport::from_samples(
                    samples, interval,
                )))
            })?;

        info!(
            "selected {} coast-down period {} → {} ({:.2} h, {} samples)",
            period.mode,
            period.start().timestamp(),
            period.end().timestamp(),
            period.duration_hours,
            period.samples().len(),
        );

        self.estimate_from_period(&period, balance_point_f(samples))
    }

    fn estimate_from_period(
        &self,
        period: &CoastDownPeriod,
        balance_point: Option<f64>,
    ) -> Result<HeatLossEstimate, AnalysisError> {
        let start_indoor = boundary_temp(period.start(), "start", |s| s.indoor_temp_f)?;
        let end_indoor = boundary_temp(period.end(), "end", |s| s.indoor_temp_f)?;
        boundary_temp(period.start(), "start", |s| s.outdoor_temp_f)?;
        boundary_temp(period.end(), "end", |s| s.outdoor_temp_f)?;

        let hours = period.duration_hours;
        let indoor: Vec<f64> = finite(period.samples(), |s| s.indoor_temp_f);
        let outdoor: Vec<f64> = finite(period.samples(), |s| s.outdoor_temp_f);

        let rise = end_indoor - start_indoor;
        if rise > STABILITY_BAND_F {
            return Err(AnalysisError::ImplausibleTrend {
                start_f: start_indoor,
                end_f: end_indoor,
                min_f: indoor.iter().copied().fold(f64::INFINITY, f64::min),
                max_f: indoor.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                rise_f: rise,
                duration_hours: hours,
            });
        }

        let temp_drop = start_indoor - end_indoor;
        let minimal_drop_applied = temp_drop <= STABILITY_BAND_F;
        let drop = if minimal_drop_applied {
            warn!(
                "indoor drop {temp_drop:.3}°F within stability band, using {MINIMAL_TEMP_DROP_F}°F"
            );
            MINIMAL_TEMP_DROP_F
        } else {
            temp_drop
        };

        let avg_indoor = mean(&indoor);
        let avg_outdoor = mean(&outdoor);
        let avg_diff = avg_indoor - avg_outdoor;
        if avg_diff <= 0.0 {
            return Err(AnalysisError::DegenerateTempDiff {
                avg_indoor_f: avg_indoor,
                avg_outdoor_f: avg_outdoor,
            });
        }

        let rate = drop / hours;
        let k_raw = rate / avg_diff;
        let heat_loss_factor =
            self.config.square_feet * self.config.thermal_mass_btu_per_f_per_sqft * k_raw;

        let estimate = HeatLossEstimate {
            heat_loss_factor,
            balance_point_f: balance_point.unwrap_or(avg_outdoor),
            avg_temp_diff_f: avg_diff,
            heat_loss_at_70f: heat_loss_factor * DESIGN_DELTA_T_F,
            temp_drop_f: temp_drop,
            adjusted_temp_drop_f: drop,
            duration_hours: hours,
            period_start: period.start().timestamp(),
            period_end: period.end().timestamp(),
            sample_count: period.samples().len(),
            nighttime: period.is_nighttime,
            search_mode: period.mode,
            minimal_drop_applied,
        };
        info!(
            "heat loss factor {:.1} BTU/hr/°F ({:.0} BTU/hr at 70°F ΔT)",
            estimate.heat_loss_factor, estimate.heat_loss_at_70f
        );
        Ok(estimate)
    }
}

fn boundary_temp(
    sample: &Sample,
    position: &'static str,
    field: impl Fn(&Sample) -> Option<f64>,
) -> Result<f64, AnalysisError> {
    field(sample)
        .filter(|t| t.is_finite())
        .ok_or_else(|| AnalysisError::InvalidTemperature {
            position,
            row: sample.to_string(),
        })
}

fn finite(samples: &[Sample], field: impl Fn(&Sample) -> Option<f64>) -> Vec<f64> {
    samples
        .iter()
        .filter_map(field)
        .filter(|t| t.is_finite())
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Highest outdoor temperature at which auxiliary heat ran, or the coldest
/// observed outdoor temperature when it never did.
pub fn balance_point_f(samples: &[Sample]) -> Option<f64> {
    let with_aux = samples
        .iter()
        .filter(|s| s.aux_runtime_sec > 0.0)
        .filter_map(|s| s.outdoor_temp_f)
        .filter(|t| t.is_finite())
        .reduce(f64::max);
    with_aux.or_else(|| finite(samples, |s| s.outdoor_temp_f).into_iter().reduce(f64::min))
}

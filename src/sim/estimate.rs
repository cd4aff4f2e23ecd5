//! Weekly and monthly cost estimates for a what-if forecast request.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SimulationConfig;
use crate::forecast;

use super::engine::PerformanceSimulator;
use super::types::{EquipmentSpec, ForecastHour, HourlyResult};

/// Weeks per month used to derive monthly cost.
pub const WEEKS_PER_MONTH: f64 = 4.33;
/// Hours in a week.
pub const HOURS_PER_WEEK: f64 = 168.0;
/// Longest horizon a single request may simulate (one leap year, h).
pub const MAX_DURATION_HOURS: f64 = 8784.0;

/// What-if request: one temperature source, a setpoint and a horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimateRequest {
    /// Outdoor temperature held constant (°F).
    #[serde(default)]
    pub outdoor_temp: Option<f64>,
    /// One outdoor temperature per hour (°F).
    #[serde(default)]
    pub outdoor_temps_array: Option<Vec<f64>>,
    /// Indoor setpoint (°F).
    pub target_temp: f64,
    /// Horizon (h).
    pub duration_hours: f64,
}

/// Rejected cost-estimate requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("no heat loss factor available; run a coast-down analysis or set one manually")]
    MissingHeatLoss,
    #[error("heat loss factor must be a positive number, got {0}")]
    InvalidHeatLoss(f64),
    #[error("duration_hours must be a positive number, got {0}")]
    InvalidDuration(f64),
    #[error("duration_hours must not exceed {max} h, got {0}", max = MAX_DURATION_HOURS)]
    DurationTooLong(f64),
    #[error("provide outdoor_temp or outdoor_temps_array")]
    MissingOutdoorTemps,
    #[error("provide only one of outdoor_temp or outdoor_temps_array")]
    AmbiguousOutdoorTemps,
    #[error("outdoor_temps_array is empty")]
    EmptyTemperatureArray,
}

/// Simulated cost for a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    /// Cost scaled to a 168-hour week (USD).
    pub weekly_cost: f64,
    /// `weekly_cost × 4.33` (USD).
    pub monthly_cost: f64,
    /// Unscaled cost of the simulated horizon (USD).
    pub total_cost: f64,
    /// Hours actually simulated.
    pub simulated_hours: f64,
    /// Per-hour results.
    pub breakdown: Vec<HourlyResult>,
}

/// JSON envelope for cost-estimate responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<HourlyResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<CostEstimate, EstimateError>> for CostEstimateResponse {
    fn from(result: Result<CostEstimate, EstimateError>) -> Self {
        match result {
            Ok(est) => Self {
                success: true,
                weekly_cost: Some(est.weekly_cost),
                monthly_cost: Some(est.monthly_cost),
                breakdown: Some(est.breakdown),
                error: None,
            },
            Err(e) => Self {
                success: false,
                weekly_cost: None,
                monthly_cost: None,
                breakdown: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Builds the forecast hours a request describes.
///
/// Arrays are truncated to `ceil(duration_hours)` entries; when the horizon
/// ends mid-hour the final entry is shortened to match.
///
/// # Errors
///
/// Returns an `EstimateError` for a duration that is not positive, exceeds
/// [`MAX_DURATION_HOURS`] or yields no forecast hour, or when the request
/// does not carry exactly one non-empty temperature source.
pub fn forecast_hours(
    request: &CostEstimateRequest,
    start: DateTime<FixedOffset>,
    humidity_pct: f64,
) -> Result<Vec<ForecastHour>, EstimateError> {
    let duration = request.duration_hours;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(EstimateError::InvalidDuration(duration));
    }
    if duration > MAX_DURATION_HOURS {
        return Err(EstimateError::DurationTooLong(duration));
    }

    let hours = match (request.outdoor_temp, request.outdoor_temps_array.as_deref()) {
        (Some(_), Some(_)) => return Err(EstimateError::AmbiguousOutdoorTemps),
        (None, None) => return Err(EstimateError::MissingOutdoorTemps),
        (None, Some([])) => return Err(EstimateError::EmptyTemperatureArray),
        (Some(t), None) => forecast::constant(start, t, duration, humidity_pct),
        (None, Some(temps)) => {
            let n = temps.len().min(duration.ceil() as usize);
            let mut hours = forecast::from_hourly_temps(start, &temps[..n], humidity_pct);
            if let Some(last) = hours.last_mut() {
                let remaining = duration - (n - 1) as f64;
                last.duration_hours = remaining.min(1.0);
            }
            hours
        }
    };
    // sub-nanosecond horizons round away to nothing
    if hours.is_empty() {
        return Err(EstimateError::InvalidDuration(duration));
    }
    Ok(hours)
}

/// Simulates a cost-estimate request.
///
/// # Arguments
///
/// * `request` - Temperature source, setpoint and horizon
/// * `heat_loss_factor` - Cached building coefficient, if one exists
/// * `equipment` - Heat-pump description
/// * `sim` - Aux permission, utility rate and default humidity
/// * `start` - Start of the first forecast hour
///
/// # Errors
///
/// Returns an `EstimateError` when no usable coefficient is cached or the
/// request is malformed.
pub fn estimate_cost(
    request: &CostEstimateRequest,
    heat_loss_factor: Option<f64>,
    equipment: &EquipmentSpec,
    sim: &SimulationConfig,
    start: DateTime<FixedOffset>,
) -> Result<CostEstimate, EstimateError> {
    let k = heat_loss_factor.ok_or(EstimateError::MissingHeatLoss)?;
    if !k.is_finite() || k <= 0.0 {
        return Err(EstimateError::InvalidHeatLoss(k));
    }
    let hours = forecast_hours(request, start, sim.humidity_pct)?;

    let simulator = PerformanceSimulator::new(
        k,
        request.target_temp,
        equipment.clone(),
        sim.aux_heat_enabled,
        sim.utility_rate_usd_per_kwh,
    );
    let breakdown = simulator.run(&hours);

    let simulated_hours: f64 = breakdown.iter().map(|r| r.duration_hours).sum();
    let total_cost: f64 = breakdown.iter().map(|r| r.cost_usd).sum();
    let weekly_cost =
        scale_to_week(&breakdown).ok_or(EstimateError::InvalidDuration(request.duration_hours))?;

    Ok(CostEstimate {
        weekly_cost,
        monthly_cost: weekly_cost * WEEKS_PER_MONTH,
        total_cost,
        simulated_hours,
        breakdown,
    })
}

/// Cost of a run scaled to a 168-hour week (USD); `None` when nothing was
/// simulated.
pub fn scale_to_week(results: &[HourlyResult]) -> Option<f64> {
    let hours: f64 = results.iter().map(|r| r.duration_hours).sum();
    let cost: f64 = results.iter().map(|r| r.cost_usd).sum();
    (hours > 0.0).then(|| cost * HOURS_PER_WEEK / hours)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-15T00:00:00-05:00").unwrap()
    }

    fn request(temp: Option<f64>, temps: Option<Vec<f64>>, hours: f64) -> CostEstimateRequest {
        CostEstimateRequest {
            outdoor_temp: temp,
            outdoor_temps_array: temps,
            target_temp: 70.0,
            duration_hours: hours,
        }
    }

    #[test]
    fn exactly_one_temperature_source() {
        let both = request(Some(40.0), Some(vec![40.0]), 24.0);
        assert_eq!(
            forecast_hours(&both, start(), 60.0),
            Err(EstimateError::AmbiguousOutdoorTemps)
        );
        let neither = request(None, None, 24.0);
        assert_eq!(
            forecast_hours(&neither, start(), 60.0),
            Err(EstimateError::MissingOutdoorTemps)
        );
        let empty = request(None, Some(vec![]), 24.0);
        assert_eq!(
            forecast_hours(&empty, start(), 60.0),
            Err(EstimateError::EmptyTemperatureArray)
        );
    }

    #[test]
    fn array_is_truncated_to_duration() {
        let req = request(None, Some(vec![30.0, 31.0, 32.0, 33.0]), 2.5);
        let hours = forecast_hours(&req, start(), 60.0).unwrap();
        assert_eq!(hours.len(), 3);
        assert_eq!(hours[2].outdoor_temp_f, 32.0);
        assert_eq!(hours[2].duration_hours, 0.5);
    }

    #[test]
    fn oversized_horizon_is_rejected_before_building() {
        let req = request(Some(45.0), None, 1e13);
        let eq = EquipmentSpec::new(2.0, 9.0, -15.0, 2000.0);
        let err = estimate_cost(&req, Some(850.0), &eq, &SimulationConfig::default(), start());
        assert_eq!(err, Err(EstimateError::DurationTooLong(1e13)));

        let longest = request(Some(45.0), None, MAX_DURATION_HOURS);
        let hours = forecast_hours(&longest, start(), 60.0).unwrap();
        assert_eq!(hours.len(), MAX_DURATION_HOURS as usize);
    }

    #[test]
    fn vanishing_horizon_is_invalid_not_free() {
        let req = request(Some(45.0), None, 1e-10);
        assert_eq!(
            forecast_hours(&req, start(), 60.0),
            Err(EstimateError::InvalidDuration(1e-10))
        );
        let eq = EquipmentSpec::new(2.0, 9.0, -15.0, 2000.0);
        let resp = CostEstimateResponse::from(estimate_cost(
            &req,
            Some(850.0),
            &eq,
            &SimulationConfig::default(),
            start(),
        ));
        assert!(!resp.success);
        assert!(resp.weekly_cost.is_none());
    }

    #[test]
    fn missing_heat_loss_is_an_error() {
        let req = request(Some(40.0), None, 24.0);
        let eq = EquipmentSpec::new(2.0, 9.0, -15.0, 2000.0);
        let err = estimate_cost(&req, None, &eq, &SimulationConfig::default(), start());
        assert_eq!(err, Err(EstimateError::MissingHeatLoss));
    }

    #[test]
    fn monthly_is_weekly_times_factor() {
        let req = request(Some(40.0), None, 48.0);
        let eq = EquipmentSpec::new(2.0, 9.0, -15.0, 2000.0);
        let est = estimate_cost(&req, Some(600.0), &eq, &SimulationConfig::default(), start())
            .unwrap();
        assert!((est.monthly_cost - est.weekly_cost * WEEKS_PER_MONTH).abs() < 1e-9);
        assert!((est.weekly_cost - est.total_cost * 168.0 / 48.0).abs() < 1e-9);
    }

    #[test]
    fn failure_response_carries_message_only() {
        let resp = CostEstimateResponse::from(Err(EstimateError::MissingHeatLoss));
        assert!(!resp.success);
        assert!(resp.weekly_cost.is_none());
        assert!(resp.error.as_deref().unwrap_or("").contains("heat loss"));
    }
}

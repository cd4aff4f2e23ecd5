//! API request and response bodies.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::analysis::{HeatLossEstimate, HeatLossSource};
use crate::forecast::DailyWeather;
use crate::sim::daily::DailyReport;

/// Cached estimate with the coefficient actually used for simulation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatLossResponse {
    pub estimate: HeatLossEstimate,
    /// Coefficient used by simulation endpoints (BTU/hr/°F).
    pub heat_loss_factor: f64,
    pub source: HeatLossSource,
}

/// Daily aggregation of a cost-estimate request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecastResponse {
    pub success: bool,
    pub heat_loss_factor: f64,
    pub target_temp: f64,
    pub report: DailyReport,
}

/// Daily weather to price as one billing period.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyForecastRequest {
    pub days: Vec<DailyWeather>,
    /// Local UTC offset of the weather dates in minutes; UTC when absent.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl MonthlyForecastRequest {
    /// Offset of the weather dates, `None` when out of range.
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.unwrap_or(0) * 60)
    }
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Human-readable error message.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_request_defaults_to_utc() {
        let req: MonthlyForecastRequest = serde_json::from_str(
            r#"{"days":[{"date":"2024-01-01","lowF":20,"highF":40}]}"#,
        )
        .unwrap();
        assert_eq!(req.days.len(), 1);
        assert_eq!(req.offset().map(|o| o.local_minus_utc()), Some(0));
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let req = MonthlyForecastRequest {
            days: Vec::new(),
            utc_offset_minutes: Some(48 * 60),
        };
        assert!(req.offset().is_none());
    }

    #[test]
    fn error_body_marks_failure() {
        let body = serde_json::to_value(ErrorResponse::new("nope")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "nope");
    }
}

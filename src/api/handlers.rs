//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use log::debug;

use super::AppState;
use super::types::{
    DailyForecastResponse, ErrorResponse, HeatLossResponse, MonthlyForecastRequest,
};
use crate::analysis::HeatLossSource;
use crate::forecast::current_hour_start;
use crate::sim::daily::DailyReport;
use crate::sim::estimate::{CostEstimateRequest, CostEstimateResponse, estimate_cost};
use crate::sim::monthly::forecast_month;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

/// `POST /cost-estimate` → 200 + `CostEstimateResponse`, or 400 with
/// `success: false` when the body, request or cached state is unusable.
pub async fn post_cost_estimate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CostEstimateRequest>, JsonRejection>,
) -> (StatusCode, Json<CostEstimateResponse>) {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("rejected cost estimate body: {rejection}");
            return (
                StatusCode::BAD_REQUEST,
                Json(CostEstimateResponse {
                    success: false,
                    weekly_cost: None,
                    monthly_cost: None,
                    breakdown: None,
                    error: Some(rejection.body_text()),
                }),
            );
        }
    };
    debug!("cost estimate request: {request:?}");
    let result = estimate_cost(
        &request,
        state.heat_loss_factor(),
        &state.equipment,
        &state.config.simulation,
        current_hour_start(),
    );
    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(CostEstimateResponse::from(result)))
}

/// `POST /daily-forecast` → 200 + `DailyForecastResponse`
pub async fn post_daily_forecast(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CostEstimateRequest>, JsonRejection>,
) -> Result<Json<DailyForecastResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| bad_request(rejection.body_text()))?;
    let estimate = estimate_cost(
        &request,
        state.heat_loss_factor(),
        &state.equipment,
        &state.config.simulation,
        current_hour_start(),
    )
    .map_err(|e| bad_request(e.to_string()))?;

    // estimate_cost already rejected a missing coefficient
    let k = state.heat_loss_factor().unwrap_or_default();
    let report = DailyReport::from_results(
        &estimate.breakdown,
        k,
        request.target_temp,
        state.config.simulation.days_reported,
    );
    Ok(Json(DailyForecastResponse {
        success: true,
        heat_loss_factor: k,
        target_temp: request.target_temp,
        report,
    }))
}

/// `GET /heat-loss` → 200 + `HeatLossResponse`, or 404 when no telemetry
/// was analyzed.
pub async fn get_heat_loss(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HeatLossResponse>, ApiError> {
    let Some(estimate) = state.estimate.clone() else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("no heat loss estimate has been computed")),
        ));
    };
    let (heat_loss_factor, source) = state.heat_loss.map_or(
        (estimate.heat_loss_factor, HeatLossSource::Analyzer),
        |h| (h.factor, h.source),
    );
    Ok(Json(HeatLossResponse {
        estimate,
        heat_loss_factor,
        source,
    }))
}

/// `POST /monthly-forecast` → 200 + `MonthlyForecast`
pub async fn post_monthly_forecast(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MonthlyForecastRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|rejection| bad_request(rejection.body_text()))?;
    let k = state
        .heat_loss_factor()
        .ok_or_else(|| bad_request("no heat loss factor available"))?;
    if request.days.is_empty() {
        return Err(bad_request("`days` must not be empty"));
    }
    let offset = request
        .offset()
        .ok_or_else(|| bad_request("`utcOffsetMinutes` must be within ±24 h"))?;

    let forecast = forecast_month(&request.days, k, &state.equipment, &state.config, offset);
    Ok(Json(forecast))
}

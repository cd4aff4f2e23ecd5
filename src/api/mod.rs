//! REST API for what-if cost queries against a cached heat-loss estimate.
//!
//! Endpoints:
//! - `POST /cost-estimate`: weekly and monthly cost with an hourly breakdown
//! - `POST /daily-forecast`: the same request aggregated into local days
//! - `GET /heat-loss`: the cached coast-down estimate
//! - `POST /monthly-forecast`: bill projection from daily weather

mod handlers;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use log::info;

use crate::analysis::{HeatLossEstimate, ResolvedHeatLoss};
use crate::config::EngineConfig;
use crate::sim::types::EquipmentSpec;

/// Immutable application state shared across all request handlers.
///
/// Built once after analysis and wrapped in `Arc`. Every simulation request
/// reads it without locking.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configuration the server was started with.
    pub config: EngineConfig,
    /// Equipment used for every simulation.
    pub equipment: EquipmentSpec,
    /// Coast-down estimate from the uploaded telemetry, if any.
    pub estimate: Option<HeatLossEstimate>,
    /// Coefficient used for simulation and where it came from.
    pub heat_loss: Option<ResolvedHeatLoss>,
}

impl AppState {
    /// Coefficient used by simulation endpoints (BTU/hr/°F).
    pub fn heat_loss_factor(&self) -> Option<f64> {
        self.heat_loss.map(|h| h.factor)
    }
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cost-estimate", post(handlers::post_cost_estimate))
        .route("/daily-forecast", post(handlers::post_daily_forecast))
        .route("/heat-loss", get(handlers::get_heat_loss))
        .route("/monthly-forecast", post(handlers::post_monthly_forecast))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `addr` - Socket address to bind to
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{addr}");
    axum::serve(listener, app).await
}

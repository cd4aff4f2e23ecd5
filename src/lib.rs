//! Heat-loss analysis and heating cost forecasts from thermostat telemetry.
//!
//! Raw exports are normalized by [`io::import`], a building coefficient is
//! inferred by [`analysis::CoastDownAnalyzer`], and [`sim`] replays a weather
//! forecast hour by hour to project energy and cost.

/// Coast-down heat-loss analysis.
pub mod analysis;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// Hourly forecast construction.
pub mod forecast;
pub mod io;
/// Staged heating simulation, aggregation and cost estimates.
pub mod sim;
pub mod synthetic;

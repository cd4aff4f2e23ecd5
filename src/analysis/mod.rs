//! Heat-loss inference from thermostat telemetry.

pub mod coastdown;
pub mod design;
pub mod diagnostics;
pub mod error;
pub mod segment;
pub mod types;

pub use coastdown::CoastDownAnalyzer;
pub use design::{HeatLossSource, HomeProfile, ResolvedHeatLoss, resolve_heat_loss_factor};
pub use diagnostics::DiagnosticReport;
pub use error::AnalysisError;
pub use types::{CoastDownPeriod, HeatLossEstimate, Sample, SearchMode};

//! Heating performance simulation, daily aggregation, and cost estimates.

/// Capacity, COP and defrost curves.
pub mod curves;
pub mod daily;
pub mod engine;
/// What-if cost estimates.
pub mod estimate;
pub mod monthly;
pub mod types;

//! CSV import and export.

/// Telemetry header resolution.
pub mod columns;
pub mod export;
pub mod import;

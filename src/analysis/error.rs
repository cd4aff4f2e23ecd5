//! Errors surfaced by coast-down analysis. None of them are retried.

use thiserror::Error;

use super::diagnostics::DiagnosticReport;

/// Failure modes of [`CoastDownAnalyzer::analyze`](super::CoastDownAnalyzer::analyze).
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No strict or fallback period qualified.
    #[error("no qualifying coast-down period found\n{0}")]
    InsufficientData(Box<DiagnosticReport>),

    /// Indoor temperature rose across the period, so heat was being added.
    #[error(
        "indoor temperature rose {rise_f:.2}°F over {duration_hours:.2} h \
         (start {start_f:.2}°F, end {end_f:.2}°F, range {min_f:.2}–{max_f:.2}°F); \
         heat was being added, so pick a period with the system fully off \
         (e.g. an overnight setback) and re-run the analysis"
    )]
    ImplausibleTrend {
        start_f: f64,
        end_f: f64,
        min_f: f64,
        max_f: f64,
        rise_f: f64,
        duration_hours: f64,
    },

    /// A period boundary row lacks a usable temperature.
    #[error("missing or invalid temperature at period {position}: {row}")]
    InvalidTemperature { position: &'static str, row: String },

    /// Outdoor air was as warm as indoor air on average.
    #[error(
        "average outdoor temperature {avg_outdoor_f:.2}°F is not below \
         average indoor temperature {avg_indoor_f:.2}°F"
    )]
    DegenerateTempDiff { avg_indoor_f: f64, avg_outdoor_f: f64 },
}

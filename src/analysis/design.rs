//! Rule-of-thumb design heat loss and heat-loss source resolution.

use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::HeatLossConfig;

use super::coastdown::DESIGN_DELTA_T_F;
use super::types::HeatLossEstimate;

/// Design heat loss per ft² at a 70 °F difference for average construction.
pub const BTU_PER_SQFT_AT_DESIGN: f64 = 22.67;
/// Fraction of floor area treated as conditioned shell for loft homes.
pub const LOFT_AREA_FRACTION: f64 = 0.65;
/// Ceiling height the per-ft² figure assumes (ft).
pub const REFERENCE_CEILING_FT: f64 = 8.0;
/// Heat-loss increase per foot of ceiling above the reference.
pub const CEILING_ADJUSTMENT_PER_FT: f64 = 0.1;
/// Shape multiplier range that indicates a loft or cabin layout.
const LOFT_SHAPE_RANGE: std::ops::Range<f64> = 1.2..1.3;

/// Building description used when no measured coefficient exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeProfile {
    /// Conditioned floor area (ft²).
    pub square_feet: f64,
    /// Insulation multiplier (1.0 average, lower is tighter).
    pub insulation_level: f64,
    /// Shape multiplier (1.0 two-story box, higher for sprawling layouts).
    pub home_shape: f64,
    /// Average ceiling height (ft).
    pub ceiling_height_ft: f64,
    /// Whether the home has an open loft.
    pub has_loft: bool,
}

impl HomeProfile {
    /// Builds a profile from the heat-loss config section.
    pub fn from_config(cfg: &HeatLossConfig, square_feet: f64) -> Self {
        Self {
            square_feet,
            insulation_level: cfg.insulation_level,
            home_shape: cfg.home_shape,
            ceiling_height_ft: cfg.ceiling_height_ft,
            has_loft: cfg.has_loft,
        }
    }

    /// Design heat loss at a 70 °F difference, rounded to 1000 BTU/hr.
    pub fn design_heat_loss_btu_hr(&self) -> f64 {
        let effective_sqft = if self.has_loft && LOFT_SHAPE_RANGE.contains(&self.home_shape) {
            self.square_feet * LOFT_AREA_FRACTION
        } else {
            self.square_feet
        };
        let ceiling = 1.0 + (self.ceiling_height_ft - REFERENCE_CEILING_FT) * CEILING_ADJUSTMENT_PER_FT;
        let raw = effective_sqft
            * BTU_PER_SQFT_AT_DESIGN
            * self.insulation_level
            * self.home_shape
            * ceiling;
        (raw / 1000.0).round() * 1000.0
    }

    /// Design heat loss expressed as a coefficient (BTU/hr/°F).
    pub fn heat_loss_factor(&self) -> f64 {
        self.design_heat_loss_btu_hr() / DESIGN_DELTA_T_F
    }
}

/// Where a simulation's heat-loss coefficient came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatLossSource {
    Manual,
    Analyzer,
    Design,
}

impl fmt::Display for HeatLossSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual entry"),
            Self::Analyzer => write!(f, "coast-down analysis"),
            Self::Design => write!(f, "design estimate"),
        }
    }
}

/// Coefficient chosen for simulation together with its source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedHeatLoss {
    pub factor: f64,
    pub source: HeatLossSource,
}

/// Picks the coefficient: manual override, then analyzer estimate, then the
/// design rule of thumb.
pub fn resolve_heat_loss_factor(
    cfg: &HeatLossConfig,
    square_feet: f64,
    estimate: Option<&HeatLossEstimate>,
) -> ResolvedHeatLoss {
    let resolved = match (cfg.use_manual, cfg.manual_btu_per_hr_per_f, estimate) {
        (true, Some(k), _) if k > 0.0 => ResolvedHeatLoss {
            factor: k,
            source: HeatLossSource::Manual,
        },
        (_, _, Some(est)) if cfg.use_analyzer => ResolvedHeatLoss {
            factor: est.heat_loss_factor,
            source: HeatLossSource::Analyzer,
        },
        _ => ResolvedHeatLoss {
            factor: HomeProfile::from_config(cfg, square_feet).heat_loss_factor(),
            source: HeatLossSource::Design,
        },
    };
    info!(
        "using heat loss factor {:.1} BTU/hr/°F from {}",
        resolved.factor, resolved.source
    );
    resolved
}

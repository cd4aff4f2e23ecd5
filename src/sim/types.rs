//! Core simulation types: equipment, forecast hours, and per-hour results.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::curves;

/// BTU in one kilowatt-hour.
pub const BTU_PER_KWH: f64 = 3412.14;
/// BTU/hr in one ton of heating capacity.
pub const BTU_PER_TON: f64 = 12_000.0;
/// Relative humidity assumed when a forecast omits it (%).
pub const DEFAULT_HUMIDITY_PCT: f64 = 60.0;
/// Compressor kW per ton at HSPF2 1.0, scaled down by the rating.
const COMPRESSOR_KW_PER_TON_HSPF2: f64 = 15.0;

/// Heat-pump and auxiliary equipment description.
///
/// # Examples
///
/// ```
/// use heatloss_sim::sim::types::EquipmentSpec;
///
/// let eq = EquipmentSpec::new(2.0, 9.0, -15.0, 2000.0);
/// assert!((eq.compressor_power_kw - 2.0 * 15.0 / 9.0).abs() < 1e-12);
/// assert!(eq.is_locked_out(-15.0));
/// assert_eq!(eq.capacity_btu_hr(-15.0), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSpec {
    /// Nameplate capacity (tons); `f64::INFINITY` models an unlimited source.
    pub tons: f64,
    /// Rated compressor electrical draw (kW).
    pub compressor_power_kw: f64,
    /// Seasonal heating efficiency rating.
    pub hspf2: f64,
    /// Compressor is locked out at and below this outdoor temperature (°F).
    pub cutoff_temp_f: f64,
    /// Conditioned floor area (ft²).
    pub square_feet: f64,
    /// Fixed COP replacing the curve and defrost model.
    pub cop_override: Option<f64>,
    /// Whether to apply the defrost penalty.
    pub defrost_enabled: bool,
}

impl EquipmentSpec {
    /// Creates a heat pump with compressor power derived from tons and HSPF2.
    ///
    /// # Arguments
    ///
    /// * `tons` - Nameplate capacity (must be > 0)
    /// * `hspf2` - Efficiency rating (must be > 0)
    /// * `cutoff_temp_f` - Compressor lockout temperature (°F)
    /// * `square_feet` - Conditioned floor area (ft²)
    ///
    /// # Panics
    ///
    /// Panics if `tons` or `hspf2` is not positive.
    pub fn new(tons: f64, hspf2: f64, cutoff_temp_f: f64, square_feet: f64) -> Self {
        assert!(tons > 0.0, "tons must be > 0");
        assert!(hspf2 > 0.0, "hspf2 must be > 0");
        Self {
            tons,
            compressor_power_kw: tons * COMPRESSOR_KW_PER_TON_HSPF2 / hspf2,
            hspf2,
            cutoff_temp_f,
            square_feet,
            cop_override: None,
            defrost_enabled: true,
        }
    }

    /// Unlimited heat source at COP 1.0 with no lockout, matching pure
    /// resistance heating.
    pub fn resistive_equivalent(square_feet: f64) -> Self {
        Self {
            tons: f64::INFINITY,
            compressor_power_kw: f64::INFINITY,
            hspf2: BTU_PER_KWH / 1000.0,
            cutoff_temp_f: f64::NEG_INFINITY,
            square_feet,
            cop_override: Some(1.0),
            defrost_enabled: false,
        }
    }

    /// Replaces the COP curve with a fixed value.
    pub fn with_cop_override(mut self, cop: f64) -> Self {
        self.cop_override = Some(cop);
        self
    }

    /// Enables or disables the defrost penalty.
    pub fn with_defrost(mut self, enabled: bool) -> Self {
        self.defrost_enabled = enabled;
        self
    }

    /// Overrides the derived compressor draw.
    pub fn with_compressor_power_kw(mut self, kw: f64) -> Self {
        self.compressor_power_kw = kw;
        self
    }

    /// Whether the compressor is locked out at `outdoor_temp_f`.
    pub fn is_locked_out(&self, outdoor_temp_f: f64) -> bool {
        outdoor_temp_f <= self.cutoff_temp_f
    }

    /// Available heat-pump output at `outdoor_temp_f` (BTU/hr).
    pub fn capacity_btu_hr(&self, outdoor_temp_f: f64) -> f64 {
        let factor = curves::capacity_factor(outdoor_temp_f, self.cutoff_temp_f);
        if factor <= 0.0 {
            // Infinite tons times a zero factor would be NaN.
            return 0.0;
        }
        self.tons * BTU_PER_TON * factor
    }

    /// COP after defrost at the given conditions.
    pub fn effective_cop(&self, outdoor_temp_f: f64, humidity_pct: f64) -> f64 {
        if let Some(cop) = self.cop_override {
            return cop;
        }
        let cop = curves::cop(outdoor_temp_f, self.hspf2);
        if self.defrost_enabled {
            (cop / curves::defrost_penalty(outdoor_temp_f, humidity_pct)).max(0.5)
        } else {
            cop
        }
    }

    /// Nameplate COP implied by capacity and compressor draw, when both are finite.
    pub fn nameplate_cop(&self) -> Option<f64> {
        let cop = self.tons * BTU_PER_TON / (self.compressor_power_kw * BTU_PER_KWH);
        cop.is_finite().then_some(cop)
    }
}

/// One forecast interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastHour {
    /// Interval start, carrying its local UTC offset.
    pub time: DateTime<FixedOffset>,
    /// Outdoor temperature (°F).
    pub outdoor_temp_f: f64,
    /// Relative humidity (%).
    pub humidity_pct: f64,
    /// Interval length (h), always > 0.
    pub duration_hours: f64,
}

impl ForecastHour {
    /// Creates a one-hour interval at the default humidity.
    pub fn new(time: DateTime<FixedOffset>, outdoor_temp_f: f64) -> Self {
        Self {
            time,
            outdoor_temp_f,
            humidity_pct: DEFAULT_HUMIDITY_PCT,
            duration_hours: 1.0,
        }
    }
}

/// Complete record of one simulated forecast interval.
///
/// Energies are for the whole interval; `hp_capacity_btu_hr` is a rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyResult {
    /// Interval start.
    pub time: DateTime<FixedOffset>,
    /// Outdoor temperature (°F).
    pub outdoor_temp_f: f64,
    /// Target minus outdoor, floored at zero (°F).
    pub delta_t_f: f64,
    /// Heat needed to hold the target over the interval (BTU).
    pub building_load_btu: f64,
    /// Heat-pump output available (BTU/hr).
    pub hp_capacity_btu_hr: f64,
    /// Heat delivered by the heat pump (BTU).
    pub hp_delivered_btu: f64,
    /// Heat delivered by auxiliary resistance (BTU).
    pub aux_delivered_btu: f64,
    /// Load neither stage covered (BTU).
    pub unmet_btu: f64,
    /// Heat-pump energy (kWh).
    pub hp_kwh: f64,
    /// Auxiliary energy (kWh).
    pub aux_kwh: f64,
    /// Energy cost (USD).
    pub cost_usd: f64,
    /// Effective COP used for the interval.
    pub cop: f64,
    /// Compressor locked out by the cutoff temperature.
    pub locked_out: bool,
    /// Outdoor was warmer than target and the load was clamped to zero.
    pub load_clamped: bool,
    /// Interval length (h).
    pub duration_hours: f64,
}

impl HourlyResult {
    /// Total delivered heat from both stages (BTU).
    pub fn delivered_btu(&self) -> f64 {
        self.hp_delivered_btu + self.aux_delivered_btu
    }

    /// Total energy from both stages (kWh).
    pub fn total_kwh(&self) -> f64 {
        self.hp_kwh + self.aux_kwh
    }
}

impl fmt::Display for HourlyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | out={:>6.1}°F  ΔT={:>5.1} | load={:>8.0} BTU  hp={:>8.0}  aux={:>7.0}  \
             unmet={:>6.0} | hp={:>5.2} kWh  aux={:>5.2} kWh  cop={:.2} | ${:.3}{}",
            self.time.format("%Y-%m-%d %H:%M %:z"),
            self.outdoor_temp_f,
            self.delta_t_f,
            self.building_load_btu,
            self.hp_delivered_btu,
            self.aux_delivered_btu,
            self.unmet_btu,
            self.hp_kwh,
            self.aux_kwh,
            self.cop,
            self.cost_usd,
            if self.locked_out { " LOCKOUT" } else { "" },
        )
    }
}

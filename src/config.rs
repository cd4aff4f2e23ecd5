//! TOML-based engine configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::segment::DEFAULT_NIGHTTIME_PREFERENCE_RATIO;
use crate::sim::daily::DEFAULT_DAYS_REPORTED;
use crate::sim::types::{DEFAULT_HUMIDITY_PCT, EquipmentSpec};

/// Default conditioned floor area (ft²).
pub const DEFAULT_SQUARE_FEET: f64 = 2000.0;
/// Default lumped thermal mass per ft² of floor (BTU/°F/ft²).
///
/// A single figure for all construction types; the heat-loss estimate is
/// directly proportional to it, so it bounds the estimate's precision.
pub const DEFAULT_THERMAL_MASS_BTU_PER_F_PER_SQFT: f64 = 8.0;
/// Default heat-pump capacity (tons).
pub const DEFAULT_TONS: f64 = 2.0;
/// Default heat-pump efficiency rating.
pub const DEFAULT_HSPF2: f64 = 9.0;
/// Default compressor lockout temperature (°F).
pub const DEFAULT_CUTOFF_TEMP_F: f64 = -15.0;
/// Default indoor setpoint for what-if runs (°F).
pub const DEFAULT_TARGET_TEMP_F: f64 = 70.0;
/// Default electricity price (USD/kWh).
pub const DEFAULT_UTILITY_RATE: f64 = 0.15;
/// Default daytime setpoint for monthly forecasts (°F).
pub const DEFAULT_DAY_TEMP_F: f64 = 70.0;
/// Default nighttime setpoint for monthly forecasts (°F).
pub const DEFAULT_NIGHT_TEMP_F: f64 = 68.0;
/// Default non-HVAC consumption (kWh/day).
pub const DEFAULT_BASELOAD_KWH_PER_DAY: f64 = 10.0;

/// Top-level engine configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`EngineConfig::from_toml_file`] or use [`EngineConfig::baseline`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Coast-down analysis parameters.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Heat-pump equipment.
    #[serde(default)]
    pub equipment: EquipmentConfig,
    /// Forecast simulation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Heat-loss source selection and home profile.
    #[serde(default)]
    pub heat_loss: HeatLossConfig,
    /// Bill components outside HVAC.
    #[serde(default)]
    pub billing: BillingConfig,
    /// Day/night setpoints for monthly forecasts.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Coast-down analysis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Conditioned floor area (ft², must be > 0).
    pub square_feet: f64,
    /// Lumped thermal mass per ft² (BTU/°F/ft², must be > 0).
    pub thermal_mass_btu_per_f_per_sqft: f64,
    /// Share of the longest run a nighttime run needs to be preferred (0–1).
    pub nighttime_preference_ratio: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            square_feet: DEFAULT_SQUARE_FEET,
            thermal_mass_btu_per_f_per_sqft: DEFAULT_THERMAL_MASS_BTU_PER_F_PER_SQFT,
            nighttime_preference_ratio: DEFAULT_NIGHTTIME_PREFERENCE_RATIO,
        }
    }
}

/// Heat-pump equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EquipmentConfig {
    /// Nameplate capacity (tons, must be > 0; `inf` for unlimited).
    pub tons: f64,
    /// Efficiency rating (must be > 0).
    pub hspf2: f64,
    /// Compressor lockout temperature (°F).
    pub cutoff_temp_f: f64,
    /// Compressor draw (kW); derived from tons and HSPF2 when absent.
    pub compressor_power_kw: Option<f64>,
    /// Fixed COP replacing the curve.
    pub cop_override: Option<f64>,
    /// Apply the defrost penalty.
    pub defrost: bool,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            tons: DEFAULT_TONS,
            hspf2: DEFAULT_HSPF2,
            cutoff_temp_f: DEFAULT_CUTOFF_TEMP_F,
            compressor_power_kw: None,
            cop_override: None,
            defrost: true,
        }
    }
}

impl EquipmentConfig {
    /// Builds the equipment description for a home of `square_feet`.
    ///
    /// # Panics
    ///
    /// Panics if `tons` or `hspf2` is not positive; call
    /// [`EngineConfig::validate`] first.
    pub fn spec(&self, square_feet: f64) -> EquipmentSpec {
        let mut spec = EquipmentSpec::new(self.tons, self.hspf2, self.cutoff_temp_f, square_feet)
            .with_defrost(self.defrost);
        if let Some(kw) = self.compressor_power_kw {
            spec = spec.with_compressor_power_kw(kw);
        }
        if let Some(cop) = self.cop_override {
            spec = spec.with_cop_override(cop);
        }
        spec
    }
}

/// Forecast simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Indoor setpoint (°F).
    pub target_temp_f: f64,
    /// Whether auxiliary heat covers heat-pump shortfall.
    pub aux_heat_enabled: bool,
    /// Electricity price (USD/kWh, must be >= 0).
    pub utility_rate_usd_per_kwh: f64,
    /// Days in the daily report (must be > 0).
    pub days_reported: usize,
    /// Humidity for forecasts that omit it (%, 0–100).
    pub humidity_pct: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            target_temp_f: DEFAULT_TARGET_TEMP_F,
            aux_heat_enabled: true,
            utility_rate_usd_per_kwh: DEFAULT_UTILITY_RATE,
            days_reported: DEFAULT_DAYS_REPORTED,
            humidity_pct: DEFAULT_HUMIDITY_PCT,
        }
    }
}

/// Heat-loss source selection and home profile for the design estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatLossConfig {
    /// Use `manual_btu_per_hr_per_f` ahead of any other source.
    pub use_manual: bool,
    /// Manually entered coefficient (BTU/hr/°F).
    pub manual_btu_per_hr_per_f: Option<f64>,
    /// Use the coast-down estimate when one is available.
    pub use_analyzer: bool,
    /// Insulation multiplier (1.0 average).
    pub insulation_level: f64,
    /// Shape multiplier (1.0 two-story box).
    pub home_shape: f64,
    /// Average ceiling height (ft).
    pub ceiling_height_ft: f64,
    /// Whether the home has an open loft.
    pub has_loft: bool,
}

impl Default for HeatLossConfig {
    fn default() -> Self {
        Self {
            use_manual: false,
            manual_btu_per_hr_per_f: None,
            use_analyzer: true,
            insulation_level: 1.0,
            home_shape: 1.0,
            ceiling_height_ft: 8.0,
            has_loft: false,
        }
    }
}

/// Bill components outside HVAC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    /// Fixed monthly service charge (USD).
    pub fixed_monthly_usd: f64,
    /// Non-HVAC consumption (kWh/day, clamped to 5–25 when billed).
    pub baseload_kwh_per_day: f64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            fixed_monthly_usd: 0.0,
            baseload_kwh_per_day: DEFAULT_BASELOAD_KWH_PER_DAY,
        }
    }
}

/// Day/night setpoints for monthly forecasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Setpoint for the 16 daytime hours (°F).
    pub day_temp_f: f64,
    /// Setpoint for the 8 nighttime hours (°F).
    pub night_temp_f: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            day_temp_f: DEFAULT_DAY_TEMP_F,
            night_temp_f: DEFAULT_NIGHT_TEMP_F,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"equipment.hspf2"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl EngineConfig {
    /// Returns the baseline configuration: a 2-ton HSPF2 9 heat pump in a
    /// 2000 ft² home with aux heat.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the cold-climate preset: larger variable-speed unit with a
    /// deep lockout and tighter envelope.
    pub fn cold_climate() -> Self {
        Self {
            equipment: EquipmentConfig {
                tons: 3.0,
                hspf2: 10.5,
                cutoff_temp_f: -22.0,
                ..EquipmentConfig::default()
            },
            simulation: SimulationConfig {
                target_temp_f: 68.0,
                humidity_pct: 70.0,
                ..SimulationConfig::default()
            },
            heat_loss: HeatLossConfig {
                insulation_level: 0.8,
                ..HeatLossConfig::default()
            },
            schedule: ScheduleConfig {
                day_temp_f: 68.0,
                night_temp_f: 65.0,
            },
            ..Self::default()
        }
    }

    /// Returns the resistive-equivalent preset: unlimited capacity at COP 1.0
    /// with no lockout or defrost, for comparing against baseboard heat.
    pub fn resistive_equivalent() -> Self {
        Self {
            equipment: EquipmentConfig {
                tons: f64::INFINITY,
                cutoff_temp_f: f64::NEG_INFINITY,
                cop_override: Some(1.0),
                defrost: false,
                ..EquipmentConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "cold_climate", "resistive_equivalent"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "cold_climate" => Ok(Self::cold_climate()),
            "resistive_equivalent" => Ok(Self::resistive_equivalent()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Equipment description for this configuration's floor area.
    ///
    /// # Panics
    ///
    /// Panics on invalid equipment; see [`EquipmentConfig::spec`].
    pub fn equipment_spec(&self) -> EquipmentSpec {
        self.equipment.spec(self.analysis.square_feet)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut positive = |field: &str, value: f64| {
            if value.is_nan() || value <= 0.0 {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        };

        let a = &self.analysis;
        positive("analysis.square_feet", a.square_feet);
        positive(
            "analysis.thermal_mass_btu_per_f_per_sqft",
            a.thermal_mass_btu_per_f_per_sqft,
        );

        let e = &self.equipment;
        positive("equipment.tons", e.tons);
        positive("equipment.hspf2", e.hspf2);
        if let Some(kw) = e.compressor_power_kw {
            positive("equipment.compressor_power_kw", kw);
        }
        if let Some(cop) = e.cop_override {
            positive("equipment.cop_override", cop);
        }

        let h = &self.heat_loss;
        positive("heat_loss.insulation_level", h.insulation_level);
        positive("heat_loss.home_shape", h.home_shape);
        positive("heat_loss.ceiling_height_ft", h.ceiling_height_ft);
        if let Some(k) = h.manual_btu_per_hr_per_f {
            positive("heat_loss.manual_btu_per_hr_per_f", k);
        }

        if !(0.0..=1.0).contains(&a.nighttime_preference_ratio) {
            errors.push(ConfigError::new(
                "analysis.nighttime_preference_ratio",
                "must be in [0.0, 1.0]",
            ));
        }
        if h.use_manual && h.manual_btu_per_hr_per_f.is_none() {
            errors.push(ConfigError::new(
                "heat_loss.manual_btu_per_hr_per_f",
                "required when heat_loss.use_manual = true",
            ));
        }

        let s = &self.simulation;
        if s.utility_rate_usd_per_kwh.is_nan() || s.utility_rate_usd_per_kwh < 0.0 {
            errors.push(ConfigError::new(
                "simulation.utility_rate_usd_per_kwh",
                "must be >= 0",
            ));
        }
        if s.days_reported == 0 {
            errors.push(ConfigError::new("simulation.days_reported", "must be > 0"));
        }
        if !(0.0..=100.0).contains(&s.humidity_pct) {
            errors.push(ConfigError::new(
                "simulation.humidity_pct",
                "must be in [0, 100]",
            ));
        }
        if self.billing.fixed_monthly_usd < 0.0 {
            errors.push(ConfigError::new("billing.fixed_monthly_usd", "must be >= 0"));
        }

        errors
    }
}

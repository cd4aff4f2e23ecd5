//! Monthly bill forecast from daily weather.

use std::fmt;

use chrono::FixedOffset;
use serde::Serialize;

use crate::config::{BillingConfig, EngineConfig, ScheduleConfig};
use crate::forecast::{self, DailyWeather};

use super::daily::DailyReport;
use super::engine::PerformanceSimulator;
use super::estimate::WEEKS_PER_MONTH;
use super::types::EquipmentSpec;

/// Daytime setpoint hours per day.
pub const DAY_SETPOINT_HOURS: f64 = 16.0;
/// Nighttime setpoint hours per day.
pub const NIGHT_SETPOINT_HOURS: f64 = 8.0;
/// Lower clamp for daily baseload consumption (kWh).
pub const MIN_BASELOAD_KWH_PER_DAY: f64 = 5.0;
/// Upper clamp for daily baseload consumption (kWh).
pub const MAX_BASELOAD_KWH_PER_DAY: f64 = 25.0;

/// Projected electricity bill for a run of days.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyForecast {
    pub days: usize,
    /// Time-weighted indoor setpoint (°F).
    pub indoor_temp_f: f64,
    pub night_temp_f: f64,
    pub hvac_cost: f64,
    pub baseload_cost: f64,
    pub fixed_cost: f64,
    /// HVAC plus baseload (USD).
    pub variable_cost: f64,
    pub total_cost: f64,
    /// `total_cost / 4.33` (USD).
    pub weekly_equivalent: f64,
    pub total_energy_kwh: f64,
    pub hp_energy_kwh: f64,
    pub aux_energy_kwh: f64,
    pub electricity_rate: f64,
    pub daily: DailyReport,
}

/// Setpoint averaged over a 16 h day and an 8 h night.
pub fn weighted_indoor_temp(schedule: &ScheduleConfig) -> f64 {
    (schedule.day_temp_f * DAY_SETPOINT_HOURS + schedule.night_temp_f * NIGHT_SETPOINT_HOURS)
        / (DAY_SETPOINT_HOURS + NIGHT_SETPOINT_HOURS)
}

fn baseload_kwh_per_day(billing: &BillingConfig) -> f64 {
    billing
        .baseload_kwh_per_day
        .clamp(MIN_BASELOAD_KWH_PER_DAY, MAX_BASELOAD_KWH_PER_DAY)
}

/// Simulates 24 hours per weather day and prices the result.
///
/// # Arguments
///
/// * `days` - Daily weather, one entry per billed day
/// * `heat_loss_factor` - Building coefficient (BTU/hr/°F)
/// * `equipment` - Heat-pump description
/// * `config` - Rate, aux permission, billing and schedule sections
/// * `offset` - Local UTC offset of the weather dates
pub fn forecast_month(
    days: &[DailyWeather],
    heat_loss_factor: f64,
    equipment: &EquipmentSpec,
    config: &EngineConfig,
    offset: FixedOffset,
) -> MonthlyForecast {
    let sim = &config.simulation;
    let indoor = weighted_indoor_temp(&config.schedule);
    let hours = forecast::from_daily(days, offset, sim.humidity_pct);

    let simulator = PerformanceSimulator::new(
        heat_loss_factor,
        indoor,
        equipment.clone(),
        sim.aux_heat_enabled,
        sim.utility_rate_usd_per_kwh,
    );
    let results = simulator.run(&hours);

    let hp_energy_kwh: f64 = results.iter().map(|r| r.hp_kwh).sum();
    let aux_energy_kwh: f64 = results.iter().map(|r| r.aux_kwh).sum();
    let rate = sim.utility_rate_usd_per_kwh;

    let hvac_cost = results.iter().map(|r| r.cost_usd).sum::<f64>();
    let baseload_cost = baseload_kwh_per_day(&config.billing) * days.len() as f64 * rate;
    let fixed_cost = config.billing.fixed_monthly_usd;
    let total_cost = hvac_cost + baseload_cost + fixed_cost;

    MonthlyForecast {
        days: days.len(),
        indoor_temp_f: indoor,
        night_temp_f: config.schedule.night_temp_f,
        hvac_cost,
        baseload_cost,
        fixed_cost,
        variable_cost: hvac_cost + baseload_cost,
        total_cost,
        weekly_equivalent: total_cost / WEEKS_PER_MONTH,
        total_energy_kwh: hp_energy_kwh + aux_energy_kwh,
        hp_energy_kwh,
        aux_energy_kwh,
        electricity_rate: rate,
        daily: DailyReport::from_results(&results, heat_loss_factor, indoor, days.len()),
    }
}

impl fmt::Display for MonthlyForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Monthly Forecast ({} days) ---", self.days)?;
        writeln!(f, "Weighted setpoint:     {:.1} °F", self.indoor_temp_f)?;
        writeln!(
            f,
            "Energy:                {:.1} kWh ({:.1} hp, {:.1} aux)",
            self.total_energy_kwh, self.hp_energy_kwh, self.aux_energy_kwh
        )?;
        writeln!(f, "HVAC cost:             ${:.2}", self.hvac_cost)?;
        writeln!(f, "Baseload cost:         ${:.2}", self.baseload_cost)?;
        writeln!(f, "Fixed charges:         ${:.2}", self.fixed_cost)?;
        writeln!(f, "Total:                 ${:.2}", self.total_cost)?;
        write!(f, "Weekly equivalent:     ${:.2}", self.weekly_equivalent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn days(n: u32, low: f64, high: f64) -> Vec<DailyWeather> {
        (1..=n)
            .map(|d| DailyWeather {
                date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                low_f: low,
                high_f: high,
                avg_f: None,
                humidity_pct: None,
            })
            .collect()
    }

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    #[test]
    fn weighted_setpoint_defaults() {
        let t = weighted_indoor_temp(&ScheduleConfig::default());
        assert!((t - (70.0 * 16.0 + 68.0 * 8.0) / 24.0).abs() < 1e-12);
    }

    #[test]
    fn totals_add_up() {
        let cfg = EngineConfig::baseline();
        let eq = cfg.equipment.spec(cfg.analysis.square_feet);
        let fc = forecast_month(&days(30, 20.0, 40.0), 600.0, &eq, &cfg, offset());
        assert_eq!(fc.days, 30);
        assert_eq!(fc.daily.days.len(), 30);
        assert!((fc.total_cost - (fc.hvac_cost + fc.baseload_cost + fc.fixed_cost)).abs() < 1e-9);
        assert!((fc.weekly_equivalent * WEEKS_PER_MONTH - fc.total_cost).abs() < 1e-9);
        assert!(
            (fc.baseload_cost - 10.0 * 30.0 * cfg.simulation.utility_rate_usd_per_kwh).abs()
                < 1e-9
        );
    }

    #[test]
    fn baseload_is_clamped() {
        let billing = BillingConfig {
            baseload_kwh_per_day: 100.0,
            ..BillingConfig::default()
        };
        assert_eq!(baseload_kwh_per_day(&billing), MAX_BASELOAD_KWH_PER_DAY);
    }

    #[test]
    fn colder_month_costs_more() {
        let cfg = EngineConfig::baseline();
        let eq = cfg.equipment.spec(cfg.analysis.square_feet);
        let mild = forecast_month(&days(7, 35.0, 50.0), 600.0, &eq, &cfg, offset());
        let cold = forecast_month(&days(7, 5.0, 20.0), 600.0, &eq, &cfg, offset());
        assert!(cold.hvac_cost > mild.hvac_cost);
    }
}

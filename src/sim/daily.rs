//! Post-hoc daily aggregation of hourly simulation results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use log::warn;
use serde::Serialize;

use super::types::{BTU_PER_KWH, HourlyResult};

/// Days reported when no count is configured.
pub const DEFAULT_DAYS_REPORTED: usize = 7;
/// Absolute tolerance of the daily heat balance check (BTU).
pub const BALANCE_TOLERANCE_BTU: f64 = 1.0;
/// Relative tolerance of the daily heat balance check.
pub const BALANCE_TOLERANCE_REL: f64 = 1e-6;
const FULL_DAY_HOURS: f64 = 24.0;

/// One local calendar day of simulated heating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// Local calendar date.
    pub date: NaiveDate,
    /// Simulated hours in the day.
    pub hours: f64,
    /// Duration-weighted mean outdoor temperature (°F).
    pub avg_outdoor_f: f64,
    /// Duration-weighted mean indoor/outdoor difference (°F).
    pub avg_delta_t_f: f64,
    /// Building load recomputed from the coefficient and setpoint (BTU).
    pub total_load_btu: f64,
    pub hp_delivered_btu: f64,
    pub aux_delivered_btu: f64,
    pub unmet_btu: f64,
    pub hp_kwh: f64,
    pub aux_kwh: f64,
    pub cost_usd: f64,
    /// Heat-pump delivered heat per unit of heat-pump energy; `None` when the
    /// heat pump drew no energy.
    pub implied_cop: Option<f64>,
    /// `total_load_btu` minus the heat delivered or recorded as unmet (BTU).
    pub balance_error_btu: f64,
    /// Whether the balance closed within tolerance.
    pub balanced: bool,
    /// Fewer than 24 simulated hours fell on this date.
    pub partial: bool,
}

/// Daily summaries for a simulation run, grouped by local date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    /// Reported days in ascending date order.
    pub days: Vec<DailySummary>,
    /// Distinct dates present before truncation.
    pub total_days: usize,
    /// Sum of reported daily costs (USD).
    pub total_cost_usd: f64,
    /// Sum of reported heat-pump energy (kWh).
    pub total_hp_kwh: f64,
    /// Sum of reported auxiliary energy (kWh).
    pub total_aux_kwh: f64,
    /// Sum of reported unmet load (BTU).
    pub total_unmet_btu: f64,
}

impl DailyReport {
    /// Groups hourly results by the local date of their timestamps.
    ///
    /// # Arguments
    ///
    /// * `results` - Hourly results in any order
    /// * `heat_loss_factor` - Building coefficient used for the run (BTU/hr/°F)
    /// * `target_temp_f` - Setpoint used for the run (°F)
    /// * `days_reported` - Maximum number of leading days to keep
    ///
    /// # Returns
    ///
    /// A `DailyReport` whose days are sorted ascending. Balance failures are
    /// logged and flagged, never corrected.
    pub fn from_results(
        results: &[HourlyResult],
        heat_loss_factor: f64,
        target_temp_f: f64,
        days_reported: usize,
    ) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<&HourlyResult>> = BTreeMap::new();
        for r in results {
            by_date.entry(r.time.date_naive()).or_default().push(r);
        }
        let total_days = by_date.len();

        let days: Vec<DailySummary> = by_date
            .into_iter()
            .take(days_reported)
            .map(|(date, hours)| summarize(date, &hours, heat_loss_factor, target_temp_f))
            .collect();

        Self {
            total_cost_usd: days.iter().map(|d| d.cost_usd).sum(),
            total_hp_kwh: days.iter().map(|d| d.hp_kwh).sum(),
            total_aux_kwh: days.iter().map(|d| d.aux_kwh).sum(),
            total_unmet_btu: days.iter().map(|d| d.unmet_btu).sum(),
            days,
            total_days,
        }
    }

    /// Whether every reported day closed its heat balance.
    pub fn all_balanced(&self) -> bool {
        self.days.iter().all(|d| d.balanced)
    }
}

fn summarize(
    date: NaiveDate,
    hours: &[&HourlyResult],
    heat_loss_factor: f64,
    target_temp_f: f64,
) -> DailySummary {
    let mut span = 0.0;
    let mut outdoor_weighted = 0.0;
    let mut delta_weighted = 0.0;
    let mut total_load = 0.0;
    let mut hp_btu = 0.0;
    let mut aux_btu = 0.0;
    let mut unmet = 0.0;
    let mut hp_kwh = 0.0;
    let mut aux_kwh = 0.0;
    let mut cost = 0.0;

    for r in hours {
        let dt = r.duration_hours;
        let delta = (target_temp_f - r.outdoor_temp_f).max(0.0);
        span += dt;
        outdoor_weighted += r.outdoor_temp_f * dt;
        delta_weighted += delta * dt;
        total_load += heat_loss_factor * delta * dt;
        hp_btu += r.hp_delivered_btu;
        aux_btu += r.aux_delivered_btu;
        unmet += r.unmet_btu;
        hp_kwh += r.hp_kwh;
        aux_kwh += r.aux_kwh;
        cost += r.cost_usd;
    }

    let balance_error = total_load - (hp_btu + aux_btu + unmet);
    let tolerance = BALANCE_TOLERANCE_BTU.max(total_load.abs() * BALANCE_TOLERANCE_REL);
    let balanced = balance_error.abs() <= tolerance;
    if !balanced {
        warn!(
            "{date}: heat balance off by {balance_error:.1} BTU \
             (load {total_load:.0}, hp {hp_btu:.0}, aux {aux_btu:.0}, unmet {unmet:.0})"
        );
    }

    let partial = span < FULL_DAY_HOURS - 1e-9;
    let (avg_outdoor_f, avg_delta_t_f) = if span > 0.0 {
        (outdoor_weighted / span, delta_weighted / span)
    } else {
        (0.0, 0.0)
    };

    DailySummary {
        date,
        hours: span,
        avg_outdoor_f,
        avg_delta_t_f,
        total_load_btu: total_load,
        hp_delivered_btu: hp_btu,
        aux_delivered_btu: aux_btu,
        unmet_btu: unmet,
        hp_kwh,
        aux_kwh,
        cost_usd: cost,
        implied_cop: (hp_kwh > 0.0).then(|| hp_btu / (hp_kwh * BTU_PER_KWH)),
        balance_error_btu: balance_error,
        balanced,
        partial,
    }
}

impl fmt::Display for DailyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Daily Forecast ---")?;
        writeln!(
            f,
            "{:<10}  {:>6}  {:>9}  {:>8}  {:>8}  {:>5}  {:>8}",
            "date", "out°F", "load kBTU", "hp kWh", "aux kWh", "COP", "cost"
        )?;
        for d in &self.days {
            let cop = d
                .implied_cop
                .map_or_else(|| "-".to_string(), |c| format!("{c:.2}"));
            let mut flags = String::new();
            if d.partial {
                flags.push_str(" partial");
            }
            if !d.balanced {
                flags.push_str(" UNBALANCED");
            }
            if d.unmet_btu > 0.0 {
                flags.push_str(&format!(" unmet={:.0} BTU", d.unmet_btu));
            }
            writeln!(
                f,
                "{:<10}  {:>6.1}  {:>9.1}  {:>8.2}  {:>8.2}  {:>5}  {:>8.2}{flags}",
                d.date.format("%Y-%m-%d"),
                d.avg_outdoor_f,
                d.total_load_btu / 1000.0,
                d.hp_kwh,
                d.aux_kwh,
                cop,
                d.cost_usd,
            )?;
        }
        write!(
            f,
            "Total ({} of {} days): {:.2} kWh hp, {:.2} kWh aux, ${:.2}",
            self.days.len(),
            self.total_days,
            self.total_hp_kwh,
            self.total_aux_kwh,
            self.total_cost_usd
        )
    }
}

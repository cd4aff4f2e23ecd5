//! Hour-by-hour staged heating simulation against a weather forecast.

use log::{debug, warn};

use super::types::{BTU_PER_KWH, EquipmentSpec, ForecastHour, HourlyResult};

/// Simulator for a heat pump backed by optional auxiliary resistance heat.
///
/// Holds only read-only inputs, so one instance can be shared across
/// concurrent what-if runs.
#[derive(Debug, Clone)]
pub struct PerformanceSimulator {
    heat_loss_factor: f64,
    target_temp_f: f64,
    equipment: EquipmentSpec,
    aux_enabled: bool,
    utility_rate: f64,
}

impl PerformanceSimulator {
    /// Creates a new simulator.
    ///
    /// # Arguments
    ///
    /// * `heat_loss_factor` - Building coefficient (BTU/hr/°F)
    /// * `target_temp_f` - Indoor setpoint to hold (°F)
    /// * `equipment` - Heat-pump description
    /// * `aux_enabled` - Whether auxiliary heat may cover the deficit
    /// * `utility_rate` - Electricity price (USD/kWh)
    pub fn new(
        heat_loss_factor: f64,
        target_temp_f: f64,
        equipment: EquipmentSpec,
        aux_enabled: bool,
        utility_rate: f64,
    ) -> Self {
        Self {
            heat_loss_factor,
            target_temp_f,
            equipment,
            aux_enabled,
            utility_rate,
        }
    }

    /// Building coefficient used by this simulator (BTU/hr/°F).
    pub fn heat_loss_factor(&self) -> f64 {
        self.heat_loss_factor
    }

    /// Indoor setpoint (°F).
    pub fn target_temp_f(&self) -> f64 {
        self.target_temp_f
    }

    /// Equipment description.
    pub fn equipment(&self) -> &EquipmentSpec {
        &self.equipment
    }

    /// Simulates one forecast interval.
    ///
    /// # Returns
    ///
    /// An `HourlyResult` with delivered heat per stage, energy and cost.
    pub fn step(&self, hour: &ForecastHour) -> HourlyResult {
        let dt = hour.duration_hours;
        let outdoor = hour.outdoor_temp_f;

        // 1. Building load, clamped when outdoor is warmer than target
        let raw_delta = self.target_temp_f - outdoor;
        let load_clamped = raw_delta < 0.0;
        let delta_t_f = raw_delta.max(0.0);
        let load_btu = self.heat_loss_factor * delta_t_f * dt;

        // 2. Heat-pump capacity with hard lockout
        let locked_out = self.equipment.is_locked_out(outdoor);
        let capacity_btu_hr = self.equipment.capacity_btu_hr(outdoor);

        // 3. Stage split
        let hp_btu = load_btu.min(capacity_btu_hr * dt);
        let deficit_btu = (load_btu - hp_btu).max(0.0);
        let (aux_btu, unmet_btu) = if self.aux_enabled {
            (deficit_btu, 0.0)
        } else {
            (0.0, deficit_btu)
        };

        // 4. Energy and cost
        let cop = self.equipment.effective_cop(outdoor, hour.humidity_pct);
        let hp_kwh = if hp_btu > 0.0 {
            hp_btu / (cop * BTU_PER_KWH)
        } else {
            0.0
        };
        let aux_kwh = aux_btu / BTU_PER_KWH;
        let cost_usd = (hp_kwh + aux_kwh) * self.utility_rate;

        HourlyResult {
            time: hour.time,
            outdoor_temp_f: outdoor,
            delta_t_f,
            building_load_btu: load_btu,
            hp_capacity_btu_hr: capacity_btu_hr,
            hp_delivered_btu: hp_btu,
            aux_delivered_btu: aux_btu,
            unmet_btu,
            hp_kwh,
            aux_kwh,
            cost_usd,
            cop,
            locked_out,
            load_clamped,
            duration_hours: dt,
        }
    }

    /// Simulates every forecast interval in order.
    pub fn run(&self, forecast: &[ForecastHour]) -> Vec<HourlyResult> {
        let results: Vec<HourlyResult> = forecast.iter().map(|h| self.step(h)).collect();

        let clamped = results.iter().filter(|r| r.load_clamped).count();
        let locked = results.iter().filter(|r| r.locked_out).count();
        let unmet: f64 = results.iter().map(|r| r.unmet_btu).sum();
        debug!(
            "simulated {} intervals: {clamped} with outdoor above target, {locked} in lockout",
            results.len()
        );
        if unmet > 0.0 {
            warn!("auxiliary heat disabled: {unmet:.0} BTU of load left unmet");
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn hour(temp: f64) -> ForecastHour {
        let time = DateTime::<FixedOffset>::parse_from_rfc3339("2024-01-15T00:00:00-05:00")
            .unwrap();
        ForecastHour::new(time, temp)
    }

    fn small_hp() -> EquipmentSpec {
        EquipmentSpec::new(1.0, 9.0, 0.0, 2000.0)
    }

    #[test]
    fn load_is_k_times_delta() {
        let sim = PerformanceSimulator::new(500.0, 70.0, small_hp(), true, 0.15);
        let r = sim.step(&hour(50.0));
        assert_eq!(r.building_load_btu, 10_000.0);
        assert_eq!(r.hp_delivered_btu, 10_000.0);
        assert_eq!(r.aux_delivered_btu, 0.0);
    }

    #[test]
    fn warm_hours_clamp_to_zero_load() {
        let sim = PerformanceSimulator::new(500.0, 70.0, small_hp(), true, 0.15);
        let r = sim.step(&hour(75.0));
        assert!(r.load_clamped);
        assert_eq!(r.building_load_btu, 0.0);
        assert_eq!(r.hp_kwh, 0.0);
        assert_eq!(r.cost_usd, 0.0);
    }

    #[test]
    fn aux_covers_deficit_when_enabled() {
        let sim = PerformanceSimulator::new(1000.0, 70.0, small_hp(), true, 0.15);
        let r = sim.step(&hour(20.0));
        let cap = small_hp().capacity_btu_hr(20.0);
        assert!((r.hp_delivered_btu - cap).abs() < 1e-9);
        assert!((r.delivered_btu() - r.building_load_btu).abs() < 1e-6);
        assert!((r.aux_kwh - r.aux_delivered_btu / BTU_PER_KWH).abs() < 1e-12);
        assert_eq!(r.unmet_btu, 0.0);
    }

    #[test]
    fn deficit_is_unmet_without_aux() {
        let sim = PerformanceSimulator::new(1000.0, 70.0, small_hp(), false, 0.15);
        let r = sim.step(&hour(20.0));
        assert_eq!(r.aux_delivered_btu, 0.0);
        assert!((r.hp_delivered_btu + r.unmet_btu - r.building_load_btu).abs() < 1e-6);
        assert!(r.unmet_btu > 0.0);
    }

    #[test]
    fn lockout_shifts_all_load_to_aux() {
        let sim = PerformanceSimulator::new(500.0, 70.0, small_hp(), true, 0.15);
        let r = sim.step(&hour(0.0));
        assert!(r.locked_out);
        assert_eq!(r.hp_delivered_btu, 0.0);
        assert_eq!(r.hp_kwh, 0.0);
        assert_eq!(r.aux_delivered_btu, r.building_load_btu);
    }

    #[test]
    fn fractional_interval_scales_energy() {
        let sim = PerformanceSimulator::new(500.0, 70.0, small_hp(), true, 0.15);
        let full = sim.step(&hour(40.0));
        let mut half_hour = hour(40.0);
        half_hour.duration_hours = 0.5;
        let half = sim.step(&half_hour);
        assert!((half.building_load_btu * 2.0 - full.building_load_btu).abs() < 1e-9);
        assert!((half.hp_kwh * 2.0 - full.hp_kwh).abs() < 1e-9);
    }
}

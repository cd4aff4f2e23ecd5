//! Seeded synthetic thermostat exports.
//!
//! Produces 5-minute telemetry for a single lumped-capacitance home. Outside
//! of its off windows the heat pump holds the setpoint; inside them the
//! indoor temperature decays exactly as
//! `T' = out + (T - out) · exp(-K / C · dt)` with `C = square_feet × thermal_mass`.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::analysis::types::Sample;
use crate::config::DEFAULT_THERMAL_MASS_BTU_PER_F_PER_SQFT;
use crate::forecast::hourly_temp_from_daily;

/// Runtime reported for every interval the heat pump is holding setpoint (s).
pub const MIN_ON_RUNTIME_SEC: f64 = 150.0;
/// Heat-pump output assumed when sizing on-interval runtimes (BTU/hr).
pub const SYNTHETIC_CAPACITY_BTU_HR: f64 = 24_000.0;

/// Daily recurring window with the equipment off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffWindow {
    /// Local hour of day the window opens (0–24).
    pub start_hour: f64,
    /// Window length (h).
    pub hours: f64,
}

impl OffWindow {
    fn contains(&self, hour_of_day: f64) -> bool {
        (hour_of_day - self.start_hour).rem_euclid(24.0) < self.hours
    }
}

/// Generator for a synthetic thermostat export.
///
/// # Examples
///
/// ```
/// use heatloss_sim::synthetic::SyntheticHome;
///
/// let samples = SyntheticHome::new(850.0, 2000.0, 42)
///     .with_off_window(22.0, 6.0)
///     .generate();
/// assert_eq!(samples.len(), 3 * 288);
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticHome {
    /// True building coefficient (BTU/hr/°F).
    pub heat_loss_factor: f64,
    pub square_feet: f64,
    /// Thermal mass per square foot (BTU/°F/ft²).
    pub thermal_mass_btu_per_f_per_sqft: f64,
    /// Setpoint held outside off windows (°F).
    pub setpoint_f: f64,
    /// Local timestamp of the first row.
    pub start: NaiveDateTime,
    pub days: usize,
    pub interval_minutes: u32,
    /// Daily outdoor minimum, reached at 06:00 (°F).
    pub low_f: f64,
    /// Daily outdoor maximum, reached at 18:00 (°F).
    pub high_f: f64,
    /// Standard deviation of reported indoor temperature (°F).
    pub indoor_noise_f: f64,
    /// Standard deviation of reported outdoor temperature (°F).
    pub outdoor_noise_f: f64,
    /// Runtime reported inside off windows (s).
    pub off_runtime_sec: f64,
    /// Auxiliary heat runs during on intervals below this outdoor temperature.
    pub aux_below_f: Option<f64>,
    pub seed: u64,
    off_windows: Vec<OffWindow>,
}

impl SyntheticHome {
    /// Creates a three-day, noise-free home starting 2024-01-15 00:00 with
    /// a 20–40 °F day and no off windows.
    pub fn new(heat_loss_factor: f64, square_feet: f64, seed: u64) -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            heat_loss_factor,
            square_feet,
            thermal_mass_btu_per_f_per_sqft: DEFAULT_THERMAL_MASS_BTU_PER_F_PER_SQFT,
            setpoint_f: 70.0,
            start,
            days: 3,
            interval_minutes: 5,
            low_f: 20.0,
            high_f: 40.0,
            indoor_noise_f: 0.0,
            outdoor_noise_f: 0.0,
            off_runtime_sec: 0.0,
            aux_below_f: None,
            seed,
            off_windows: Vec::new(),
        }
    }

    /// The `--demo` home: K = 850 over 2000 ft² with a nightly 6 h setback
    /// from 22:00 and light sensor noise.
    pub fn demo(seed: u64) -> Self {
        Self::new(850.0, 2000.0, seed)
            .with_off_window(22.0, 6.0)
            .with_noise(0.02, 0.3)
    }

    /// Adds a daily off window.
    pub fn with_off_window(mut self, start_hour: f64, hours: f64) -> Self {
        self.off_windows.push(OffWindow { start_hour, hours });
        self
    }

    pub fn with_weather(mut self, low_f: f64, high_f: f64) -> Self {
        self.low_f = low_f;
        self.high_f = high_f;
        self
    }

    pub fn with_noise(mut self, indoor_f: f64, outdoor_f: f64) -> Self {
        self.indoor_noise_f = indoor_f;
        self.outdoor_noise_f = outdoor_f;
        self
    }

    /// Reports short equipment blips inside off windows.
    pub fn with_off_runtime_sec(mut self, sec: f64) -> Self {
        self.off_runtime_sec = sec;
        self
    }

    pub fn with_aux_below(mut self, outdoor_f: f64) -> Self {
        self.aux_below_f = Some(outdoor_f);
        self
    }

    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = start;
        self
    }

    pub fn with_days(mut self, days: usize) -> Self {
        self.days = days;
        self
    }

    pub fn off_windows(&self) -> &[OffWindow] {
        &self.off_windows
    }

    /// Thermal time constant `C / K` (h).
    pub fn time_constant_hours(&self) -> f64 {
        self.square_feet * self.thermal_mass_btu_per_f_per_sqft / self.heat_loss_factor
    }

    /// Generates the export. Identical settings and seed give identical rows.
    pub fn generate(&self) -> Vec<Sample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let interval = self.interval_minutes.max(1);
        let dt_hours = f64::from(interval) / 60.0;
        let interval_sec = f64::from(interval) * 60.0;
        let steps = self.days * 24 * 60 / interval as usize;
        let decay = (-dt_hours / self.time_constant_hours()).exp();

        let mut indoor = self.setpoint_f;
        let mut samples = Vec::with_capacity(steps);
        for i in 0..steps {
            let ts = self.start + Duration::minutes(i as i64 * i64::from(interval));
            let hour = f64::from(ts.hour()) + f64::from(ts.minute()) / 60.0;
            let outdoor = hourly_temp_from_daily(self.low_f, self.high_f, hour);

            let off = self.off_windows.iter().any(|w| w.contains(hour));
            let (primary, aux) = if off {
                indoor = outdoor + (indoor - outdoor) * decay;
                (self.off_runtime_sec, 0.0)
            } else {
                indoor = self.setpoint_f;
                let load = self.heat_loss_factor * (self.setpoint_f - outdoor).max(0.0);
                let runtime = (load / SYNTHETIC_CAPACITY_BTU_HR * interval_sec)
                    .clamp(MIN_ON_RUNTIME_SEC, interval_sec);
                let aux = match self.aux_below_f {
                    Some(limit) if outdoor < limit => runtime / 2.0,
                    _ => 0.0,
                };
                (runtime, aux)
            };

            samples.push(Sample::new(
                ts.date(),
                ts.time(),
                Some(outdoor + gaussian_noise(&mut rng, self.outdoor_noise_f)),
                Some(indoor + gaussian_noise(&mut rng, self.indoor_noise_f)),
                primary,
                aux,
            ));
        }
        samples
    }
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos() * std_dev
}

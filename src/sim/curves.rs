//! Heat-pump capacity, efficiency and defrost curves versus outdoor temperature.
//!
//! Curve shapes follow typical cold-climate air-source heat pump ratings:
//! full capacity at and above 47 °F, a linear derate to 64% at 17 °F, and a
//! slower derate below. COP is shaped the same way and then scaled so its
//! bin-hour weighted seasonal average matches the unit's HSPF2 rating.

use super::types::BTU_PER_KWH;

/// Rating point above which the unit delivers nameplate capacity (°F).
pub const RATING_HIGH_F: f64 = 47.0;
/// Low-temperature rating point (°F).
pub const RATING_LOW_F: f64 = 17.0;

/// HSPF2 region IV heating bin temperatures (°F) and hours.
pub const HSPF2_BIN_HOURS: [(f64, f64); 16] = [
    (62.0, 87.0),
    (57.0, 183.0),
    (52.0, 294.0),
    (47.0, 358.0),
    (42.0, 415.0),
    (37.0, 460.0),
    (33.0, 430.0),
    (28.0, 407.0),
    (23.0, 311.0),
    (18.0, 239.0),
    (13.0, 152.0),
    (8.0, 91.0),
    (3.0, 47.0),
    (-2.0, 20.0),
    (-7.0, 8.0),
    (-13.0, 3.0),
];

/// Fraction of nameplate capacity available at `temp_f`.
///
/// Returns 0 at or below `cutoff_temp_f` (compressor lockout).
pub fn capacity_factor(temp_f: f64, cutoff_temp_f: f64) -> f64 {
    if temp_f <= cutoff_temp_f {
        0.0
    } else if temp_f >= RATING_HIGH_F {
        1.0
    } else if temp_f < RATING_LOW_F {
        (0.64 - (RATING_LOW_F - temp_f) * 0.01).max(0.0)
    } else {
        1.0 - (RATING_HIGH_F - temp_f) * 0.012
    }
}

/// Unscaled COP curve shape.
pub fn base_cop(temp_f: f64) -> f64 {
    if temp_f >= RATING_HIGH_F {
        4.8
    } else if temp_f >= RATING_LOW_F {
        4.8 - (RATING_HIGH_F - temp_f) * 0.0867
    } else {
        (2.2 - (RATING_LOW_F - temp_f) * 0.02).max(1.2)
    }
}

/// Bin-hour weighted seasonal average of [`base_cop`].
pub fn seasonal_base_cop() -> f64 {
    let (weighted, hours) = HSPF2_BIN_HOURS
        .iter()
        .fold((0.0, 0.0), |(w, h), &(t, hrs)| (w + base_cop(t) * hrs, h + hrs));
    weighted / hours
}

/// COP at `temp_f` for a unit rated `hspf2`.
pub fn cop(temp_f: f64, hspf2: f64) -> f64 {
    let target_seasonal = hspf2 * 1000.0 / BTU_PER_KWH;
    base_cop(temp_f) * target_seasonal / seasonal_base_cop()
}

/// Defrost energy multiplier in `[1, 2]` from outdoor temperature and
/// relative humidity (%).
///
/// Frost accumulates fastest around 36–40 °F in humid air; the penalty fades
/// toward warm dry air and toward very cold air that holds little moisture.
pub fn defrost_penalty(temp_f: f64, humidity_pct: f64) -> f64 {
    let rh = humidity_pct / 100.0;
    let peak_band = (36.0..=40.0).contains(&temp_f);

    let temp_mult = if peak_band {
        1.0
    } else if temp_f > 40.0 && temp_f <= 45.0 {
        1.0 - ((temp_f - 40.0) / 5.0) * 0.5
    } else if (32.0..36.0).contains(&temp_f) {
        1.0 - ((36.0 - temp_f) / 4.0) * 0.1
    } else if (20.0..32.0).contains(&temp_f) {
        0.9 - ((32.0 - temp_f) / 12.0) * 0.3
    } else if temp_f < 20.0 {
        (0.6 - ((20.0 - temp_f) / 30.0) * 0.4).max(0.2)
    } else if temp_f <= 50.0 {
        0.5 - ((temp_f - 45.0) / 5.0) * 0.4
    } else {
        0.1
    };

    let base = if peak_band && rh >= 0.90 {
        0.20
    } else if peak_band && rh >= 0.80 {
        0.18
    } else {
        0.15
    };

    let mut penalty = base * rh * temp_mult;
    if rh >= 0.95 && (32.0..=42.0).contains(&temp_f) {
        penalty += (rh - 0.95) * 0.10 * temp_mult;
    }
    (1.0 + penalty).clamp(1.0, 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn capacity_curve_breakpoints() {
        assert_eq!(capacity_factor(50.0, -15.0), 1.0);
        assert_relative_eq!(capacity_factor(17.0, -15.0), 0.64, epsilon = 1e-12);
        assert_relative_eq!(capacity_factor(7.0, -15.0), 0.54, epsilon = 1e-12);
        assert_eq!(capacity_factor(-15.0, -15.0), 0.0);
        assert!(capacity_factor(-14.9, -15.0) > 0.0);
    }

    #[test]
    fn capacity_never_negative() {
        assert_eq!(capacity_factor(-60.0, -100.0), 0.0);
    }

    #[test]
    fn cop_scales_to_hspf2_seasonal_average() {
        let hspf2 = 9.0;
        let (w, h) = HSPF2_BIN_HOURS
            .iter()
            .fold((0.0, 0.0), |(w, h), &(t, hrs)| (w + cop(t, hspf2) * hrs, h + hrs));
        assert_relative_eq!(w / h, hspf2 * 1000.0 / BTU_PER_KWH, epsilon = 1e-9);
    }

    #[test]
    fn cop_falls_with_temperature() {
        assert!(cop(47.0, 9.0) > cop(30.0, 9.0));
        assert!(cop(30.0, 9.0) > cop(5.0, 9.0));
        assert_eq!(base_cop(-100.0), 1.2);
    }

    #[test]
    fn defrost_peaks_in_humid_mid_thirties() {
        let peak = defrost_penalty(38.0, 95.0);
        assert_relative_eq!(peak, 1.0 + 0.20 * 0.95, epsilon = 1e-12);
        assert!(peak > defrost_penalty(38.0, 60.0));
        assert!(peak > defrost_penalty(10.0, 95.0));
        assert!(defrost_penalty(60.0, 95.0) < defrost_penalty(45.0, 95.0));
    }

    #[test]
    fn defrost_stays_in_range() {
        for t in -30..80 {
            for rh in [0.0, 50.0, 100.0] {
                let p = defrost_penalty(f64::from(t), rh);
                assert!((1.0..=2.0).contains(&p));
            }
        }
    }
}

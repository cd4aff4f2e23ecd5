use std::env;
use std::path::PathBuf;

use heatloss_sim::sim::estimate::MAX_DURATION_HOURS;

/// Outdoor temperature assumed when no forecast source is given (°F).
pub const DEFAULT_OUTDOOR_TEMP_F: f64 = 45.0;
/// Forecast horizon for `--outdoor-temp` when `--hours` is absent.
pub const DEFAULT_HOURS: f64 = 168.0;
#[cfg(feature = "api")]
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub telemetry: Option<PathBuf>,
    pub demo: bool,
    pub square_feet: Option<f64>,
    pub forecast: Option<PathBuf>,
    pub outdoor_temp: Option<f64>,
    pub hours: f64,
    pub target_temp: Option<f64>,
    pub no_aux: bool,
    pub hourly_out: Option<PathBuf>,
    pub daily_out: Option<PathBuf>,
    #[cfg(feature = "api")]
    pub serve: bool,
    #[cfg(feature = "api")]
    pub port: u16,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions {
        scenario: None,
        preset: None,
        telemetry: None,
        demo: false,
        square_feet: None,
        forecast: None,
        outdoor_temp: None,
        hours: DEFAULT_HOURS,
        target_temp: None,
        no_aux: false,
        hourly_out: None,
        daily_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: DEFAULT_PORT,
    };

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --scenario (expected a TOML file path)")?;
                set_once(&mut opts.scenario, PathBuf::from(path), "--scenario")?;
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut opts.preset, name.to_string(), "--preset")?;
            }
            "--telemetry" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --telemetry (expected a CSV path)")?;
                set_once(&mut opts.telemetry, PathBuf::from(path), "--telemetry")?;
            }
            "--demo" => opts.demo = true,
            "--square-feet" => {
                i += 1;
                let v = parse_positive(args.next_or_err(i, "missing value for --square-feet")?)
                    .map_err(|e| format!("--square-feet: {e}"))?;
                set_once(&mut opts.square_feet, v, "--square-feet")?;
            }
            "--forecast" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --forecast (expected a CSV path)")?;
                set_once(&mut opts.forecast, PathBuf::from(path), "--forecast")?;
            }
            "--outdoor-temp" => {
                i += 1;
                let v = parse_finite(args.next_or_err(i, "missing value for --outdoor-temp")?)
                    .map_err(|e| format!("--outdoor-temp: {e}"))?;
                set_once(&mut opts.outdoor_temp, v, "--outdoor-temp")?;
            }
            "--hours" => {
                i += 1;
                opts.hours = parse_positive(args.next_or_err(i, "missing value for --hours")?)
                    .map_err(|e| format!("--hours: {e}"))?;
                if opts.hours > MAX_DURATION_HOURS {
                    return Err(format!("--hours must not exceed {MAX_DURATION_HOURS}"));
                }
            }
            "--target-temp" => {
                i += 1;
                let v = parse_finite(args.next_or_err(i, "missing value for --target-temp")?)
                    .map_err(|e| format!("--target-temp: {e}"))?;
                set_once(&mut opts.target_temp, v, "--target-temp")?;
            }
            "--no-aux" => opts.no_aux = true,
            "--hourly-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --hourly-out (expected a file path)")?;
                set_once(&mut opts.hourly_out, PathBuf::from(path), "--hourly-out")?;
            }
            "--daily-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --daily-out (expected a file path)")?;
                set_once(&mut opts.daily_out, PathBuf::from(path), "--daily-out")?;
            }
            #[cfg(feature = "api")]
            "--serve" => opts.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                opts.port = v
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{v}\" is not a valid u16"))?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if opts.telemetry.is_some() && opts.demo {
        return Err("arguments `--telemetry` and `--demo` are mutually exclusive".to_string());
    }
    if opts.forecast.is_some() && opts.outdoor_temp.is_some() {
        return Err(
            "arguments `--forecast` and `--outdoor-temp` are mutually exclusive".to_string(),
        );
    }

    if opts.scenario.is_none() && opts.preset.is_none() {
        opts.preset = Some("baseline".to_string());
    }

    Ok(opts)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

fn parse_finite(s: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("\"{s}\" is not a number"))
}

fn parse_positive(s: &str) -> Result<f64, String> {
    let v = parse_finite(s)?;
    if v <= 0.0 {
        return Err(format!("\"{s}\" must be > 0"));
    }
    Ok(v)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("heatloss-sim: heat-loss analysis and heating cost forecasts");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  heatloss-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load configuration from a TOML file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, cold_climate,");
    eprintln!("                           resistive_equivalent)");
    eprintln!("  --telemetry <path>       Thermostat export to analyze");
    eprintln!("  --demo                   Analyze synthetic telemetry");
    eprintln!("  --square-feet <f>        Conditioned floor area");
    eprintln!("  --forecast <path>        Hourly forecast CSV");
    eprintln!("  --outdoor-temp <f>       Constant outdoor temperature (default: 45)");
    eprintln!("  --hours <n>              Horizon for --outdoor-temp (default: 168)");
    eprintln!("  --target-temp <f>        Indoor setpoint");
    eprintln!("  --no-aux                 Disable auxiliary heat");
    eprintln!("  --hourly-out <path>      Write the hourly breakdown as CSV");
    eprintln!("  --daily-out <path>       Write the daily summary as CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start the REST API after the run");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("Without --scenario or --preset the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

#[cfg(test)]
mod tests {
    use super::parse_args_from;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_to_baseline_preset() {
        let opts = parse_args_from(Vec::new()).expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("baseline"));
        assert_eq!(opts.hours, 168.0);
        assert!(!opts.no_aux);
        assert!(!opts.demo);
    }

    #[test]
    fn supports_scenario_cli() {
        let opts = parse_args_from(args(&["--scenario", "home.toml"]))
            .expect("parse should succeed");
        assert_eq!(
            opts.scenario.as_deref().and_then(|p| p.to_str()),
            Some("home.toml")
        );
        assert!(opts.preset.is_none());
    }

    #[test]
    fn parses_what_if_flags() {
        let opts = parse_args_from(args(&[
            "--demo",
            "--outdoor-temp",
            "-5",
            "--hours",
            "72",
            "--target-temp",
            "68",
            "--no-aux",
            "--daily-out",
            "daily.csv",
        ]))
        .expect("parse should succeed");
        assert!(opts.demo);
        assert_eq!(opts.outdoor_temp, Some(-5.0));
        assert_eq!(opts.hours, 72.0);
        assert_eq!(opts.target_temp, Some(68.0));
        assert!(opts.no_aux);
        assert!(opts.daily_out.is_some());
    }

    #[test]
    fn rejects_conflicting_sources() {
        assert!(parse_args_from(args(&["--scenario", "a.toml", "--preset", "baseline"])).is_err());
        assert!(parse_args_from(args(&["--telemetry", "t.csv", "--demo"])).is_err());
        assert!(
            parse_args_from(args(&["--forecast", "f.csv", "--outdoor-temp", "30"])).is_err()
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_args_from(args(&["--hours", "0"])).is_err());
        assert!(parse_args_from(args(&["--hours", "1e13"])).is_err());
        assert!(parse_args_from(args(&["--square-feet", "abc"])).is_err());
        assert!(parse_args_from(args(&["--outdoor-temp"])).is_err());
        assert!(parse_args_from(args(&["--bogus"])).is_err());
    }

    #[test]
    fn repeated_flag_is_an_error() {
        let err = parse_args_from(args(&["--telemetry", "a.csv", "--telemetry", "b.csv"]))
            .unwrap_err();
        assert!(err.contains("more than once"));
    }
}

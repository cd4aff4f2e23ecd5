//! heatloss-sim entry point: CLI wiring, analysis and forecast runs.

mod cli;

use std::path::Path;
use std::process;

use heatloss_sim::analysis::{CoastDownAnalyzer, HeatLossEstimate, resolve_heat_loss_factor};
use heatloss_sim::config::EngineConfig;
use heatloss_sim::forecast;
use heatloss_sim::io::export::{export_daily_csv, export_hourly_csv};
use heatloss_sim::io::import::{read_forecast_csv, read_telemetry_csv};
use heatloss_sim::sim::daily::DailyReport;
use heatloss_sim::sim::engine::PerformanceSimulator;
use heatloss_sim::sim::estimate::{WEEKS_PER_MONTH, scale_to_week};
use heatloss_sim::sim::types::ForecastHour;
use heatloss_sim::synthetic::SyntheticHome;

use cli::{CliOptions, DEFAULT_OUTDOOR_TEMP_F};

/// Seed for `--demo` telemetry.
const DEMO_SEED: u64 = 42;

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

/// Loads the configuration source and applies CLI overrides.
fn load_config(cli: &CliOptions) -> EngineConfig {
    let loaded = if let Some(ref path) = cli.scenario {
        EngineConfig::from_toml_file(path)
    } else {
        EngineConfig::from_preset(cli.preset.as_deref().unwrap_or("baseline"))
    };
    let mut config = loaded.unwrap_or_else(|e| fail(e));

    if let Some(sqft) = cli.square_feet {
        config.analysis.square_feet = sqft;
    }
    if let Some(target) = cli.target_temp {
        config.simulation.target_temp_f = target;
    }
    if cli.no_aux {
        config.simulation.aux_heat_enabled = false;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

/// Runs coast-down analysis when telemetry was supplied.
fn analyze(cli: &CliOptions, config: &EngineConfig) -> Option<HeatLossEstimate> {
    let samples = if let Some(ref path) = cli.telemetry {
        read_telemetry_csv(path).unwrap_or_else(|e| fail(e))
    } else if cli.demo {
        SyntheticHome::demo(DEMO_SEED).generate()
    } else {
        return None;
    };

    let analyzer = CoastDownAnalyzer::new(config.analysis.clone());
    match analyzer.analyze(&samples) {
        Ok(estimate) => {
            println!("{estimate}\n");
            Some(estimate)
        }
        Err(e) => fail(e),
    }
}

fn build_forecast(cli: &CliOptions, config: &EngineConfig) -> Vec<ForecastHour> {
    let humidity = config.simulation.humidity_pct;
    let hours = if let Some(ref path) = cli.forecast {
        read_forecast_csv(path, humidity).unwrap_or_else(|e| fail(e))
    } else {
        forecast::constant(
            forecast::current_hour_start(),
            cli.outdoor_temp.unwrap_or(DEFAULT_OUTDOOR_TEMP_F),
            cli.hours,
            humidity,
        )
    };
    if hours.is_empty() {
        fail("forecast contains no hours");
    }
    hours
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(1);
    });

    let config = load_config(&cli);
    let estimate = analyze(&cli, &config);
    let heat_loss = resolve_heat_loss_factor(
        &config.heat_loss,
        config.analysis.square_feet,
        estimate.as_ref(),
    );

    let sim = &config.simulation;
    let equipment = config.equipment_spec();
    let simulator = PerformanceSimulator::new(
        heat_loss.factor,
        sim.target_temp_f,
        equipment.clone(),
        sim.aux_heat_enabled,
        sim.utility_rate_usd_per_kwh,
    );
    let results = simulator.run(&build_forecast(&cli, &config));
    let report = DailyReport::from_results(
        &results,
        heat_loss.factor,
        sim.target_temp_f,
        sim.days_reported,
    );

    println!("{report}");
    if let Some(weekly) = scale_to_week(&results) {
        println!();
        println!(
            "Heat loss factor:  {:.1} BTU/hr/°F ({})",
            heat_loss.factor, heat_loss.source
        );
        println!("Weekly cost:       ${weekly:.2}");
        println!("Monthly cost:      ${:.2}", weekly * WEEKS_PER_MONTH);
    }

    if let Some(ref path) = cli.hourly_out {
        if let Err(e) = export_hourly_csv(&results, Path::new(path)) {
            fail(format!("failed to write CSV: {e}"));
        }
        eprintln!("Hourly breakdown written to {}", path.display());
    }
    if let Some(ref path) = cli.daily_out {
        if let Err(e) = export_daily_csv(&report, Path::new(path)) {
            fail(format!("failed to write CSV: {e}"));
        }
        eprintln!("Daily summary written to {}", path.display());
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(heatloss_sim::api::AppState {
            config,
            equipment,
            estimate,
            heat_loss: Some(heat_loss),
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()
            .unwrap_or_else(|e| fail(format!("failed to create tokio runtime: {e}")));
        if let Err(e) = rt.block_on(heatloss_sim::api::serve(state, addr)) {
            fail(format!("server error: {e}"));
        }
    }
}

//! CSV export for hourly breakdowns and daily summaries.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::daily::DailyReport;
use crate::sim::types::HourlyResult;

/// Column header for the hourly breakdown.
const HOURLY_HEADER: &str = "time,outdoor_temp_f,delta_t_f,duration_hours,building_load_btu,\
                             hp_capacity_btu_hr,hp_delivered_btu,aux_delivered_btu,unmet_btu,\
                             cop,hp_kwh,aux_kwh,cost_usd,locked_out,load_clamped";

/// Column header for the daily summary.
const DAILY_HEADER: &str = "date,hours,avg_outdoor_f,avg_delta_t_f,total_load_btu,\
                            hp_delivered_btu,aux_delivered_btu,unmet_btu,hp_kwh,aux_kwh,\
                            cost_usd,implied_cop,balance_error_btu,balanced,partial";

/// Exports the hourly breakdown to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_hourly_csv(results: &[HourlyResult], path: &Path) -> io::Result<()> {
    write_hourly_csv(results, io::BufWriter::new(File::create(path)?))
}

/// Writes one row per simulated hour to any writer.
///
/// Timestamps keep their UTC offset (RFC 3339). Output is deterministic for
/// identical inputs.
///
/// # Arguments
///
/// * `results` - Simulator output in forecast order
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_hourly_csv(results: &[HourlyResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HOURLY_HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.time.to_rfc3339(),
            format!("{:.2}", r.outdoor_temp_f),
            format!("{:.2}", r.delta_t_f),
            format!("{:.3}", r.duration_hours),
            format!("{:.1}", r.building_load_btu),
            format!("{:.1}", r.hp_capacity_btu_hr),
            format!("{:.1}", r.hp_delivered_btu),
            format!("{:.1}", r.aux_delivered_btu),
            format!("{:.1}", r.unmet_btu),
            format!("{:.3}", r.cop),
            format!("{:.4}", r.hp_kwh),
            format!("{:.4}", r.aux_kwh),
            format!("{:.4}", r.cost_usd),
            r.locked_out.to_string(),
            r.load_clamped.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the daily summaries of a report to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_daily_csv(report: &DailyReport, path: &Path) -> io::Result<()> {
    write_daily_csv(report, io::BufWriter::new(File::create(path)?))
}

/// Writes one row per reported day. Days without compressor energy leave
/// `implied_cop` empty.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_daily_csv(report: &DailyReport, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DAILY_HEADER.split(',').map(str::trim))?;

    for d in &report.days {
        wtr.write_record(&[
            d.date.to_string(),
            format!("{:.2}", d.hours),
            format!("{:.2}", d.avg_outdoor_f),
            format!("{:.2}", d.avg_delta_t_f),
            format!("{:.1}", d.total_load_btu),
            format!("{:.1}", d.hp_delivered_btu),
            format!("{:.1}", d.aux_delivered_btu),
            format!("{:.1}", d.unmet_btu),
            format!("{:.4}", d.hp_kwh),
            format!("{:.4}", d.aux_kwh),
            format!("{:.4}", d.cost_usd),
            d.implied_cop.map(|c| format!("{c:.3}")).unwrap_or_default(),
            format!("{:.3}", d.balance_error_btu),
            d.balanced.to_string(),
            d.partial.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

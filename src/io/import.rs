//! CSV import for thermostat telemetry and hourly forecasts.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::analysis::segment::detect_interval_minutes;
use crate::analysis::types::Sample;
use crate::sim::types::ForecastHour;

use super::columns::{ColumnMap, UnresolvedColumnError};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%Y/%m/%d", "%d.%m.%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

/// Failures while reading telemetry or forecast files.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Columns(#[from] UnresolvedColumnError),
    #[error("no usable telemetry rows")]
    NoRows,
    #[error("forecast line {line}: {message}")]
    Forecast { line: usize, message: String },
}

fn open(path: &Path) -> Result<File, ImportError> {
    File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a thermostat export from a file.
///
/// # Errors
///
/// See [`read_telemetry`].
pub fn read_telemetry_csv(path: &Path) -> Result<Vec<Sample>, ImportError> {
    let samples = read_telemetry(io::BufReader::new(open(path)?))?;
    info!("loaded {} telemetry rows from {}", samples.len(), path.display());
    Ok(samples)
}

/// Normalizes a thermostat export into chronologically ordered samples.
///
/// Lines starting with `#` are skipped, headers are resolved by
/// [`ColumnMap::resolve`], rows with an unparseable timestamp are dropped,
/// and runtimes are clamped to `[0, interval]`.
///
/// # Errors
///
/// Returns an `ImportError` when the header row cannot be resolved, the CSV
/// is malformed, or no row is usable.
pub fn read_telemetry<R: Read>(reader: R) -> Result<Vec<Sample>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let map = ColumnMap::resolve(&headers)?;
    if map.aux_runtime.is_none() {
        warn!("no aux heat runtime column found, assuming no auxiliary heat");
    }
    debug!("resolved telemetry columns: {map:?}");

    let mut samples = Vec::new();
    let mut skipped = 0usize;
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let Some((date, time)) = parse_timestamp(&map, &record) else {
            skipped += 1;
            debug!("skipping row {}: unparseable timestamp", row + 2);
            continue;
        };
        samples.push(Sample::new(
            date,
            time,
            parse_temp(cell(&record, map.outdoor_temp)),
            parse_temp(cell(&record, map.indoor_temp)),
            parse_runtime(cell(&record, map.primary_runtime)),
            map.aux_runtime
                .map_or(0.0, |i| parse_runtime(cell(&record, i))),
        ));
    }
    if skipped > 0 {
        warn!("skipped {skipped} rows with unparseable date/time");
    }
    if samples.is_empty() {
        return Err(ImportError::NoRows);
    }

    samples.sort_by_key(Sample::timestamp);
    clamp_runtimes(&mut samples);
    Ok(samples)
}

fn cell(record: &csv::StringRecord, i: usize) -> &str {
    record.get(i).unwrap_or("")
}

fn parse_timestamp(
    map: &ColumnMap,
    record: &csv::StringRecord,
) -> Option<(NaiveDate, NaiveTime)> {
    let date_cell = cell(record, map.date);
    if map.combined_datetime {
        let ts = parse_datetime(date_cell)?;
        return Some((ts.date(), ts.time()));
    }
    let date = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date_cell, f).ok())?;
    let time = map.time.and_then(|i| {
        TIME_FORMATS
            .iter()
            .find_map(|f| NaiveTime::parse_from_str(cell(record, i), f).ok())
    })?;
    Some((date, time))
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        })
}

fn parse_temp(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|t| t.is_finite())
}

fn parse_runtime(s: &str) -> f64 {
    s.parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .unwrap_or(0.0)
}

/// Clamps runtimes to `[0, interval_seconds]`.
fn clamp_runtimes(samples: &mut [Sample]) {
    let max_sec = detect_interval_minutes(samples) * 60.0;
    let mut clamped = 0usize;
    for s in samples.iter_mut() {
        for r in [&mut s.primary_runtime_sec, &mut s.aux_runtime_sec] {
            let c = r.clamp(0.0, max_sec);
            if c != *r {
                clamped += 1;
                *r = c;
            }
        }
    }
    if clamped > 0 {
        warn!("clamped {clamped} runtime values to [0, {max_sec:.0}] s");
    }
}

#[derive(Debug, Deserialize)]
struct ForecastRow {
    time: DateTime<FixedOffset>,
    outdoor_temp_f: f64,
    humidity_pct: Option<f64>,
    duration_hours: Option<f64>,
}

/// Reads `time,outdoor_temp_f[,humidity_pct][,duration_hours]` rows.
///
/// `time` is RFC 3339 with an offset. Missing humidity falls back to
/// `default_humidity_pct`; missing duration to one hour.
///
/// # Errors
///
/// Returns an `ImportError` for malformed rows or a non-positive duration.
pub fn read_forecast<R: Read>(
    reader: R,
    default_humidity_pct: f64,
) -> Result<Vec<ForecastHour>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut hours = Vec::new();
    for (i, row) in rdr.deserialize::<ForecastRow>().enumerate() {
        let line = i + 2;
        let row = row.map_err(|e| ImportError::Forecast {
            line,
            message: e.to_string(),
        })?;
        let duration_hours = row.duration_hours.unwrap_or(1.0);
        if !duration_hours.is_finite() || duration_hours <= 0.0 {
            return Err(ImportError::Forecast {
                line,
                message: format!("duration_hours must be > 0, got {duration_hours}"),
            });
        }
        hours.push(ForecastHour {
            time: row.time,
            outdoor_temp_f: row.outdoor_temp_f,
            humidity_pct: row.humidity_pct.unwrap_or(default_humidity_pct),
            duration_hours,
        });
    }
    Ok(hours)
}

/// Reads a forecast CSV from a file.
///
/// # Errors
///
/// See [`read_forecast`].
pub fn read_forecast_csv(
    path: &Path,
    default_humidity_pct: f64,
) -> Result<Vec<ForecastHour>, ImportError> {
    read_forecast(io::BufReader::new(open(path)?), default_humidity_pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
# Thermostat export
Date,Time,Current Temp (F),Outdoor Temp (F),Heat Stage 1 (sec),Aux Heat 1 (sec)
2024-01-15,00:05:00,67.9,30.0,0,0
2024-01-15,00:00:00,68.0,30.1,400,-5
bad-date,00:10:00,67.8,30.0,0,0
2024-01-15,00:10:00,,NaN,abc,0
";

    #[test]
    fn parses_sorts_and_clamps() {
        let samples = read_telemetry(EXPORT.as_bytes()).expect("parse");
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(samples[0].primary_runtime_sec, 300.0);
        assert_eq!(samples[0].aux_runtime_sec, 0.0);
        assert_eq!(samples[2].indoor_temp_f, None);
        assert_eq!(samples[2].outdoor_temp_f, None);
        assert_eq!(samples[2].primary_runtime_sec, 0.0);
    }

    #[test]
    fn combined_timestamp_column() {
        let csv = "timestamp,outdoor_temp,indoor_temp,heat_stage_1\n\
                   2024-01-15T22:00:00-05:00,25,68,0\n\
                   1/15/2024 22:05,25,67.9,0\n";
        let samples = read_telemetry(csv.as_bytes()).expect("parse");
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].time, NaiveTime::from_hms_opt(22, 5, 0).unwrap());
        assert_eq!(samples[0].aux_runtime_sec, 0.0);
    }

    #[test]
    fn unresolved_column_is_typed() {
        let csv = "Date,Time,Outdoor Temp (F)\n2024-01-15,00:00,30\n";
        assert!(matches!(
            read_telemetry(csv.as_bytes()),
            Err(ImportError::Columns(_))
        ));
    }

    #[test]
    fn no_rows_is_an_error() {
        let csv = "Date,Time,Current Temp (F),Outdoor Temp (F),Heat Stage 1 (sec)\n";
        assert!(matches!(
            read_telemetry(csv.as_bytes()),
            Err(ImportError::NoRows)
        ));
    }

    #[test]
    fn forecast_rows_default_optional_fields() {
        let csv = "time,outdoor_temp_f,humidity_pct,duration_hours\n\
                   2024-01-15T00:00:00-05:00,30,,\n\
                   2024-01-15T01:00:00-05:00,29,85,0.5\n";
        let hours = read_forecast(csv.as_bytes(), 60.0).expect("parse");
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].humidity_pct, 60.0);
        assert_eq!(hours[0].duration_hours, 1.0);
        assert_eq!(hours[1].duration_hours, 0.5);
        assert_eq!(hours[1].time.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn forecast_rejects_zero_duration() {
        let csv = "time,outdoor_temp_f,duration_hours\n2024-01-15T00:00:00Z,30,0\n";
        match read_forecast(csv.as_bytes(), 60.0) {
            Err(ImportError::Forecast { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected forecast error, got {other:?}"),
        }
    }
}

//! Header resolution for heterogeneous thermostat exports.
//!
//! Each canonical column has an ordered list of matching rules applied to a
//! normalized header (lowercase alphanumeric tokens). The first unclaimed
//! header satisfying a rule wins. When no rule matches, the documented
//! default header name is tried verbatim before the column is reported as
//! unresolved.

use std::fmt;

use thiserror::Error;

/// Canonical telemetry columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalColumn {
    Date,
    Time,
    OutdoorTemp,
    IndoorTemp,
    PrimaryRuntime,
    AuxRuntime,
}

impl CanonicalColumn {
    /// Resolution order; earlier columns claim headers first.
    pub const ALL: [Self; 6] = [
        Self::Date,
        Self::Time,
        Self::OutdoorTemp,
        Self::IndoorTemp,
        Self::PrimaryRuntime,
        Self::AuxRuntime,
    ];

    /// Header name used when no rule matches.
    pub fn default_header(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Time => "Time",
            Self::OutdoorTemp => "Outdoor Temp (F)",
            Self::IndoorTemp => "Current Temp (F)",
            Self::PrimaryRuntime => "Heat Stage 1 (sec)",
            Self::AuxRuntime => "Aux Heat 1 (sec)",
        }
    }

    fn rules(self) -> &'static [Rule] {
        use Rule::{Exact, Tokens};
        match self {
            Self::Date => &[
                Exact("date"),
                Exact("timestamp"),
                Exact("datetime"),
                Exact("date time"),
                Tokens { all: &["date"], none: &["time", "update", "modified"] },
            ],
            Self::Time => &[
                Exact("time"),
                Tokens { all: &["time"], none: &["date", "stamp", "run", "runtime", "sec", "zone"] },
            ],
            Self::OutdoorTemp => &[
                Tokens { all: &["outdoor", "temp"], none: &[] },
                Tokens { all: &["outside", "temp"], none: &[] },
                Tokens { all: &["outdoor", "temperature"], none: &[] },
                Tokens { all: &["outside", "temperature"], none: &[] },
                Tokens { all: &["outdoor"], none: &["humidity", "rh"] },
                Tokens { all: &["ambient"], none: &["indoor", "humidity"] },
                Exact("oat"),
            ],
            Self::IndoorTemp => &[
                Tokens { all: &["current", "temp"], none: &[] },
                Tokens { all: &["indoor", "temp"], none: &[] },
                Tokens { all: &["indoor", "temperature"], none: &[] },
                Tokens { all: &["thermostat", "temp"], none: &[] },
                Tokens { all: &["inside", "temp"], none: &[] },
                Tokens { all: &["temperature"], none: &["outdoor", "outside", "set", "setpoint"] },
            ],
            Self::PrimaryRuntime => &[
                Tokens { all: &["heat", "stage", "1"], none: &["aux"] },
                Tokens { all: &["heat", "1"], none: &["aux", "auxiliary"] },
                Tokens { all: &["compressor"], none: &["cool"] },
                Tokens { all: &["heat", "runtime"], none: &["aux", "auxiliary", "2"] },
                Tokens { all: &["heating"], none: &["aux", "auxiliary", "setpoint"] },
            ],
            Self::AuxRuntime => &[
                Tokens { all: &["aux", "heat"], none: &[] },
                Tokens { all: &["aux"], none: &[] },
                Tokens { all: &["auxiliary"], none: &[] },
                Tokens { all: &["emergency", "heat"], none: &[] },
                Tokens { all: &["strip", "heat"], none: &[] },
            ],
        }
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::OutdoorTemp => "outdoor temperature",
            Self::IndoorTemp => "indoor temperature",
            Self::PrimaryRuntime => "primary heat runtime",
            Self::AuxRuntime => "aux heat runtime",
        };
        f.write_str(name)
    }
}

/// A required column could not be located in the header row.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "could not find the {column} column (expected something like \"{default_header}\"); \
     available headers: {}",
    available.join(", ")
)]
pub struct UnresolvedColumnError {
    pub column: CanonicalColumn,
    pub default_header: &'static str,
    pub available: Vec<String>,
}

enum Rule {
    /// Normalized header equals the phrase.
    Exact(&'static str),
    /// Header has every `all` token and none of the `none` tokens.
    Tokens {
        all: &'static [&'static str],
        none: &'static [&'static str],
    },
}

impl Rule {
    fn matches(&self, tokens: &[String]) -> bool {
        match self {
            Self::Exact(phrase) => tokens.join(" ") == *phrase,
            Self::Tokens { all, none } => {
                all.iter().all(|t| tokens.iter().any(|h| h == t))
                    && !none.iter().any(|t| tokens.iter().any(|h| h == t))
            }
        }
    }
}

/// Lowercase alphanumeric tokens of a header.
pub fn normalize_header(header: &str) -> Vec<String> {
    header
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Header indices of the canonical columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    /// `None` when the date column carries the time as well.
    pub time: Option<usize>,
    pub outdoor_temp: usize,
    pub indoor_temp: usize,
    pub primary_runtime: usize,
    /// `None` when the export has no auxiliary stage.
    pub aux_runtime: Option<usize>,
    /// Whether the date column holds a combined date and time.
    pub combined_datetime: bool,
}

impl ColumnMap {
    /// Resolves the canonical columns against a header row.
    ///
    /// # Errors
    ///
    /// Returns an `UnresolvedColumnError` for the first required column that
    /// neither a rule nor its default header name locates.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self, UnresolvedColumnError> {
        let normalized: Vec<Vec<String>> =
            headers.iter().map(|h| normalize_header(h.as_ref())).collect();
        let mut claimed = vec![false; headers.len()];
        let mut found = [None; 6];

        for (slot, column) in CanonicalColumn::ALL.into_iter().enumerate() {
            let hit = column
                .rules()
                .iter()
                .find_map(|rule| {
                    (0..headers.len()).find(|&i| !claimed[i] && rule.matches(&normalized[i]))
                })
                .or_else(|| {
                    let default = column.default_header();
                    (0..headers.len()).find(|&i| {
                        !claimed[i] && headers[i].as_ref().trim().eq_ignore_ascii_case(default)
                    })
                });
            if let Some(i) = hit {
                claimed[i] = true;
                found[slot] = Some(i);
            }
        }

        let unresolved = |column: CanonicalColumn| UnresolvedColumnError {
            column,
            default_header: column.default_header(),
            available: headers.iter().map(|h| h.as_ref().to_string()).collect(),
        };

        let date = found[0].ok_or_else(|| unresolved(CanonicalColumn::Date))?;
        let combined_datetime = is_combined(&normalized[date]);
        let time = match found[1] {
            Some(i) if !combined_datetime => Some(i),
            _ if combined_datetime => None,
            _ => return Err(unresolved(CanonicalColumn::Time)),
        };

        Ok(Self {
            date,
            time,
            outdoor_temp: found[2].ok_or_else(|| unresolved(CanonicalColumn::OutdoorTemp))?,
            indoor_temp: found[3].ok_or_else(|| unresolved(CanonicalColumn::IndoorTemp))?,
            primary_runtime: found[4]
                .ok_or_else(|| unresolved(CanonicalColumn::PrimaryRuntime))?,
            aux_runtime: found[5],
            combined_datetime,
        })
    }
}

fn is_combined(tokens: &[String]) -> bool {
    let has = |t: &str| tokens.iter().any(|h| h == t);
    has("timestamp") || has("datetime") || (has("date") && has("time"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_headers_to_tokens() {
        assert_eq!(
            normalize_header("  Outdoor Temp (F) "),
            vec!["outdoor", "temp", "f"]
        );
    }

    #[test]
    fn resolves_default_export_headers() {
        let headers = [
            "Date",
            "Time",
            "System Setting",
            "Current Temp (F)",
            "Outdoor Temp (F)",
            "Heat Stage 1 (sec)",
            "Aux Heat 1 (sec)",
        ];
        let map = ColumnMap::resolve(&headers).expect("resolve");
        assert_eq!(map.date, 0);
        assert_eq!(map.time, Some(1));
        assert_eq!(map.indoor_temp, 3);
        assert_eq!(map.outdoor_temp, 4);
        assert_eq!(map.primary_runtime, 5);
        assert_eq!(map.aux_runtime, Some(6));
        assert!(!map.combined_datetime);
    }

    #[test]
    fn resolves_alternate_vendor_headers() {
        let headers = [
            "timestamp",
            "outside_temperature",
            "thermostat_temperature",
            "compressor_runtime_s",
            "auxiliary_runtime_s",
        ];
        let map = ColumnMap::resolve(&headers).expect("resolve");
        assert!(map.combined_datetime);
        assert_eq!(map.time, None);
        assert_eq!(map.outdoor_temp, 1);
        assert_eq!(map.indoor_temp, 2);
        assert_eq!(map.primary_runtime, 3);
        assert_eq!(map.aux_runtime, Some(4));
    }

    #[test]
    fn aux_column_is_optional() {
        let headers = ["Date", "Time", "Outdoor Temp", "Indoor Temp", "Heat Stage 1"];
        let map = ColumnMap::resolve(&headers).expect("resolve");
        assert_eq!(map.aux_runtime, None);
    }

    #[test]
    fn missing_indoor_reports_default_header() {
        let headers = ["Date", "Time", "Outdoor Temp (F)", "Heat Stage 1 (sec)"];
        let err = ColumnMap::resolve(&headers).unwrap_err();
        assert_eq!(err.column, CanonicalColumn::IndoorTemp);
        assert_eq!(err.default_header, "Current Temp (F)");
        assert_eq!(err.available.len(), 4);
        assert!(err.to_string().contains("Current Temp (F)"));
    }

    #[test]
    fn claimed_header_is_not_reused() {
        // "Ambient Temperature" also satisfies the generic indoor rule.
        let headers = ["Date", "Time", "Ambient Temperature", "Heat Stage 1"];
        let err = ColumnMap::resolve(&headers).unwrap_err();
        assert_eq!(err.column, CanonicalColumn::IndoorTemp);
    }
}

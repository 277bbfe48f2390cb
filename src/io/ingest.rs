//! Measurement-table ingest and normalization.
//!
//! Turns a delimited text export of a thermal sweep into a clean `RawSeries`
//! that is safe to segment and fit. The first line must name the columns;
//! tab, comma, semicolon and plain whitespace separation are all accepted.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 3)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no segmentation or fitting logic here

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use csv::StringRecord;

use crate::domain::RawSeries;
use crate::error::AppError;

/// Summary stats about the samples actually used for fitting.
#[derive(Debug, Clone)]
pub struct SweepStats {
    pub n_samples: usize,
    pub temp_min: f64,
    pub temp_max: f64,
    pub strain_min: f64,
    pub strain_max: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized series + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: RawSeries,
    pub stats: SweepStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Where the data came from, for the report header.
    pub source: String,
}

/// Load and normalize a measurement table from disk.
pub fn read_series(path: &Path) -> Result<IngestedSeries, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open input '{}': {e}", path.display()),
        )
    })?;
    parse_series(&text, &path.display().to_string())
}

/// Parse an in-memory measurement table.
pub fn parse_series(text: &str, source: &str) -> Result<IngestedSeries, AppError> {
    let first_line = text.lines().next().unwrap_or("");
    let (series, row_errors, rows_read) = match sniff_delimiter(first_line) {
        Some(delimiter) => parse_delimited(text, delimiter)?,
        None => parse_whitespace(text)?,
    };

    let rows_used = series.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No usable data rows in the input."));
    }
    let stats = compute_stats(&series)
        .ok_or_else(|| AppError::new(3, "No finite samples in the input."))?;

    Ok(IngestedSeries {
        series,
        stats,
        row_errors,
        rows_read,
        rows_used,
        source: source.to_string(),
    })
}

/// Wrap an already-built series (demo data) the same way file ingest would.
pub fn from_series(series: RawSeries, source: &str) -> Result<IngestedSeries, AppError> {
    let rows_read = series.len();
    let stats = compute_stats(&series)
        .ok_or_else(|| AppError::new(3, "No finite samples in the input."))?;
    Ok(IngestedSeries {
        rows_used: series.len(),
        series,
        stats,
        row_errors: Vec::new(),
        rows_read,
        source: source.to_string(),
    })
}

fn sniff_delimiter(first_line: &str) -> Option<u8> {
    if first_line.contains('\t') {
        Some(b'\t')
    } else if first_line.contains(';') {
        Some(b';')
    } else if first_line.contains(',') {
        Some(b',')
    } else {
        None
    }
}

fn parse_delimited(
    text: &str,
    delimiter: u8,
) -> Result<(RawSeries, Vec<RowError>, usize), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(3, format!("Failed to read input headers: {e}")))?
        .clone();
    let header_map = build_header_map(headers.iter());
    let columns = resolve_columns(&header_map)?;

    let mut series = RawSeries::default();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after the header
        // - line numbers are 1-based
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("Parse error: {e}"),
                });
                continue;
            }
        };

        match parse_record(&record, &columns) {
            Ok((t, strain, stress)) => {
                series.temperature.push(t);
                series.strain.push(strain);
                series.stress.push(stress);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    Ok((series, row_errors, rows_read))
}

fn parse_whitespace(text: &str) -> Result<(RawSeries, Vec<RowError>, usize), AppError> {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or("");
    let header_map = build_header_map(header.split_whitespace());
    let columns = resolve_columns(&header_map)?;

    let mut series = RawSeries::default();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, raw) in lines.enumerate() {
        let line = idx + 2;
        if raw.trim().is_empty() {
            continue;
        }
        rows_read += 1;

        let record = StringRecord::from(raw.split_whitespace().collect::<Vec<_>>());
        match parse_record(&record, &columns) {
            Ok((t, strain, stress)) => {
                series.temperature.push(t);
                series.strain.push(strain);
                series.stress.push(stress);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    Ok((series, row_errors, rows_read))
}

fn build_header_map<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    names
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 exports with a BOM prefix on
    // the first header cell. If we don't strip it, schema validation will
    // incorrectly report a missing temperature column.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Resolved indices of the three required columns.
#[derive(Debug, Clone, Copy)]
struct ColumnIndices {
    temperature: usize,
    strain: usize,
    stress: usize,
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<ColumnIndices, AppError> {
    let find = |names: &[&str]| names.iter().find_map(|n| header_map.get(*n).copied());

    let temperature = find(&["temperature", "temp", "t"])
        .ok_or_else(|| AppError::new(3, "Missing required column: `temperature`."))?;
    let strain = find(&["strain", "eps", "epsilon"])
        .ok_or_else(|| AppError::new(3, "Missing required column: `strain`."))?;
    let stress = find(&["stress", "sigma"])
        .ok_or_else(|| AppError::new(3, "Missing required column: `stress`."))?;

    Ok(ColumnIndices {
        temperature,
        strain,
        stress,
    })
}

fn parse_record(record: &StringRecord, columns: &ColumnIndices) -> Result<(f64, f64, f64), String> {
    let t = parse_field(record.get(columns.temperature), "temperature")?;
    let strain = parse_field(record.get(columns.strain), "strain")?;
    let stress = parse_field(record.get(columns.stress), "stress")?;
    Ok((t, strain, stress))
}

fn parse_field(value: Option<&str>, name: &str) -> Result<f64, String> {
    let s = value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing `{name}` value."))?;
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `{name}` value."))
    }
}

fn compute_stats(series: &RawSeries) -> Option<SweepStats> {
    let mut temp_min = f64::INFINITY;
    let mut temp_max = f64::NEG_INFINITY;
    let mut strain_min = f64::INFINITY;
    let mut strain_max = f64::NEG_INFINITY;

    for (&t, &s) in series.temperature.iter().zip(&series.strain) {
        temp_min = temp_min.min(t);
        temp_max = temp_max.max(t);
        strain_min = strain_min.min(s);
        strain_max = strain_max.max(s);
    }

    if !temp_min.is_finite()
        || !temp_max.is_finite()
        || !strain_min.is_finite()
        || !strain_max.is_finite()
    {
        return None;
    }

    Some(SweepStats {
        n_samples: series.len(),
        temp_min,
        temp_max,
        strain_min,
        strain_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMA: &str = "temperature,strain,stress\n20,0.062,50.1\n80,0.040,49.8\n140,0.008,50.3\n";

    #[test]
    fn parses_comma_separated_input() {
        let out = parse_series(COMMA, "test").unwrap();
        assert_eq!(out.series.temperature, vec![20.0, 80.0, 140.0]);
        assert_eq!(out.series.strain, vec![0.062, 0.040, 0.008]);
        assert_eq!(out.series.stress, vec![50.1, 49.8, 50.3]);
        assert_eq!(out.rows_read, 3);
        assert_eq!(out.rows_used, 3);
        assert!(out.row_errors.is_empty());
        assert_eq!(out.stats.n_samples, 3);
        assert_eq!(out.stats.temp_min, 20.0);
        assert_eq!(out.stats.temp_max, 140.0);
        assert_eq!(out.stats.strain_min, 0.008);
        assert_eq!(out.stats.strain_max, 0.062);
    }

    #[test]
    fn sniffs_tab_semicolon_and_whitespace() {
        let tab = "temperature\tstrain\tstress\n20\t0.062\t50.1\n140\t0.008\t50.3\n";
        let semi = "temperature;strain;stress\n20;0.062;50.1\n140;0.008;50.3\n";
        let space = "temperature strain stress\n20 0.062 50.1\n140 0.008 50.3\n";

        for text in [tab, semi, space] {
            let out = parse_series(text, "test").unwrap();
            assert_eq!(out.series.temperature, vec![20.0, 140.0]);
            assert_eq!(out.series.strain, vec![0.062, 0.008]);
        }
    }

    #[test]
    fn strips_bom_from_first_header() {
        let text = "\u{feff}temperature,strain,stress\n20,0.062,50\n";
        let out = parse_series(text, "test").unwrap();
        assert_eq!(out.rows_used, 1);
    }

    #[test]
    fn header_aliases_resolve() {
        let text = "temp,eps,sigma\n20,0.062,50\n";
        let out = parse_series(text, "test").unwrap();
        assert_eq!(out.series.temperature, vec![20.0]);
    }

    #[test]
    fn skips_bad_rows_and_reports_line_numbers() {
        let text = "temperature,strain,stress\n\
                    20,0.062,50\n\
                    40,abc,50\n\
                    60,0.050,50\n\
                    80,0.045,\n";
        let out = parse_series(text, "test").unwrap();
        assert_eq!(out.rows_read, 4);
        assert_eq!(out.rows_used, 2);
        assert_eq!(out.series.temperature, vec![20.0, 60.0]);

        assert_eq!(out.row_errors.len(), 2);
        assert_eq!(out.row_errors[0].line, 3);
        assert!(out.row_errors[0].message.contains("strain"));
        assert_eq!(out.row_errors[1].line, 5);
        assert!(out.row_errors[1].message.contains("stress"));
    }

    #[test]
    fn non_finite_values_are_row_errors() {
        let text = "temperature,strain,stress\n20,nan,50\n40,0.05,50\n";
        let out = parse_series(text, "test").unwrap();
        assert_eq!(out.rows_used, 1);
        assert_eq!(out.row_errors.len(), 1);
        assert!(out.row_errors[0].message.contains("Non-finite"));
    }

    #[test]
    fn missing_column_is_rejected() {
        let err = parse_series("temperature,strain\n20,0.062\n", "test").unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("stress"));
    }

    #[test]
    fn all_rows_bad_is_rejected() {
        let err = parse_series("temperature,strain,stress\nx,y,z\n", "test").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = parse_series("", "test").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn demo_series_wraps_without_row_errors() {
        let series = RawSeries {
            temperature: vec![20.0, 140.0, 20.0],
            strain: vec![0.062, 0.008, 0.061],
            stress: vec![50.0; 3],
        };
        let out = from_series(series, "synthetic demo").unwrap();
        assert_eq!(out.rows_read, 3);
        assert_eq!(out.rows_used, 3);
        assert_eq!(out.source, "synthetic demo");
    }
}

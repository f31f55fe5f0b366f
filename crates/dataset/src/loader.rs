use crate::error::DataLoadError;
use configuration::{DataConfig, Layout};
use core_types::{Observation, Table};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell contents that mean "no value" rather than a malformed number.
const MISSING_MARKERS: [&str; 6] = ["na", "n/a", "nan", "null", "none", "-"];

/// Opens `path` and loads every observation it contains.
pub fn load_table(path: &Path, config: &DataConfig) -> Result<Table, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), layout = ?config.layout, "Loading observations.");
    read_table(file, config)
}

/// Parses CSV from `reader` according to the configured layout.
pub fn read_table<R: Read>(reader: R, config: &DataConfig) -> Result<Table, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let header_map = build_header_map(&headers);

    let observations = match config.layout {
        Layout::Long => read_long(&mut reader, &header_map, config)?,
        Layout::Wide => read_wide(&mut reader, &headers, &header_map, config)?,
    };

    if observations.is_empty() {
        return Err(DataLoadError::NoObservations);
    }

    let missing = observations.iter().filter(|o| !o.is_valid()).count();
    tracing::info!(
        observations = observations.len(),
        missing,
        "Observation table loaded."
    );

    Ok(Table::new(observations))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.to_string(), idx))
        .collect()
}

fn require_column(header_map: &HashMap<String, usize>, column: &str) -> Result<usize, DataLoadError> {
    header_map
        .get(column)
        .copied()
        .ok_or_else(|| DataLoadError::MissingColumn(column.to_string()))
}

fn read_long<R: Read>(
    reader: &mut csv::Reader<R>,
    header_map: &HashMap<String, usize>,
    config: &DataConfig,
) -> Result<Vec<Observation>, DataLoadError> {
    let company_col = config.company_column();
    let period_col = config.period_column();
    let company_idx = require_column(header_map, company_col)?;
    let period_idx = require_column(header_map, period_col)?;
    let metric_idx = require_column(header_map, &config.metric_column)?;
    let value_idx = require_column(header_map, &config.value_column)?;

    let mut observations = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let line = line_of(&record, idx);

        let company = key_field(&record, company_idx, company_col, line)?;
        let period = key_field(&record, period_idx, period_col, line)?;
        let metric = key_field(&record, metric_idx, &config.metric_column, line)?;
        let value = parse_value(
            record.get(value_idx).unwrap_or_default(),
            &config.value_column,
            line,
        )?;

        observations.push(Observation::new(company, period, metric, value));
    }

    Ok(observations)
}

/// Melts a one-row-per-company-period table into observations.
fn read_wide<R: Read>(
    reader: &mut csv::Reader<R>,
    headers: &StringRecord,
    header_map: &HashMap<String, usize>,
    config: &DataConfig,
) -> Result<Vec<Observation>, DataLoadError> {
    let company_col = config.company_column();
    let period_col = config.period_column();
    let company_idx = require_column(header_map, company_col)?;
    let period_idx = require_column(header_map, period_col)?;

    let metric_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            *idx != company_idx
                && *idx != period_idx
                && !name.is_empty()
                && !config.ignore_columns.iter().any(|ignored| ignored == name)
        })
        .collect();

    if metric_columns.is_empty() {
        return Err(DataLoadError::NoMetricColumns);
    }
    tracing::debug!(
        metrics = ?metric_columns.iter().map(|(_, name)| *name).collect::<Vec<_>>(),
        "Wide layout metric columns."
    );

    let mut observations = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let line = line_of(&record, idx);

        let company = key_field(&record, company_idx, company_col, line)?;
        let period = key_field(&record, period_idx, period_col, line)?;

        for &(col_idx, metric) in &metric_columns {
            let value = parse_value(record.get(col_idx).unwrap_or_default(), metric, line)?;
            observations.push(Observation::new(company, period, metric, value));
        }
    }

    Ok(observations)
}

/// 1-based line number of `record`, falling back to its position after the header.
fn line_of(record: &StringRecord, idx: usize) -> u64 {
    record
        .position()
        .map(|p| p.line())
        .unwrap_or(idx as u64 + 2)
}

fn key_field<'r>(
    record: &'r StringRecord,
    idx: usize,
    column: &str,
    line: u64,
) -> Result<&'r str, DataLoadError> {
    match record.get(idx) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(DataLoadError::EmptyField {
            line,
            column: column.to_string(),
        }),
    }
}

/// Parses a numeric cell. Blank cells and missing markers become NaN.
fn parse_value(raw: &str, column: &str, line: u64) -> Result<f64, DataLoadError> {
    if raw.is_empty() || MISSING_MARKERS.iter().any(|m| raw.eq_ignore_ascii_case(m)) {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| DataLoadError::MalformedValue {
        line,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_handles_missing_markers() {
        assert!(parse_value("", "v", 2).unwrap().is_nan());
        assert!(parse_value("NA", "v", 2).unwrap().is_nan());
        assert!(parse_value("null", "v", 2).unwrap().is_nan());
        assert_eq!(parse_value("-12.5", "v", 2).unwrap(), -12.5);
        assert_eq!(parse_value("1e3", "v", 2).unwrap(), 1000.0);
    }

    #[test]
    fn parse_value_rejects_text() {
        let err = parse_value("twelve", "ROE (%)", 7).unwrap_err();
        match err {
            DataLoadError::MalformedValue { line, column, value } => {
                assert_eq!(line, 7);
                assert_eq!(column, "ROE (%)");
                assert_eq!(value, "twelve");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

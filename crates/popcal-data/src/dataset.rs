//! Simulated results, observed data and the keyed join between them.

use std::collections::HashMap;
use std::path::Path;

use popcal_core::errors::{CalibError, ErrorInfo};

use crate::columns::ColumnSpec;
use crate::digest::sha256_hex;
use crate::key::RecordKey;
use crate::table::{parse_table, Table};

/// One simulator output table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationResult {
    rows: Vec<(RecordKey, f64)>,
}

impl SimulationResult {
    /// Wraps already-keyed rows.
    pub fn from_rows(rows: Vec<(RecordKey, f64)>) -> Self {
        Self { rows }
    }

    /// Parses the simulator's output file using the configured column names.
    pub fn from_path(path: &Path, columns: &ColumnSpec) -> Result<Self, CalibError> {
        let table = crate::table::read_table(path)?;
        Self::from_table(&table, columns)
    }

    /// Builds a result from a parsed table.
    pub fn from_table(table: &Table, columns: &ColumnSpec) -> Result<Self, CalibError> {
        Ok(Self {
            rows: keyed_rows(table, columns, &columns.result)?,
        })
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[(RecordKey, f64)] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the simulator produced no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Simulated and observed values for one matching key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRow {
    /// Shared key.
    pub key: RecordKey,
    /// Simulated value.
    pub result: f64,
    /// Observed value.
    pub observed: f64,
}

impl JoinedRow {
    /// `result - observed`.
    pub fn residual(&self) -> f64 {
        self.result - self.observed
    }
}

/// Field observations, loaded once and shared read-only for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedDataset {
    rows: Vec<(RecordKey, f64)>,
    index: HashMap<RecordKey, Vec<usize>>,
    digest: String,
}

impl ObservedDataset {
    /// Loads observations from disk. An empty table is an error.
    pub fn load(path: &Path, columns: &ColumnSpec) -> Result<Self, CalibError> {
        let bytes = std::fs::read(path).map_err(|err| CalibError::io("observed-read", path, err))?;
        let text = String::from_utf8(bytes.clone()).map_err(|err| {
            CalibError::Data(
                ErrorInfo::new("observed-encoding", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let with_path = |err: CalibError| match err {
            CalibError::Data(info) => {
                CalibError::Data(info.with_context("path", path.display().to_string()))
            }
            other => other,
        };
        let table = parse_table(&text).map_err(with_path)?;
        let rows = keyed_rows(&table, columns, &columns.observed).map_err(with_path)?;
        let mut dataset = Self::from_rows(rows).map_err(with_path)?;
        dataset.digest = sha256_hex(&bytes);
        tracing::debug!(
            path = %path.display(),
            rows = dataset.len(),
            digest = %dataset.digest,
            "loaded observed dataset"
        );
        Ok(dataset)
    }

    /// Builds a dataset from keyed rows. An empty row set is an error.
    pub fn from_rows(rows: Vec<(RecordKey, f64)>) -> Result<Self, CalibError> {
        if rows.is_empty() {
            return Err(CalibError::Data(
                ErrorInfo::new("observed-empty", "observed dataset has no rows")
                    .with_hint("the likelihood needs at least one observation"),
            ));
        }
        let mut index: HashMap<RecordKey, Vec<usize>> = HashMap::new();
        for (position, (key, _)) in rows.iter().enumerate() {
            index.entry(*key).or_default().push(position);
        }
        let digest = sha256_hex(format!("{rows:?}").as_bytes());
        Ok(Self {
            rows,
            index,
            digest,
        })
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[(RecordKey, f64)] {
        &self.rows
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false` for a constructed dataset.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// SHA-256 of the source file (or of the rows for in-memory datasets).
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Population standard deviation of the observed values.
    pub fn std_dev(&self) -> f64 {
        population_std(self.rows.iter().map(|(_, value)| *value))
    }

    /// Inner join on the full key. Duplicated keys produce one row per matching pair,
    /// ordered by the simulated rows first and the observed rows second.
    pub fn join(&self, simulated: &SimulationResult) -> Vec<JoinedRow> {
        let mut joined = Vec::new();
        for (key, result) in simulated.rows() {
            if let Some(positions) = self.index.get(key) {
                for &position in positions {
                    joined.push(JoinedRow {
                        key: *key,
                        result: *result,
                        observed: self.rows[position].1,
                    });
                }
            }
        }
        joined
    }
}

fn keyed_rows(
    table: &Table,
    columns: &ColumnSpec,
    value_column: &str,
) -> Result<Vec<(RecordKey, f64)>, CalibError> {
    let [year, col, row] = columns.keys();
    let year_idx = table.column_index(year)?;
    let col_idx = table.column_index(col)?;
    let row_idx = table.column_index(row)?;
    let value_idx = table.column_index(value_column)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(line, cells)| {
            let key = RecordKey::parse(&cells[year_idx], &cells[col_idx], &cells[row_idx])
                .map_err(|err| with_row(err, line))?;
            let raw = cells[value_idx].as_str();
            let value = raw.parse::<f64>().map_err(|_| {
                CalibError::Data(
                    ErrorInfo::new("value-not-numeric", "value is not a number")
                        .with_context("column", value_column)
                        .with_context("value", raw)
                        .with_context("row", line.to_string()),
                )
            })?;
            Ok((key, value))
        })
        .collect()
}

fn with_row(err: CalibError, line: usize) -> CalibError {
    match err {
        CalibError::Data(info) => CalibError::Data(info.with_context("row", line.to_string())),
        other => other,
    }
}

/// Population standard deviation (divisor `n`); zero for an empty input.
pub fn population_std<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let values: Vec<f64> = values.into_iter().collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

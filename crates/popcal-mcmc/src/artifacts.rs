//! Tabular and JSON artefacts written into the run directory.
//!
//! Floats are written with Rust's shortest round-trip formatting, so reading a table
//! back yields exactly the values that were written.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use popcal_core::errors::{CalibError, ErrorInfo};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::config::OutputConfig;
use crate::diagnostics::{self, Summary};
use crate::metrics::MetricsRecorder;

/// Artefact locations relative to the run directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// `posterior_samples.csv`
    pub samples: PathBuf,
    /// `posterior_summary.csv`
    pub summary: PathBuf,
    /// `trace.csv`
    pub trace: PathBuf,
    /// `summary.json`
    pub summary_json: PathBuf,
    /// `chain.json`
    pub chain: PathBuf,
    /// `metrics.csv`
    pub metrics: PathBuf,
}

/// Posterior samples read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorSamples {
    /// Header, one name per parameter.
    pub names: Vec<String>,
    /// One row per retained sample, in chain order.
    pub rows: Vec<Vec<f64>>,
}

/// Writes every artefact of a finished run and returns their relative paths.
pub fn write_all(
    run_dir: &Path,
    output: &OutputConfig,
    chain: &Chain,
    summary: &Summary,
    metrics: &MetricsRecorder,
) -> Result<ArtifactPaths, CalibError> {
    fs::create_dir_all(run_dir).map_err(|err| CalibError::io("run-dir", run_dir, err))?;
    let paths = ArtifactPaths {
        samples: output.samples_file.clone(),
        summary: output.summary_file.clone(),
        trace: output.trace_file.clone(),
        summary_json: output.summary_json.clone(),
        chain: output.chain_file.clone(),
        metrics: output.metrics_file.clone(),
    };
    write_samples(&run_dir.join(&paths.samples), chain, summary.burn_in)?;
    write_summary_table(&run_dir.join(&paths.summary), summary)?;
    write_trace(&run_dir.join(&paths.trace), chain)?;
    write_json(&run_dir.join(&paths.summary_json), summary)?;
    write_json(&run_dir.join(&paths.chain), chain)?;
    metrics.write_csv(&run_dir.join(&paths.metrics))?;
    tracing::info!(run_dir = %run_dir.display(), "artefacts written");
    Ok(paths)
}

/// Writes the pooled post-burn-in samples, one column per parameter.
pub fn write_samples(path: &Path, chain: &Chain, burn_in: usize) -> Result<usize, CalibError> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| wrap_csv("samples-open", path, err))?;
    writer
        .write_record(chain.param_names())
        .map_err(|err| wrap_csv("samples-write", path, err))?;
    let samples = chain.flat_samples(burn_in);
    for sample in &samples {
        writer
            .write_record(sample.values().iter().map(|value| value.to_string()))
            .map_err(|err| wrap_csv("samples-write", path, err))?;
    }
    writer
        .flush()
        .map_err(|err| CalibError::io("samples-flush", path, err))?;
    Ok(samples.len())
}

/// Reads a samples table written by [`write_samples`].
pub fn read_samples(path: &Path) -> Result<PosteriorSamples, CalibError> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| wrap_csv("samples-open", path, err))?;
    let names = reader
        .headers()
        .map_err(|err| wrap_csv("samples-header", path, err))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| wrap_csv("samples-record", path, err))?;
        let row = record
            .iter()
            .map(|cell| parse_cell(path, cell))
            .collect::<Result<Vec<f64>, CalibError>>()?;
        rows.push(row);
    }
    Ok(PosteriorSamples { names, rows })
}

/// Writes the one-row summary statistics table.
pub fn write_summary_table(path: &Path, summary: &Summary) -> Result<(), CalibError> {
    let row = summary.to_row();
    let mut writer = csv::Writer::from_path(path).map_err(|err| wrap_csv("summary-open", path, err))?;
    writer
        .write_record(row.keys())
        .map_err(|err| wrap_csv("summary-write", path, err))?;
    writer
        .write_record(row.values().map(|value| value.to_string()))
        .map_err(|err| wrap_csv("summary-write", path, err))?;
    writer
        .flush()
        .map_err(|err| CalibError::io("summary-flush", path, err))
}

/// Reads the one-row summary statistics table back into column order.
pub fn read_summary_table(path: &Path) -> Result<IndexMap<String, f64>, CalibError> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| wrap_csv("summary-open", path, err))?;
    let headers = reader
        .headers()
        .map_err(|err| wrap_csv("summary-header", path, err))?
        .clone();
    let record = reader
        .records()
        .next()
        .ok_or_else(|| {
            CalibError::Serde(
                ErrorInfo::new("summary-empty", "summary table has no data row")
                    .with_context("path", path.display().to_string()),
            )
        })?
        .map_err(|err| wrap_csv("summary-record", path, err))?;
    headers
        .iter()
        .zip(record.iter())
        .map(|(name, cell)| Ok((name.to_string(), parse_cell(path, cell)?)))
        .collect()
}

/// Writes `step,walker,<params…>,log_prob` for every chain entry.
pub fn write_trace(path: &Path, chain: &Chain) -> Result<(), CalibError> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| wrap_csv("trace-open", path, err))?;
    let mut header = vec!["step".to_string(), "walker".to_string()];
    header.extend(chain.param_names().iter().cloned());
    header.push("log_prob".to_string());
    writer
        .write_record(&header)
        .map_err(|err| wrap_csv("trace-write", path, err))?;
    for row in diagnostics::trace(chain) {
        let mut record = vec![row.step.to_string(), row.walker.to_string()];
        record.extend(row.values.iter().map(|value| value.to_string()));
        record.push(row.log_prob.to_string());
        writer
            .write_record(&record)
            .map_err(|err| wrap_csv("trace-write", path, err))?;
    }
    writer
        .flush()
        .map_err(|err| CalibError::io("trace-flush", path, err))
}

/// Pretty JSON artefact.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CalibError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| CalibError::io("json-mkdir", parent, err))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|err| {
        CalibError::Serde(
            ErrorInfo::new("json-serialize", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    fs::write(path, json).map_err(|err| CalibError::io("json-write", path, err))
}

/// Reads a JSON artefact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CalibError> {
    let contents = fs::read_to_string(path).map_err(|err| CalibError::io("json-read", path, err))?;
    serde_json::from_str(&contents).map_err(|err| {
        CalibError::Serde(
            ErrorInfo::new("json-parse", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

/// Reads `chain.json`, re-checking that every step covers the whole ensemble.
pub fn load_chain(path: &Path) -> Result<Chain, CalibError> {
    let stored: Chain = read_json(path)?;
    let mut chain = Chain::new(
        stored.param_names().to_vec(),
        stored.kinds().to_vec(),
        stored.walkers(),
    );
    for step in stored.steps() {
        chain.push(step.clone())?;
    }
    Ok(chain)
}

fn parse_cell(path: &Path, cell: &str) -> Result<f64, CalibError> {
    cell.trim().parse::<f64>().map_err(|_| {
        CalibError::Serde(
            ErrorInfo::new("artifact-number", "cell is not a number")
                .with_context("path", path.display().to_string())
                .with_context("value", cell),
        )
    })
}

fn wrap_csv(code: &str, path: &Path, err: csv::Error) -> CalibError {
    CalibError::Serde(
        ErrorInfo::new(code, "CSV artefact failure")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

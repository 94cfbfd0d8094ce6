use std::path::Path;

use popcal_core::errors::{CalibError, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::likelihood::EvaluationOutcome;

/// Per-step acceptance and failure counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    /// Zero-based step index.
    pub step: usize,
    /// Proposals accepted during the step.
    pub accepted: usize,
    /// Proposals issued during the step (one per walker).
    pub proposed: usize,
    /// Proposals rejected by the prior.
    pub prior_rejected: usize,
    /// Proposals whose simulation failed.
    pub simulator_failed: usize,
    /// Proposals whose output shared no keys with the observations.
    pub empty_join: usize,
    /// Mean of the finite walker log-probabilities after the step.
    pub mean_log_prob: Option<f64>,
    /// Largest walker log-probability after the step.
    pub max_log_prob: Option<f64>,
}

impl StepMetrics {
    /// Counts one evaluation outcome.
    pub fn record_outcome(&mut self, outcome: EvaluationOutcome) {
        match outcome {
            EvaluationOutcome::Scored => {}
            EvaluationOutcome::PriorRejected => self.prior_rejected += 1,
            EvaluationOutcome::SimulatorFailed => self.simulator_failed += 1,
            EvaluationOutcome::EmptyJoin => self.empty_join += 1,
        }
    }

    /// Accepted over proposed.
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }
}

/// Collects per-step metrics for CSV export.
#[derive(Debug, Default, Clone)]
pub struct MetricsRecorder {
    samples: Vec<StepMetrics>,
}

impl MetricsRecorder {
    /// Creates a new recorder instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues from previously recorded metrics.
    pub fn from_samples(samples: Vec<StepMetrics>) -> Self {
        Self { samples }
    }

    /// Records one step.
    pub fn push(&mut self, sample: StepMetrics) {
        self.samples.push(sample);
    }

    /// Returns an immutable view over the recorded samples.
    pub fn samples(&self) -> &[StepMetrics] {
        &self.samples
    }

    /// Consumes the recorder.
    pub fn into_samples(self) -> Vec<StepMetrics> {
        self.samples
    }

    /// Overall acceptance rate.
    pub fn acceptance_rate(&self) -> f64 {
        let proposed: usize = self.samples.iter().map(|sample| sample.proposed).sum();
        let accepted: usize = self.samples.iter().map(|sample| sample.accepted).sum();
        if proposed == 0 {
            0.0
        } else {
            accepted as f64 / proposed as f64
        }
    }

    /// Total simulator failures over the run.
    pub fn total_simulator_failures(&self) -> usize {
        self.samples.iter().map(|sample| sample.simulator_failed).sum()
    }

    /// Writes the recorded metrics to a CSV file.
    pub fn write_csv(&self, path: &Path) -> Result<(), CalibError> {
        let mut writer = csv::Writer::from_path(path).map_err(|err| wrap_csv("metrics-open", path, err))?;
        for sample in &self.samples {
            writer
                .serialize(sample)
                .map_err(|err| wrap_csv("metrics-write", path, err))?;
        }
        writer
            .flush()
            .map_err(|err| CalibError::io("metrics-flush", path, err))
    }

    /// Reads metrics previously written by [`MetricsRecorder::write_csv`].
    pub fn read_csv(path: &Path) -> Result<Self, CalibError> {
        let mut reader = csv::Reader::from_path(path).map_err(|err| wrap_csv("metrics-open", path, err))?;
        let samples = reader
            .deserialize()
            .collect::<Result<Vec<StepMetrics>, _>>()
            .map_err(|err| wrap_csv("metrics-read", path, err))?;
        Ok(Self { samples })
    }
}

fn wrap_csv(code: &str, path: &Path, err: csv::Error) -> CalibError {
    CalibError::Serde(
        ErrorInfo::new(code, "metrics CSV failure")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

//! Gaussian likelihood of simulated tables against field observations.

use std::sync::Arc;

use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::{LogProbability, ParameterVector};
use popcal_data::{population_std, JoinedRow, ObservedDataset, SimulationResult};
use popcal_invoke::Simulator;
use serde::{Deserialize, Serialize};

use crate::config::LikelihoodConfig;
use crate::special::LN_2PI;

/// How a single proposal was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationOutcome {
    /// The likelihood was computed from a non-empty join.
    Scored,
    /// Rejected by the prior before the simulator ran.
    PriorRejected,
    /// The simulator failed, timed out or wrote an unusable table.
    SimulatorFailed,
    /// Simulated and observed keys did not overlap.
    EmptyJoin,
}

/// Result of scoring one simulated table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    /// Log-likelihood, rejected for an empty join.
    pub log_likelihood: LogProbability,
    /// Number of joined rows.
    pub matched: usize,
    /// Outcome classification.
    pub outcome: EvaluationOutcome,
}

/// Independent Gaussian errors with a single noise scale per evaluation.
///
/// The noise scale is `max(sigma_fraction * std(observed), sigma_floor)`, where the
/// population standard deviation is taken over the observed values of the joined rows.
/// A simulator that covers only part of the observations therefore sees the spread of
/// that part.
#[derive(Debug, Clone)]
pub struct GaussianLikelihood {
    observed: Arc<ObservedDataset>,
    sigma_fraction: f64,
    sigma_floor: f64,
}

impl GaussianLikelihood {
    /// Checks the noise settings and keeps the observations.
    pub fn new(observed: Arc<ObservedDataset>, config: &LikelihoodConfig) -> Result<Self, CalibError> {
        if !(config.sigma_fraction.is_finite() && config.sigma_fraction > 0.0) {
            return Err(CalibError::Config(
                ErrorInfo::new("sigma-fraction", "sigma_fraction must be positive")
                    .with_context("sigma_fraction", config.sigma_fraction.to_string()),
            ));
        }
        if !(config.sigma_floor.is_finite() && config.sigma_floor > 0.0) {
            return Err(CalibError::Config(
                ErrorInfo::new("sigma-floor", "sigma_floor must be positive")
                    .with_context("sigma_floor", config.sigma_floor.to_string()),
            ));
        }
        Ok(Self {
            observed,
            sigma_fraction: config.sigma_fraction,
            sigma_floor: config.sigma_floor,
        })
    }

    /// Noise scale for a set of joined rows.
    pub fn sigma(&self, joined: &[JoinedRow]) -> f64 {
        let spread = population_std(joined.iter().map(|row| row.observed));
        let scaled = self.sigma_fraction * spread;
        if scaled.is_finite() && scaled > self.sigma_floor {
            scaled
        } else {
            tracing::debug!(
                observed_std = spread,
                sigma_floor = self.sigma_floor,
                "joined observations too flat, using sigma floor"
            );
            self.sigma_floor
        }
    }

    /// Shared observations.
    pub fn observed(&self) -> &Arc<ObservedDataset> {
        &self.observed
    }

    /// `-½·Σr²/σ² - n·ln σ - ½·n·ln 2π` over the joined rows, or a rejection when
    /// nothing joins.
    pub fn score(&self, simulated: &SimulationResult) -> Scored {
        let joined = self.observed.join(simulated);
        if joined.is_empty() {
            return Scored {
                log_likelihood: LogProbability::REJECTED,
                matched: 0,
                outcome: EvaluationOutcome::EmptyJoin,
            };
        }
        let sigma = self.sigma(&joined);
        let n = joined.len() as f64;
        let sum_sq: f64 = joined.iter().map(|row| row.residual().powi(2)).sum();
        let value = -0.5 * sum_sq / (sigma * sigma) - n * sigma.ln() - 0.5 * n * LN_2PI;
        Scored {
            log_likelihood: LogProbability::new(value),
            matched: joined.len(),
            outcome: EvaluationOutcome::Scored,
        }
    }
}

/// Runs the simulator and scores its output.
#[derive(Debug)]
pub struct LikelihoodEvaluator<S> {
    simulator: S,
    likelihood: GaussianLikelihood,
}

impl<S: Simulator> LikelihoodEvaluator<S> {
    /// Pairs a simulator with a likelihood.
    pub fn new(simulator: S, likelihood: GaussianLikelihood) -> Self {
        Self {
            simulator,
            likelihood,
        }
    }

    /// Underlying likelihood.
    pub fn likelihood(&self) -> &GaussianLikelihood {
        &self.likelihood
    }

    /// Underlying simulator.
    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    /// Log-likelihood and outcome classification. Simulator failures become rejections.
    pub fn evaluate(&self, vector: &ParameterVector) -> Scored {
        match self.simulator.invoke(vector) {
            Ok(result) => self.likelihood.score(&result),
            Err(failure) => {
                tracing::debug!(kind = failure.kind(), error = %failure, "simulation rejected");
                Scored {
                    log_likelihood: LogProbability::REJECTED,
                    matched: 0,
                    outcome: EvaluationOutcome::SimulatorFailed,
                }
            }
        }
    }

    /// Log-likelihood only.
    pub fn log_likelihood(&self, vector: &ParameterVector) -> LogProbability {
        self.evaluate(vector).log_likelihood
    }
}

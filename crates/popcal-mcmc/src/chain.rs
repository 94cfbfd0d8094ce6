//! Append-only record of every walker at every step.

use indexmap::IndexMap;
use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::{LogProbability, ParamKind, ParameterVector};
use serde::{Deserialize, Serialize};

/// State of the whole ensemble after one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    /// Walker positions after the step.
    pub positions: Vec<ParameterVector>,
    /// Log-probabilities at those positions.
    pub log_probs: Vec<LogProbability>,
    /// Whether each walker accepted its proposal during the step.
    pub accepted: Vec<bool>,
}

/// One `(step, walker)` entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainEntry<'a> {
    /// Zero-based step index.
    pub step: usize,
    /// Walker index.
    pub walker: usize,
    /// Position after the step.
    pub position: &'a ParameterVector,
    /// Log-probability at the position.
    pub log_prob: LogProbability,
    /// Whether the walker moved during the step.
    pub accepted: bool,
}

/// Full sampling history, owned and appended to by the coordinator only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    param_names: Vec<String>,
    kinds: Vec<ParamKind>,
    walkers: usize,
    steps: Vec<ChainStep>,
}

impl Chain {
    /// Empty chain for the given parameters and ensemble size.
    pub fn new(param_names: Vec<String>, kinds: Vec<ParamKind>, walkers: usize) -> Self {
        Self {
            param_names,
            kinds,
            walkers,
            steps: Vec::new(),
        }
    }

    /// Appends a step, checking that it covers every walker.
    pub fn push(&mut self, step: ChainStep) -> Result<(), CalibError> {
        let consistent = step.positions.len() == self.walkers
            && step.log_probs.len() == self.walkers
            && step.accepted.len() == self.walkers
            && step
                .positions
                .iter()
                .all(|position| position.len() == self.param_names.len());
        if !consistent {
            return Err(CalibError::Sampler(
                ErrorInfo::new("chain-shape", "step does not match the ensemble shape")
                    .with_context("walkers", self.walkers.to_string())
                    .with_context("step", self.steps.len().to_string()),
            ));
        }
        self.steps.push(step);
        Ok(())
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `true` before the first step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of walkers.
    pub fn walkers(&self) -> usize {
        self.walkers
    }

    /// Number of parameters.
    pub fn ndim(&self) -> usize {
        self.param_names.len()
    }

    /// Parameter names in vector order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Parameter kinds in vector order.
    pub fn kinds(&self) -> &[ParamKind] {
        &self.kinds
    }

    /// Recorded steps.
    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    /// Total `(step, walker)` entries; always `len() * walkers()`.
    pub fn entry_count(&self) -> usize {
        self.steps.len() * self.walkers
    }

    /// Entries in step-major, walker-minor order.
    pub fn entries(&self) -> impl Iterator<Item = ChainEntry<'_>> + '_ {
        self.steps.iter().enumerate().flat_map(|(step, record)| {
            record
                .positions
                .iter()
                .zip(&record.log_probs)
                .zip(&record.accepted)
                .enumerate()
                .map(move |(walker, ((position, log_prob), accepted))| ChainEntry {
                    step,
                    walker,
                    position,
                    log_prob: *log_prob,
                    accepted: *accepted,
                })
        })
    }

    /// Positions after discarding the first `discard` steps, step-major.
    pub fn flat_samples(&self, discard: usize) -> Vec<&ParameterVector> {
        self.steps
            .iter()
            .skip(discard)
            .flat_map(|record| record.positions.iter())
            .collect()
    }

    /// Values of one parameter for one walker after `discard` steps.
    pub fn walker_series(&self, walker: usize, param: usize, discard: usize) -> Vec<f64> {
        self.steps
            .iter()
            .skip(discard)
            .map(|record| record.positions[walker].values()[param])
            .collect()
    }

    /// Fraction of steps in which each walker accepted its proposal.
    pub fn acceptance_fraction(&self) -> Vec<f64> {
        if self.steps.is_empty() {
            return vec![0.0; self.walkers];
        }
        (0..self.walkers)
            .map(|walker| {
                let accepted = self
                    .steps
                    .iter()
                    .filter(|record| record.accepted[walker])
                    .count();
                accepted as f64 / self.steps.len() as f64
            })
            .collect()
    }

    /// Split-R̂ per parameter. Empty when fewer than four steps remain.
    pub fn r_hat(&self, discard: usize) -> IndexMap<String, f64> {
        let mut result = IndexMap::new();
        let n_keep = self.len().saturating_sub(discard);
        if n_keep < 4 || self.walkers == 0 {
            return result;
        }
        let n_split = n_keep / 2;
        let n_chains = self.walkers * 2;

        for (param, name) in self.param_names.iter().enumerate() {
            let mut means = Vec::with_capacity(n_chains);
            let mut variances = Vec::with_capacity(n_chains);
            for walker in 0..self.walkers {
                let series = self.walker_series(walker, param, discard);
                for half in [&series[..n_split], &series[n_split..2 * n_split]] {
                    let mean = half.iter().sum::<f64>() / n_split as f64;
                    let variance = half.iter().map(|&x| (x - mean).powi(2)).sum::<f64>()
                        / (n_split - 1) as f64;
                    means.push(mean);
                    variances.push(variance);
                }
            }
            let within = variances.iter().sum::<f64>() / n_chains as f64;
            let grand_mean = means.iter().sum::<f64>() / n_chains as f64;
            let between = n_split as f64
                * means.iter().map(|&m| (m - grand_mean).powi(2)).sum::<f64>()
                / (n_chains - 1) as f64;
            let var_plus = ((n_split - 1) as f64 * within + between) / n_split as f64;
            result.insert(name.clone(), (var_plus / within).sqrt());
        }
        result
    }

    /// Integrated autocorrelation time per parameter, `τ = 1 + 2·Σρ(k)` summed while
    /// the walker-averaged autocorrelation stays positive. Empty below ten steps.
    pub fn autocorr_time(&self, discard: usize) -> IndexMap<String, f64> {
        let mut result = IndexMap::new();
        let n_keep = self.len().saturating_sub(discard);
        if n_keep < 10 || self.walkers == 0 {
            return result;
        }
        let max_lag = (n_keep / 2).min(100);
        for (param, name) in self.param_names.iter().enumerate() {
            let mut averaged = vec![0.0; max_lag];
            for walker in 0..self.walkers {
                let series = self.walker_series(walker, param, discard);
                for (lag, rho) in autocorrelation(&series, max_lag).into_iter().enumerate() {
                    averaged[lag] += rho / self.walkers as f64;
                }
            }
            let positive_sum: f64 = averaged.iter().take_while(|&&rho| rho > 0.0).sum();
            result.insert(name.clone(), 1.0 + 2.0 * positive_sum);
        }
        result
    }

    /// Effective sample size per parameter, pooled over walkers.
    pub fn effective_sample_size(&self, discard: usize) -> IndexMap<String, f64> {
        let pooled = (self.len().saturating_sub(discard) * self.walkers) as f64;
        self.autocorr_time(discard)
            .into_iter()
            .map(|(name, tau)| (name, pooled / tau))
            .collect()
    }
}

/// Autocorrelation at lags `1..=max_lag`.
fn autocorrelation(series: &[f64], max_lag: usize) -> Vec<f64> {
    let n = series.len();
    let mean = series.iter().sum::<f64>() / n as f64;
    let variance = series.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    if variance == 0.0 {
        return vec![0.0; max_lag];
    }
    (1..=max_lag)
        .map(|lag| {
            if lag >= n {
                return 0.0;
            }
            let covariance = (0..n - lag)
                .map(|i| (series[i] - mean) * (series[i + lag] - mean))
                .sum::<f64>()
                / (n - lag) as f64;
            covariance / variance
        })
        .collect()
}

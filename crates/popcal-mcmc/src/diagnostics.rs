//! Posterior summaries, convergence diagnostics and trace extraction.

use indexmap::IndexMap;
use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::{round_discrete, LogProbability, ParamKind};
use serde::{Deserialize, Serialize};

use crate::chain::Chain;

/// Percentiles reported for every parameter, with their column suffixes.
pub const PERCENTILES: [(f64, &str); 4] = [(2.5, "p2.5"), (16.0, "p16"), (84.0, "p84"), (97.5, "p97.5")];

/// Marginal statistics of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    /// Parameter name.
    pub name: String,
    /// Continuous or discrete.
    pub kind: ParamKind,
    /// Mean.
    pub mean: f64,
    /// Median.
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    /// 2.5th percentile.
    pub p2_5: f64,
    /// 16th percentile.
    pub p16: f64,
    /// 84th percentile.
    pub p84: f64,
    /// 97.5th percentile.
    pub p97_5: f64,
    /// Median rounded to an integer, discrete parameters only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounded_median: Option<i64>,
}

/// Mixing and convergence indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    /// Fraction of accepted proposals per walker.
    pub acceptance_fraction: Vec<f64>,
    /// Mean of `acceptance_fraction`.
    pub mean_acceptance: f64,
    /// Split-R̂ per parameter; empty with fewer than four retained steps.
    pub r_hat: IndexMap<String, f64>,
    /// Integrated autocorrelation time per parameter; empty with fewer than ten retained
    /// steps.
    pub autocorr_time: IndexMap<String, f64>,
    /// Effective sample size per parameter.
    pub effective_sample_size: IndexMap<String, f64>,
}

/// Summary of a finished chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Steps in the chain.
    pub steps: usize,
    /// Walkers in the ensemble.
    pub walkers: usize,
    /// Leading steps discarded.
    pub burn_in: usize,
    /// Pooled samples after burn-in.
    pub retained_samples: usize,
    /// One entry per parameter, in vector order.
    pub parameters: Vec<ParameterSummary>,
    /// Convergence diagnostics.
    pub convergence: Convergence,
}

impl Summary {
    /// Flattens the parameter statistics into the single-row summary table layout:
    /// `{name}_mean`, `{name}_median`, `{name}_std`, the percentile columns and
    /// `{name}_rounded_median` for discrete parameters.
    pub fn to_row(&self) -> IndexMap<String, f64> {
        let mut row = IndexMap::new();
        for param in &self.parameters {
            row.insert(format!("{}_mean", param.name), param.mean);
            row.insert(format!("{}_median", param.name), param.median);
            row.insert(format!("{}_std", param.name), param.std);
            let values = [param.p2_5, param.p16, param.p84, param.p97_5];
            for ((_, suffix), value) in PERCENTILES.iter().zip(values) {
                row.insert(format!("{}_{suffix}", param.name), value);
            }
            if let Some(rounded) = param.rounded_median {
                row.insert(format!("{}_rounded_median", param.name), rounded as f64);
            }
        }
        row
    }
}

/// One trace-plot point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    /// Step index.
    pub step: usize,
    /// Walker index.
    pub walker: usize,
    /// Parameter values.
    pub values: Vec<f64>,
    /// Log-probability at the position.
    pub log_prob: LogProbability,
}

/// Discards `burn_in` steps from every walker and summarizes the pooled remainder.
pub fn summarize(chain: &Chain, burn_in: usize) -> Result<Summary, CalibError> {
    let samples = chain.flat_samples(burn_in);
    if samples.is_empty() {
        return Err(CalibError::Sampler(
            ErrorInfo::new("no-samples", "no samples remain after burn-in")
                .with_context("steps", chain.len().to_string())
                .with_context("burn_in", burn_in.to_string()),
        ));
    }

    let parameters = chain
        .param_names()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut values: Vec<f64> = samples.iter().map(|sample| sample.values()[idx]).collect();
            let kind = chain.kinds().get(idx).copied().unwrap_or_default();
            summarize_parameter(name, kind, &mut values)
        })
        .collect();

    let acceptance_fraction = chain.acceptance_fraction();
    let mean_acceptance = if acceptance_fraction.is_empty() {
        0.0
    } else {
        acceptance_fraction.iter().sum::<f64>() / acceptance_fraction.len() as f64
    };

    Ok(Summary {
        steps: chain.len(),
        walkers: chain.walkers(),
        burn_in,
        retained_samples: samples.len(),
        parameters,
        convergence: Convergence {
            acceptance_fraction,
            mean_acceptance,
            r_hat: chain.r_hat(burn_in),
            autocorr_time: chain.autocorr_time(burn_in),
            effective_sample_size: chain.effective_sample_size(burn_in),
        },
    })
}

fn summarize_parameter(name: &str, kind: ParamKind, values: &mut [f64]) -> ParameterSummary {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
    values.sort_by(f64::total_cmp);
    let median = percentile(values, 50.0);
    ParameterSummary {
        name: name.to_string(),
        kind,
        mean,
        median,
        std,
        p2_5: percentile(values, 2.5),
        p16: percentile(values, 16.0),
        p84: percentile(values, 84.0),
        p97_5: percentile(values, 97.5),
        rounded_median: match kind {
            ParamKind::Discrete => Some(round_discrete(median) as i64),
            ParamKind::Continuous => None,
        },
    }
}

/// Percentile `q` (0–100) of sorted values with linear interpolation between ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Value per step per walker, step-major.
pub fn trace(chain: &Chain) -> Vec<TraceRow> {
    chain
        .entries()
        .map(|entry| TraceRow {
            step: entry.step,
            walker: entry.walker,
            values: entry.position.values().to_vec(),
            log_prob: entry.log_prob,
        })
        .collect()
}

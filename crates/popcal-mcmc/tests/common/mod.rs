#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use popcal_core::{ParamKind, ParameterVector};
use popcal_data::{ObservedDataset, RecordKey, SimulationResult};
use popcal_invoke::{SimulationFailure, Simulator, SimulatorConfig};
use popcal_mcmc::{
    GaussianLikelihood, LikelihoodConfig, LikelihoodEvaluator, ParameterPrior, Posterior,
    PriorFamily, PriorModel, RunConfig,
};

/// Parameters the synthetic observations were generated from.
pub const TRUTH: [f64; 5] = [0.4, 3.0, 0.4, 14.0, 10.0];

pub const YEARS: i64 = 6;

/// Cell values that depend linearly on every parameter.
pub fn response(params: &[f64]) -> Vec<(RecordKey, f64)> {
    let mut rows = Vec::new();
    for year in 0..YEARS {
        for col in 0..2 {
            let value = params
                .iter()
                .enumerate()
                .map(|(idx, p)| p * ((year + col + idx as i64) % 3 + 1) as f64)
                .sum();
            rows.push((RecordKey::new(year, col, 0), value));
        }
    }
    rows
}

/// In-process simulator evaluating [`response`].
#[derive(Debug, Default)]
pub struct LinearSimulator {
    pub calls: AtomicUsize,
}

impl LinearSimulator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Simulator for LinearSimulator {
    fn invoke(&self, vector: &ParameterVector) -> Result<SimulationResult, SimulationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SimulationResult::from_rows(response(vector.values())))
    }
}

/// Simulator that crashes on every invocation.
#[derive(Debug, Default)]
pub struct CrashingSimulator;

impl Simulator for CrashingSimulator {
    fn invoke(&self, _vector: &ParameterVector) -> Result<SimulationResult, SimulationFailure> {
        Err(SimulationFailure::NonZeroExit {
            code: Some(1),
            stderr: "segmentation fault".to_string(),
        })
    }
}

/// Crashes whenever the first parameter exceeds `threshold`.
#[derive(Debug)]
pub struct FlakySimulator {
    pub threshold: f64,
}

impl Simulator for FlakySimulator {
    fn invoke(&self, vector: &ParameterVector) -> Result<SimulationResult, SimulationFailure> {
        if vector.values()[0] > self.threshold {
            return Err(SimulationFailure::Output("truncated output".to_string()));
        }
        Ok(SimulationResult::from_rows(response(vector.values())))
    }
}

/// Writes rows for years the observations never cover.
#[derive(Debug, Default)]
pub struct DisjointSimulator;

impl Simulator for DisjointSimulator {
    fn invoke(&self, vector: &ParameterVector) -> Result<SimulationResult, SimulationFailure> {
        let rows = response(vector.values())
            .into_iter()
            .map(|(key, value)| (RecordKey::new(key.year + 1000, key.col, key.row), value))
            .collect();
        Ok(SimulationResult::from_rows(rows))
    }
}

/// The five rabbit-model priors.
pub fn priors() -> Vec<ParameterPrior> {
    vec![
        ParameterPrior::new(
            "lambda",
            ParamKind::Continuous,
            PriorFamily::Gamma {
                shape: 2.0,
                scale: 0.2,
            },
        ),
        ParameterPrior::new(
            "dens_opt",
            ParamKind::Discrete,
            PriorFamily::Normal { mean: 3.0, sd: 1.0 },
        ),
        ParameterPrior::new(
            "sigma",
            ParamKind::Continuous,
            PriorFamily::Gamma {
                shape: 2.0,
                scale: 0.2,
            },
        ),
        ParameterPrior::new(
            "kC_high",
            ParamKind::Discrete,
            PriorFamily::Normal {
                mean: 14.0,
                sd: 2.0,
            },
        ),
        ParameterPrior::new(
            "kC_low",
            ParamKind::Discrete,
            PriorFamily::Normal {
                mean: 10.0,
                sd: 2.0,
            },
        ),
    ]
}

pub fn observed() -> Arc<ObservedDataset> {
    Arc::new(ObservedDataset::from_rows(response(&TRUTH)).unwrap())
}

pub fn posterior<S: Simulator>(simulator: S) -> Posterior<S> {
    let likelihood = GaussianLikelihood::new(observed(), &LikelihoodConfig::default()).unwrap();
    Posterior::new(
        PriorModel::new(priors()).unwrap(),
        LikelihoodEvaluator::new(simulator, likelihood),
    )
}

/// Small in-memory run: no artefacts, no checkpoints.
pub fn config(walkers: usize, steps: usize, burn_in: usize) -> RunConfig {
    let mut config = RunConfig::new(
        SimulatorConfig::new("rabbit-sim", "input_data.csv"),
        "observed.csv",
        priors(),
    );
    config.walkers = walkers;
    config.steps = steps;
    config.burn_in = burn_in;
    config.workers = Some(2);
    config
}

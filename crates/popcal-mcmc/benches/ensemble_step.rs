use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use popcal_core::{ParamKind, ParameterVector};
use popcal_data::{ObservedDataset, RecordKey, SimulationResult};
use popcal_invoke::{SimulationFailure, Simulator};
use popcal_mcmc::{
    Chain, EnsembleSampler, GaussianLikelihood, LikelihoodConfig, LikelihoodEvaluator,
    MetricsRecorder, ParameterPrior, Posterior, PriorFamily, PriorModel, SamplerOptions,
    StretchMove,
};

struct Quadratic;

fn cells(params: &[f64]) -> Vec<(RecordKey, f64)> {
    (0..200)
        .map(|cell| {
            let x = cell as f64 / 20.0;
            (RecordKey::new(cell / 20, cell % 20, 0), params[0] + params[1] * x + params[2] * x * x)
        })
        .collect()
}

impl Simulator for Quadratic {
    fn invoke(&self, vector: &ParameterVector) -> Result<SimulationResult, SimulationFailure> {
        Ok(SimulationResult::from_rows(cells(vector.values())))
    }
}

fn bench_ensemble(c: &mut Criterion) {
    let priors = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            ParameterPrior::new(name, ParamKind::Continuous, PriorFamily::Normal { mean: 0.0, sd: 5.0 })
        })
        .collect();
    let observed = Arc::new(ObservedDataset::from_rows(cells(&[1.0, -2.0, 0.5])).unwrap());
    let likelihood = GaussianLikelihood::new(observed, &LikelihoodConfig::default()).unwrap();
    let posterior = Posterior::new(
        PriorModel::new(priors).unwrap(),
        LikelihoodEvaluator::new(Quadratic, likelihood),
    );
    let sampler = EnsembleSampler::new(
        &posterior,
        SamplerOptions {
            workers: 4,
            stretch: StretchMove::default(),
        },
    )
    .unwrap();
    let initial: Vec<ParameterVector> = (0..16)
        .map(|walker| {
            let jitter = walker as f64 * 0.01;
            ParameterVector::new(vec![1.0 + jitter, -2.0 - jitter, 0.5 + jitter])
        })
        .collect();
    let state = sampler.initialize(initial).unwrap();

    c.bench_function("ensemble_step_16x3", |b| {
        b.iter(|| {
            let chain = Chain::new(vec!["a".into(), "b".into(), "c".into()], vec![ParamKind::Continuous; 3], 16);
            sampler
                .run_from(state.clone(), chain, MetricsRecorder::new(), 10, 42, |_| Ok(()))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_ensemble);
criterion_main!(benches);

use popcal_core::{LogProbability, ParamKind, ParameterVector};
use popcal_mcmc::diagnostics::{percentile, trace};
use popcal_mcmc::{summarize, Chain, ChainStep};

fn step(values: &[[f64; 2]], accepted: &[bool]) -> ChainStep {
    ChainStep {
        positions: values.iter().map(|v| ParameterVector::new(v.to_vec())).collect(),
        log_probs: values.iter().map(|_| LogProbability::new(-1.0)).collect(),
        accepted: accepted.to_vec(),
    }
}

fn chain(steps: usize) -> Chain {
    let mut chain = Chain::new(
        vec!["lambda".into(), "kC_low".into()],
        vec![ParamKind::Continuous, ParamKind::Discrete],
        2,
    );
    for s in 0..steps {
        let x = s as f64;
        chain
            .push(step(
                &[[x, 10.0 + x], [x + 0.5, 9.5 - x]],
                &[s % 2 == 0, true],
            ))
            .unwrap();
    }
    chain
}

#[test]
fn push_rejects_partial_steps() {
    let mut chain = chain(0);
    let err = chain.push(step(&[[1.0, 2.0]], &[true])).unwrap_err();
    assert_eq!(err.info().code, "chain-shape");
    let err = chain
        .push(step(&[[1.0, 2.0], [1.0, 2.0]], &[true]))
        .unwrap_err();
    assert_eq!(err.info().code, "chain-shape");
    assert!(chain.is_empty());
}

#[test]
fn entries_are_step_major() {
    let chain = chain(3);
    let order: Vec<_> = chain.entries().map(|e| (e.step, e.walker)).collect();
    assert_eq!(order, [(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]);
    assert_eq!(chain.entry_count(), 6);
    assert_eq!(trace(&chain).len(), 6);
    assert_eq!(trace(&chain)[3].values, vec![1.5, 8.5]);
}

#[test]
fn burn_in_drops_leading_steps_from_every_walker() {
    let chain = chain(5);
    let kept = chain.flat_samples(3);
    assert_eq!(kept.len(), 4);
    assert_eq!(kept[0].values(), &[3.0, 13.0]);
    assert_eq!(kept[3].values(), &[4.5, 5.5]);

    let summary = summarize(&chain, 3).unwrap();
    assert_eq!(summary.retained_samples, 4);
    let lambda = &summary.parameters[0];
    assert!((lambda.mean - 3.75).abs() < 1e-12);
    assert!((lambda.median - 3.75).abs() < 1e-12);
    assert!(lambda.rounded_median.is_none());
    let k = &summary.parameters[1];
    // kC_low samples: 13, 6.5, 14, 5.5.
    assert!((k.median - 9.75).abs() < 1e-12);
    assert_eq!(k.rounded_median, Some(10));
}

#[test]
fn burn_in_beyond_the_chain_is_an_error() {
    let chain = chain(4);
    let err = summarize(&chain, 4).unwrap_err();
    assert_eq!(err.info().code, "no-samples");
}

#[test]
fn acceptance_fraction_per_walker() {
    let chain = chain(4);
    assert_eq!(chain.acceptance_fraction(), vec![0.5, 1.0]);
    let summary = summarize(&chain, 0).unwrap();
    assert!((summary.convergence.mean_acceptance - 0.75).abs() < 1e-12);
}

#[test]
fn percentiles_interpolate_linearly() {
    let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
    assert_eq!(percentile(&sorted, 0.0), 1.0);
    assert_eq!(percentile(&sorted, 50.0), 3.0);
    assert_eq!(percentile(&sorted, 100.0), 5.0);
    assert!((percentile(&sorted, 2.5) - 1.1).abs() < 1e-12);
    assert!((percentile(&sorted, 97.5) - 4.9).abs() < 1e-12);
    assert!(percentile(&[], 50.0).is_nan());
}

#[test]
fn diagnostics_need_enough_steps() {
    let short = chain(3);
    assert!(short.r_hat(0).is_empty());
    assert!(short.autocorr_time(0).is_empty());

    let long = chain(40);
    let r_hat = long.r_hat(0);
    assert_eq!(r_hat.keys().collect::<Vec<_>>(), ["lambda", "kC_low"]);
    assert!(r_hat.values().all(|value| value.is_finite()));
    let tau = long.autocorr_time(0);
    assert!(tau["lambda"] >= 1.0);
    let ess = long.effective_sample_size(0);
    assert!((ess["lambda"] - 80.0 / tau["lambda"]).abs() < 1e-9);
}

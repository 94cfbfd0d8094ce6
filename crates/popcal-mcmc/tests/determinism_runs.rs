mod common;

use common::{config, posterior, LinearSimulator};
use popcal_mcmc::run;

#[test]
fn repeated_runs_with_same_seed_match() {
    let posterior = posterior(LinearSimulator::default());
    let config = config(6, 8, 2);
    let first = run(&config, 42, &posterior).unwrap();
    let second = run(&config, 42, &posterior).unwrap();
    assert_eq!(first.chain, second.chain);
    assert_eq!(first.metrics.samples(), second.metrics.samples());
}

#[test]
fn pool_size_does_not_change_the_chain() {
    let posterior = posterior(LinearSimulator::default());
    let mut serial = config(8, 6, 1);
    serial.workers = Some(1);
    let mut parallel = serial.clone();
    parallel.workers = Some(4);

    let one = run(&serial, 1234, &posterior).unwrap();
    let four = run(&parallel, 1234, &posterior).unwrap();
    assert_eq!(one.workers, 1);
    assert_eq!(four.workers, 4);
    assert_eq!(one.chain, four.chain);
    assert_eq!(one.state, four.state);
}

#[test]
fn different_seeds_diverge() {
    let posterior = posterior(LinearSimulator::default());
    let config = config(4, 4, 0);
    let a = run(&config, 1, &posterior).unwrap();
    let b = run(&config, 2, &posterior).unwrap();
    assert_ne!(a.chain, b.chain);
}

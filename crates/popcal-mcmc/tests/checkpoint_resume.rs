mod common;

use common::{config, posterior, LinearSimulator};
use popcal_mcmc::checkpoint::{checkpoint_path, CheckpointPayload};
use popcal_mcmc::{resume, run, RunManifest};
use tempfile::tempdir;

#[test]
fn resumed_run_matches_uninterrupted_run() {
    let posterior = posterior(LinearSimulator::default());
    let dir = tempdir().unwrap();
    let mut config = config(6, 9, 2);
    config.checkpoint.interval = 3;
    config.checkpoint.max_to_keep = 10;
    config.output.run_directory = Some(dir.path().join("full"));

    let full = run(&config, 99, &posterior).unwrap();
    assert_eq!(full.checkpoints.len(), 3);

    let ckpt = checkpoint_path(&dir.path().join("full").join("checkpoints"), 3);
    let mut payload = CheckpointPayload::load(&ckpt).unwrap();
    assert_eq!(payload.step, 3);
    assert_eq!(payload.chain.len(), 3);
    assert_eq!(payload.chain.steps(), &full.chain.steps()[..3]);
    payload.config.output.run_directory = Some(dir.path().join("resumed"));

    let resumed = resume(payload, &posterior).unwrap();
    assert_eq!(resumed.chain, full.chain);
    assert_eq!(resumed.state, full.state);
    assert_eq!(resumed.metrics.samples(), full.metrics.samples());
}

#[test]
fn retention_keeps_the_newest_checkpoints() {
    let posterior = posterior(LinearSimulator::default());
    let dir = tempdir().unwrap();
    let mut config = config(4, 10, 0);
    config.checkpoint.interval = 2;
    config.checkpoint.max_to_keep = 2;
    config.output.run_directory = Some(dir.path().to_path_buf());

    let report = run(&config, 5, &posterior).unwrap();
    let checkpoint_dir = dir.path().join("checkpoints");
    assert_eq!(
        report.checkpoints,
        vec![checkpoint_path(&checkpoint_dir, 8), checkpoint_path(&checkpoint_dir, 10)]
    );
    assert!(!checkpoint_path(&checkpoint_dir, 2).exists());
    assert!(!checkpoint_path(&checkpoint_dir, 6).exists());

    let manifest = RunManifest::load(report.manifest_path.as_ref().unwrap()).unwrap();
    assert_eq!(manifest.steps_completed, 10);
    assert_eq!(manifest.checkpoints.len(), 2);
    assert_eq!(manifest.provenance.seed, 5);
    assert_eq!(manifest.provenance.config_hash.len(), 64);
}

#[test]
fn resuming_a_finished_checkpoint_runs_no_steps() {
    let posterior = posterior(LinearSimulator::default());
    let dir = tempdir().unwrap();
    let mut config = config(4, 4, 0);
    config.checkpoint.interval = 4;
    config.output.run_directory = Some(dir.path().to_path_buf());

    let full = run(&config, 8, &posterior).unwrap();
    let calls_before = posterior.evaluator().simulator().calls();
    let payload = CheckpointPayload::load(&full.checkpoints[0]).unwrap();
    let resumed = resume(payload, &posterior).unwrap();
    assert_eq!(resumed.chain, full.chain);
    assert_eq!(posterior.evaluator().simulator().calls(), calls_before);
}

#[test]
fn truncated_checkpoint_is_rejected() {
    let posterior = posterior(LinearSimulator::default());
    let dir = tempdir().unwrap();
    let mut config = config(4, 4, 0);
    config.checkpoint.interval = 2;
    config.output.run_directory = Some(dir.path().to_path_buf());
    let full = run(&config, 3, &posterior).unwrap();

    let mut payload = CheckpointPayload::load(&full.checkpoints[0]).unwrap();
    payload.step = 3;
    let path = dir.path().join("broken.json");
    payload.store(&path).unwrap();
    let err = CheckpointPayload::load(&path).unwrap_err();
    assert_eq!(err.info().code, "checkpoint-inconsistent");
}

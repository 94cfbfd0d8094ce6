use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::{RngHandle, RunProvenance, SchemaVersion};
use popcal_data::{sha256_hex, ObservedDataset};
use popcal_invoke::{ExternalSimulator, Simulator};

use crate::artifacts::{self, ArtifactPaths};
use crate::chain::Chain;
use crate::checkpoint::{self, CheckpointPayload};
use crate::config::RunConfig;
use crate::determinism;
use crate::diagnostics::{self, Summary};
use crate::init;
use crate::likelihood::{GaussianLikelihood, LikelihoodEvaluator};
use crate::manifest::RunManifest;
use crate::metrics::MetricsRecorder;
use crate::posterior::Posterior;
use crate::prior::PriorModel;
use crate::sampler::{EnsembleSampler, SamplerOptions, SamplerRun, SamplerState};
use crate::stretch::StretchMove;

/// Everything a finished run hands back to its caller.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Full chain, `steps × walkers` entries.
    pub chain: Chain,
    /// Marginal statistics and convergence diagnostics after burn-in.
    pub summary: Summary,
    /// Per-step counts.
    pub metrics: MetricsRecorder,
    /// Ensemble after the last step.
    pub state: SamplerState,
    /// Worker threads used.
    pub workers: usize,
    /// Artefacts relative to the run directory, when one is configured.
    pub artifacts: Option<ArtifactPaths>,
    /// Manifest location, when one was written.
    pub manifest_path: Option<PathBuf>,
    /// Checkpoint files still on disk, oldest first.
    pub checkpoints: Vec<PathBuf>,
}

/// Builds the posterior for a configuration backed by the external simulator.
///
/// Loads the observed dataset, fixes the noise scale and validates the simulator
/// executable; any failure here is fatal before sampling starts.
pub fn build_posterior(config: &RunConfig) -> Result<Posterior<ExternalSimulator>, CalibError> {
    config.validate()?;
    let prior = PriorModel::new(config.priors.clone())?;
    let observed = Arc::new(ObservedDataset::load(
        &config.observed.path,
        &config.observed.columns,
    )?);
    tracing::info!(
        path = %config.observed.path.display(),
        rows = observed.len(),
        digest = %observed.digest(),
        "observed dataset loaded"
    );
    let likelihood = GaussianLikelihood::new(observed, &config.likelihood)?;
    let simulator = ExternalSimulator::new(
        &config.simulator,
        prior.kinds(),
        config.observed.columns.clone(),
    )?;
    Ok(Posterior::new(
        prior,
        LikelihoodEvaluator::new(simulator, likelihood),
    ))
}

/// Runs a calibration from scratch with the provided configuration and seed.
pub fn run<S: Simulator>(
    config: &RunConfig,
    seed: u64,
    posterior: &Posterior<S>,
) -> Result<RunReport, CalibError> {
    config.validate()?;
    if posterior.prior().parameters() != config.priors.as_slice() {
        return Err(CalibError::Config(
            ErrorInfo::new("prior-mismatch", "posterior priors differ from the configuration")
                .with_context("configured", config.priors.len().to_string())
                .with_context("posterior", posterior.ndim().to_string()),
        ));
    }
    let sampler = build_sampler(config, posterior)?;

    let mut init_rng = RngHandle::from_seed(determinism::init_seed(seed));
    let positions = init::initialize(&config.init, config.walkers, posterior.prior(), &mut init_rng)?;
    let state = sampler.initialize(positions)?;
    let chain = Chain::new(
        posterior.prior().names(),
        posterior.prior().kinds(),
        state.walkers(),
    );
    tracing::info!(
        walkers = config.walkers,
        steps = config.steps,
        ndim = posterior.ndim(),
        workers = sampler.workers(),
        seed,
        "calibration started"
    );
    drive(
        config,
        seed,
        &sampler,
        state,
        chain,
        MetricsRecorder::new(),
        Vec::new(),
    )
}

/// Continues the run stored in a checkpoint until its configured step count.
pub fn resume<S: Simulator>(
    payload: CheckpointPayload,
    posterior: &Posterior<S>,
) -> Result<RunReport, CalibError> {
    let config = &payload.config;
    if payload.chain.param_names() != posterior.prior().names().as_slice() {
        return Err(CalibError::Config(
            ErrorInfo::new("prior-mismatch", "checkpoint parameters differ from the posterior")
                .with_context("checkpoint", payload.chain.param_names().join(","))
                .with_context("posterior", posterior.prior().names().join(",")),
        ));
    }
    let observed_hash = posterior.evaluator().likelihood().observed().digest();
    if observed_hash != payload.observed_hash {
        tracing::warn!(
            checkpoint = %payload.observed_hash,
            current = %observed_hash,
            "observed dataset changed since the checkpoint was written"
        );
    }
    let sampler = build_sampler(config, posterior)?;
    let checkpoints = existing_checkpoints(config, payload.step)?;
    tracing::info!(
        step = payload.step,
        steps = config.steps,
        workers = sampler.workers(),
        "resuming calibration"
    );
    drive(
        config,
        payload.master_seed,
        &sampler,
        payload.state,
        payload.chain,
        MetricsRecorder::from_samples(payload.metrics),
        checkpoints,
    )
}

/// Loads a checkpoint file and resumes it against the external simulator.
pub fn resume_from_path(path: &Path) -> Result<RunReport, CalibError> {
    let payload = CheckpointPayload::load(path)?;
    let posterior = build_posterior(&payload.config)?;
    resume(payload, &posterior)
}

fn build_sampler<'p, S: Simulator>(
    config: &RunConfig,
    posterior: &'p Posterior<S>,
) -> Result<EnsembleSampler<'p, S>, CalibError> {
    let options = SamplerOptions {
        workers: config.resolved_workers(),
        stretch: StretchMove::new(config.stretch_scale)?,
    };
    EnsembleSampler::new(posterior, options)
}

fn drive<S: Simulator>(
    config: &RunConfig,
    seed: u64,
    sampler: &EnsembleSampler<'_, S>,
    state: SamplerState,
    chain: Chain,
    metrics: MetricsRecorder,
    mut checkpoints: Vec<PathBuf>,
) -> Result<RunReport, CalibError> {
    let observed_hash = sampler
        .posterior()
        .evaluator()
        .likelihood()
        .observed()
        .digest()
        .to_string();
    let checkpoint_dir = config
        .output
        .run_directory
        .as_ref()
        .map(|dir| dir.join(&config.output.checkpoint_dir));

    let run = sampler.run_from(state, chain, metrics, config.steps, seed, |run| {
        let step = run.chain.len();
        let interval = config.checkpoint.interval;
        match &checkpoint_dir {
            Some(dir) if interval > 0 && step % interval == 0 => {
                let path = write_checkpoint(config, seed, &observed_hash, run, dir)?;
                checkpoints.push(path);
                checkpoint::enforce_retention(&mut checkpoints, config.checkpoint.max_to_keep)
            }
            _ => Ok(()),
        }
    })?;

    let SamplerRun {
        chain,
        state,
        metrics,
    } = run;
    let summary = diagnostics::summarize(&chain, config.burn_in)?;

    let (artifacts, manifest_path) = match &config.output.run_directory {
        Some(run_dir) => {
            let paths = artifacts::write_all(run_dir, &config.output, &chain, &summary, &metrics)?;
            let manifest = RunManifest {
                config: config.clone(),
                master_seed: seed,
                seed_label: config.seed_policy.label.clone(),
                provenance: provenance(config, seed, &observed_hash)?,
                steps_completed: chain.len(),
                workers: sampler.workers(),
                artifacts: paths.clone(),
                checkpoints: checkpoints
                    .iter()
                    .filter_map(|path| path.strip_prefix(run_dir).ok().map(Path::to_path_buf))
                    .collect(),
            };
            let manifest_path = run_dir.join(&config.output.manifest_file);
            manifest.write(&manifest_path)?;
            (Some(paths), Some(manifest_path))
        }
        None => (None, None),
    };

    Ok(RunReport {
        chain,
        summary,
        metrics,
        state,
        workers: sampler.workers(),
        artifacts,
        manifest_path,
        checkpoints,
    })
}

fn write_checkpoint(
    config: &RunConfig,
    seed: u64,
    observed_hash: &str,
    run: &SamplerRun,
    dir: &Path,
) -> Result<PathBuf, CalibError> {
    let step = run.chain.len();
    let path = checkpoint::checkpoint_path(dir, step);
    let payload = CheckpointPayload {
        schema_version: SchemaVersion::default(),
        step,
        config: config.clone(),
        master_seed: seed,
        observed_hash: observed_hash.to_string(),
        state: run.state.clone(),
        chain: run.chain.clone(),
        metrics: run.metrics.samples().to_vec(),
    };
    payload.store(&path)?;
    tracing::debug!(step, path = %path.display(), "checkpoint written");
    Ok(path)
}

/// Checkpoints left by the interrupted run, up to `step`, ordered by step.
fn existing_checkpoints(config: &RunConfig, step: usize) -> Result<Vec<PathBuf>, CalibError> {
    let dir = match &config.output.run_directory {
        Some(run_dir) => run_dir.join(&config.output.checkpoint_dir),
        None => return Ok(Vec::new()),
    };
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(&dir).map_err(|err| CalibError::io("checkpoint-scan", &dir, err))?;
    let mut found = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| CalibError::io("checkpoint-scan", &dir, err))?
            .path();
        let written_at = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("ckpt_"))
            .and_then(|name| name.strip_suffix(".json"))
            .and_then(|digits| digits.parse::<usize>().ok());
        if let Some(written_at) = written_at.filter(|&written_at| written_at <= step) {
            found.push((written_at, path));
        }
    }
    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

fn provenance(config: &RunConfig, seed: u64, observed_hash: &str) -> Result<RunProvenance, CalibError> {
    let canonical = serde_json::to_vec(config).map_err(|err| {
        CalibError::Serde(ErrorInfo::new("config-serialize", err.to_string()))
    })?;
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert(
        "popcal-mcmc".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    Ok(RunProvenance {
        schema_version: SchemaVersion::default(),
        config_hash: sha256_hex(&canonical),
        observed_hash: observed_hash.to_string(),
        simulator: config.simulator.program.display().to_string(),
        seed,
        created_at: chrono::Utc::now().to_rfc3339(),
        tool_versions,
    })
}

#![deny(missing_docs)]

//! Parallel affine-invariant ensemble MCMC for calibrating an external population
//! simulator against field observations.
//!
//! The usual entry point is [`kernel::build_posterior`] followed by [`kernel::run`],
//! or [`kernel::resume_from_path`] to continue from a checkpoint.

/// Run artefacts: sample, summary and trace tables plus JSON dumps.
pub mod artifacts;
/// Append-only chain and convergence estimators.
pub mod chain;
/// Checkpoint payloads, file naming and retention.
pub mod checkpoint;
/// YAML configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Posterior summaries and trace extraction.
pub mod diagnostics;
/// Initial walker positions.
pub mod init;
/// Public `run`/`resume` entry points.
pub mod kernel;
/// Gaussian likelihood and simulator-backed evaluation.
pub mod likelihood;
/// Run manifest serialization helpers.
pub mod manifest;
/// Per-step acceptance and failure counts.
pub mod metrics;
/// Prior plus likelihood.
pub mod posterior;
/// Parameter priors.
pub mod prior;
/// Ensemble sampler driving the worker pool.
pub mod sampler;
/// Log-density helpers.
pub mod special;
/// Stretch move proposals.
pub mod stretch;

pub use artifacts::{ArtifactPaths, PosteriorSamples};
pub use chain::{Chain, ChainEntry, ChainStep};
pub use checkpoint::CheckpointPayload;
pub use config::{
    CheckpointConfig, LikelihoodConfig, ObservedConfig, OutputConfig, RunConfig, SeedPolicy,
    WalkerInit,
};
pub use diagnostics::{summarize, Convergence, ParameterSummary, Summary};
pub use kernel::{build_posterior, resume, resume_from_path, run, RunReport};
pub use likelihood::{EvaluationOutcome, GaussianLikelihood, LikelihoodEvaluator};
pub use manifest::RunManifest;
pub use metrics::{MetricsRecorder, StepMetrics};
pub use posterior::{Evaluation, Posterior};
pub use prior::{ParameterPrior, PriorFamily, PriorModel};
pub use sampler::{EnsembleSampler, SamplerOptions, SamplerRun, SamplerState};
pub use stretch::StretchMove;

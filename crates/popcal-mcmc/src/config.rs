use std::fs;
use std::path::{Path, PathBuf};

use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_data::ColumnSpec;
use popcal_invoke::SimulatorConfig;
use serde::{Deserialize, Serialize};

use crate::prior::ParameterPrior;

/// YAML-configurable parameters governing a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Ensemble size.
    #[serde(default = "default_walkers")]
    pub walkers: usize,
    /// Number of ensemble steps.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Leading steps discarded before summarizing.
    #[serde(default = "default_burn_in")]
    pub burn_in: usize,
    /// Worker threads evaluating proposals; `None` uses all cores but one.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Stretch move scale `a`.
    #[serde(default = "default_stretch_scale")]
    pub stretch_scale: f64,
    /// External simulator.
    pub simulator: SimulatorConfig,
    /// Observed data location and column names.
    pub observed: ObservedConfig,
    /// Noise model.
    #[serde(default)]
    pub likelihood: LikelihoodConfig,
    /// Ordered parameter priors.
    pub priors: Vec<ParameterPrior>,
    /// Walker initialization.
    #[serde(default)]
    pub init: WalkerInit,
    /// Checkpointing behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Master seed and substream policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Output directory configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_walkers() -> usize {
    12
}

fn default_steps() -> usize {
    10_000
}

fn default_burn_in() -> usize {
    200
}

fn default_stretch_scale() -> f64 {
    2.0
}

impl RunConfig {
    /// Configuration with every optional section at its default.
    pub fn new(
        simulator: SimulatorConfig,
        observed_path: impl Into<PathBuf>,
        priors: Vec<ParameterPrior>,
    ) -> Self {
        Self {
            walkers: default_walkers(),
            steps: default_steps(),
            burn_in: default_burn_in(),
            workers: None,
            stretch_scale: default_stretch_scale(),
            simulator,
            observed: ObservedConfig {
                path: observed_path.into(),
                columns: ColumnSpec::default(),
            },
            likelihood: LikelihoodConfig::default(),
            priors,
            init: WalkerInit::default(),
            checkpoint: CheckpointConfig::default(),
            seed_policy: SeedPolicy::default(),
            output: OutputConfig::default(),
        }
    }

    /// Reads and validates a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, CalibError> {
        let text = fs::read_to_string(path).map_err(|err| CalibError::io("config-read", path, err))?;
        let config: RunConfig = serde_yaml::from_str(&text).map_err(|err| {
            CalibError::Serde(
                ErrorInfo::new("config-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Number of worker threads to use.
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(default_workers)
    }

    /// Checks the run shape. Prior hyperparameters are checked by `PriorModel::new`.
    pub fn validate(&self) -> Result<(), CalibError> {
        let config_error = |code: &str, message: &str| {
            Err(CalibError::Config(ErrorInfo::new(code, message.to_string())))
        };
        if self.walkers < 2 {
            return config_error("walkers", "at least two walkers are required");
        }
        if self.steps == 0 {
            return config_error("steps", "steps must be positive");
        }
        if self.burn_in >= self.steps {
            return Err(CalibError::Config(
                ErrorInfo::new("burn-in", "burn_in must be smaller than steps")
                    .with_context("burn_in", self.burn_in.to_string())
                    .with_context("steps", self.steps.to_string()),
            ));
        }
        if self.workers == Some(0) {
            return config_error("workers", "workers must be positive when set");
        }
        if !(self.stretch_scale.is_finite() && self.stretch_scale > 1.0) {
            return config_error("stretch-scale", "stretch_scale must be greater than 1");
        }
        if self.priors.is_empty() {
            return config_error("priors", "at least one prior is required");
        }
        if self.checkpoint.interval > 0 && self.checkpoint.max_to_keep == 0 {
            return config_error("checkpoint-retention", "max_to_keep must be positive");
        }
        self.init.validate(self.walkers, self.priors.len())
    }
}

/// Default worker count: all available cores but one, at least one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|cores| cores.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Observed dataset location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedConfig {
    /// Observed data file.
    pub path: PathBuf,
    /// Key and value column names for both observed and simulated tables.
    #[serde(default)]
    pub columns: ColumnSpec,
}

/// Gaussian noise scale settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodConfig {
    /// σ as a fraction of the observed population standard deviation.
    #[serde(default = "default_sigma_fraction")]
    pub sigma_fraction: f64,
    /// Lower bound on σ, used when the observations have no spread.
    #[serde(default = "default_sigma_floor")]
    pub sigma_floor: f64,
}

fn default_sigma_fraction() -> f64 {
    0.1
}

fn default_sigma_floor() -> f64 {
    1e-9
}

impl Default for LikelihoodConfig {
    fn default() -> Self {
        Self {
            sigma_fraction: default_sigma_fraction(),
            sigma_floor: default_sigma_floor(),
        }
    }
}

/// Starting positions of the walkers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum WalkerInit {
    /// Independent draws from the priors.
    #[default]
    FromPrior,
    /// Uniform jitter of width `radius` around `center`.
    Ball {
        /// Ball centre, one value per parameter.
        center: Vec<f64>,
        /// Jitter width in every dimension.
        radius: f64,
    },
    /// One explicit vector per walker.
    Explicit {
        /// Starting positions.
        positions: Vec<Vec<f64>>,
    },
}

impl WalkerInit {
    fn validate(&self, walkers: usize, ndim: usize) -> Result<(), CalibError> {
        let mismatch = |what: &str, expected: usize, found: usize| {
            Err(CalibError::Config(
                ErrorInfo::new("init-shape", format!("{what} does not match the run shape"))
                    .with_context("expected", expected.to_string())
                    .with_context("found", found.to_string()),
            ))
        };
        match self {
            WalkerInit::FromPrior => Ok(()),
            WalkerInit::Ball { center, radius } => {
                if center.len() != ndim {
                    return mismatch("ball centre length", ndim, center.len());
                }
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(CalibError::Config(ErrorInfo::new(
                        "init-radius",
                        "ball radius must be positive",
                    )));
                }
                Ok(())
            }
            WalkerInit::Explicit { positions } => {
                if positions.len() != walkers {
                    return mismatch("explicit position count", walkers, positions.len());
                }
                match positions.iter().find(|position| position.len() != ndim) {
                    Some(position) => mismatch("explicit position length", ndim, position.len()),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Checkpointing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Interval in steps between checkpoint writes (0 disables checkpoints).
    #[serde(default)]
    pub interval: usize,
    /// Maximum number of checkpoints to retain.
    #[serde(default = "default_checkpoint_retention")]
    pub max_to_keep: usize,
}

fn default_checkpoint_retention() -> usize {
    4
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: 0,
            max_to_keep: default_checkpoint_retention(),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded in the manifest.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Output directory layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for run artefacts; nothing is written when unset.
    #[serde(default)]
    pub run_directory: Option<PathBuf>,
    /// Flattened post-burn-in samples.
    #[serde(default = "default_samples_file")]
    pub samples_file: PathBuf,
    /// One-row summary statistics table.
    #[serde(default = "default_summary_file")]
    pub summary_file: PathBuf,
    /// Per-step, per-walker trace table.
    #[serde(default = "default_trace_file")]
    pub trace_file: PathBuf,
    /// Full summary including convergence diagnostics.
    #[serde(default = "default_summary_json")]
    pub summary_json: PathBuf,
    /// Full chain.
    #[serde(default = "default_chain_file")]
    pub chain_file: PathBuf,
    /// Per-step metrics.
    #[serde(default = "default_metrics_filename")]
    pub metrics_file: PathBuf,
    /// Run manifest.
    #[serde(default = "default_manifest_filename")]
    pub manifest_file: PathBuf,
    /// Subdirectory used for checkpoint files.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
}

fn default_samples_file() -> PathBuf {
    PathBuf::from("posterior_samples.csv")
}

fn default_summary_file() -> PathBuf {
    PathBuf::from("posterior_summary.csv")
}

fn default_trace_file() -> PathBuf {
    PathBuf::from("trace.csv")
}

fn default_summary_json() -> PathBuf {
    PathBuf::from("summary.json")
}

fn default_chain_file() -> PathBuf {
    PathBuf::from("chain.json")
}

fn default_metrics_filename() -> PathBuf {
    PathBuf::from("metrics.csv")
}

fn default_manifest_filename() -> PathBuf {
    PathBuf::from("manifest.json")
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("checkpoints")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            run_directory: None,
            samples_file: default_samples_file(),
            summary_file: default_summary_file(),
            trace_file: default_trace_file(),
            summary_json: default_summary_json(),
            chain_file: default_chain_file(),
            metrics_file: default_metrics_filename(),
            manifest_file: default_manifest_filename(),
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

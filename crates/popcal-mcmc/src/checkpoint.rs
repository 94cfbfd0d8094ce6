use std::fs;
use std::path::{Path, PathBuf};

use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::SchemaVersion;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::config::RunConfig;
use crate::metrics::StepMetrics;
use crate::sampler::SamplerState;

/// Everything needed to continue a run exactly where it stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointPayload {
    /// Payload schema.
    pub schema_version: SchemaVersion,
    /// Steps completed when the checkpoint was written.
    pub step: usize,
    /// Configuration snapshot associated with the run.
    pub config: RunConfig,
    /// Master seed of the run.
    pub master_seed: u64,
    /// Digest of the observed dataset the run was calibrated against.
    pub observed_hash: String,
    /// Ensemble state after `step` steps.
    pub state: SamplerState,
    /// Chain up to and including step `step - 1`.
    pub chain: Chain,
    /// Metrics recorded so far.
    pub metrics: Vec<StepMetrics>,
}

impl CheckpointPayload {
    /// Restores the payload from disk.
    pub fn load(path: &Path) -> Result<Self, CalibError> {
        let contents = fs::read_to_string(path).map_err(|err| CalibError::io("checkpoint-read", path, err))?;
        let payload: CheckpointPayload = serde_json::from_str(&contents).map_err(|err| {
            CalibError::Serde(
                ErrorInfo::new("checkpoint-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        if payload.chain.len() != payload.step || payload.metrics.len() != payload.step {
            return Err(CalibError::Serde(
                ErrorInfo::new("checkpoint-inconsistent", "chain length differs from step")
                    .with_context("path", path.display().to_string())
                    .with_context("step", payload.step.to_string())
                    .with_context("chain", payload.chain.len().to_string()),
            ));
        }
        Ok(payload)
    }

    /// Writes the payload to disk.
    pub fn store(&self, path: &Path) -> Result<(), CalibError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| CalibError::io("checkpoint-mkdir", parent, err))?;
        }
        let json = serde_json::to_string(self).map_err(|err| {
            CalibError::Serde(
                ErrorInfo::new("checkpoint-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| CalibError::io("checkpoint-write", path, err))
    }
}

/// Determines the checkpoint file path for a step count.
pub fn checkpoint_path(root: &Path, step: usize) -> PathBuf {
    root.join(format!("ckpt_{step:05}.json"))
}

/// Deletes the oldest checkpoints beyond `max_to_keep`.
pub fn enforce_retention(paths: &mut Vec<PathBuf>, max_to_keep: usize) -> Result<(), CalibError> {
    while paths.len() > max_to_keep {
        let oldest = paths.remove(0);
        fs::remove_file(&oldest).map_err(|err| CalibError::io("checkpoint-remove", &oldest, err))?;
    }
    Ok(())
}

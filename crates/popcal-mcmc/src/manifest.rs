use std::fs;
use std::path::{Path, PathBuf};

use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::RunProvenance;
use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactPaths;
use crate::config::RunConfig;

/// Structured manifest describing a completed calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Configuration used for the run.
    pub config: RunConfig,
    /// Master seed of the run.
    pub master_seed: u64,
    /// Optional seed label captured from the configuration.
    pub seed_label: Option<String>,
    /// Hashes, timestamp and tool versions.
    pub provenance: RunProvenance,
    /// Steps in the chain.
    pub steps_completed: usize,
    /// Worker threads used.
    pub workers: usize,
    /// Artefacts relative to the run directory.
    pub artifacts: ArtifactPaths,
    /// Checkpoint files retained (relative order preserved).
    pub checkpoints: Vec<PathBuf>,
}

impl RunManifest {
    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), CalibError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| CalibError::io("manifest-mkdir", parent, err))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            CalibError::Serde(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| CalibError::io("manifest-write", path, err))
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, CalibError> {
        let contents = fs::read_to_string(path).map_err(|err| CalibError::io("manifest-read", path, err))?;
        serde_json::from_str(&contents).map_err(|err| {
            CalibError::Serde(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

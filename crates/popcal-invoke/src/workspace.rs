//! Per-invocation scratch directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::failure::SimulationFailure;

const MAX_ATTEMPTS: usize = 8;

/// Directory owned by exactly one simulator invocation.
///
/// The directory is created with `create_dir` on the leaf, so an identifier collision
/// surfaces as `AlreadyExists` and is retried with a fresh UUID. Dropping the workspace
/// deletes its files and then the directory itself; removal problems are logged and
/// otherwise ignored.
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    dir: PathBuf,
}

impl Workspace {
    /// Creates a fresh workspace under `root`. The root itself must already exist.
    pub fn create(root: &Path) -> Result<Self, SimulationFailure> {
        let mut last_error = None;
        for _ in 0..MAX_ATTEMPTS {
            let id = Uuid::new_v4();
            let dir = root.join(id.simple().to_string());
            match fs::create_dir(&dir) {
                Ok(()) => return Ok(Self { id, dir }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(workspace = %id, "workspace identifier collision, retrying");
                    last_error = Some(err);
                }
                Err(err) => {
                    return Err(SimulationFailure::Workspace(format!(
                        "{}: {err}",
                        dir.display()
                    )))
                }
            }
        }
        Err(SimulationFailure::Workspace(format!(
            "no free identifier under {} after {MAX_ATTEMPTS} attempts: {}",
            root.display(),
            last_error.map(|err| err.to_string()).unwrap_or_default()
        )))
    }

    /// Workspace identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Workspace directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Captured standard output.
    pub fn stdout_path(&self) -> PathBuf {
        self.file("stdout.log")
    }

    /// Captured standard error.
    pub fn stderr_path(&self) -> PathBuf {
        self.file("stderr.log")
    }

    fn remove_contents(&self) -> io::Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(err) = self.remove_contents() {
            tracing::warn!(workspace = %self.id, error = %err, "failed to clear workspace files");
        }
        if let Err(err) = fs::remove_dir(&self.dir) {
            tracing::warn!(workspace = %self.id, error = %err, "failed to remove workspace");
        }
    }
}

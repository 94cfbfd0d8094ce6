//! Per-invocation failure outcomes.

use thiserror::Error;

/// Why a single simulator invocation produced no usable result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationFailure {
    /// The parameter vector does not match the declared parameter list.
    #[error("expected {expected} parameters, got {found}")]
    Dimension {
        /// Declared parameter count.
        expected: usize,
        /// Received parameter count.
        found: usize,
    },
    /// The per-invocation workspace could not be created.
    #[error("workspace unavailable: {0}")]
    Workspace(String),
    /// The simulator process could not be started.
    #[error("failed to spawn simulator: {0}")]
    Spawn(String),
    /// The simulator exited unsuccessfully. `code` is `None` when killed by a signal.
    #[error("simulator exited with status {code:?}")]
    NonZeroExit {
        /// Exit code, if any.
        code: Option<i32>,
        /// Tail of the captured standard error.
        stderr: String,
    },
    /// The simulator exceeded its wall-clock budget and was killed.
    #[error("simulator exceeded {limit_seconds}s wall-clock limit")]
    Timeout {
        /// Configured limit in seconds.
        limit_seconds: f64,
    },
    /// The simulator exited cleanly but its output table is missing or malformed.
    #[error("unusable simulator output: {0}")]
    Output(String),
}

impl SimulationFailure {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SimulationFailure::Dimension { .. } => "dimension",
            SimulationFailure::Workspace(_) => "workspace",
            SimulationFailure::Spawn(_) => "spawn",
            SimulationFailure::NonZeroExit { .. } => "non-zero-exit",
            SimulationFailure::Timeout { .. } => "timeout",
            SimulationFailure::Output(_) => "output",
        }
    }
}

//! Structured error types shared across popcal crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CalibError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, lengths, parameter names, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the operator resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the calibration engine.
///
/// Every variant is startup- or artefact-level: per-evaluation failures (simulator
/// crashes, empty joins, out-of-domain proposals) never surface as a `CalibError`, they
/// are absorbed into a rejected log-probability instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CalibError {
    /// Invalid or inconsistent run configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Prior specification errors.
    #[error("prior error: {0}")]
    Prior(ErrorInfo),
    /// Observed or simulated dataset errors.
    #[error("data error: {0}")]
    Data(ErrorInfo),
    /// Simulator setup errors (missing executable, unusable workspace root).
    #[error("simulator error: {0}")]
    Simulator(ErrorInfo),
    /// Sampler state and chain errors.
    #[error("sampler error: {0}")]
    Sampler(ErrorInfo),
    /// Filesystem errors while reading or writing artefacts.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl CalibError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CalibError::Config(info)
            | CalibError::Prior(info)
            | CalibError::Data(info)
            | CalibError::Simulator(info)
            | CalibError::Sampler(info)
            | CalibError::Io(info)
            | CalibError::Serde(info) => info,
        }
    }

    /// Builds an [`CalibError::Io`] tagged with the offending path.
    pub fn io(code: &str, path: &std::path::Path, err: impl ToString) -> Self {
        CalibError::Io(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}

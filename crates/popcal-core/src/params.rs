//! Parameter vectors and log-probability values.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Whether a calibrated quantity is real-valued or integer-valued.
///
/// Discrete parameters are proposed on the continuous line and rounded exactly once,
/// right before the simulator sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKind {
    /// Real-valued parameter passed through unchanged.
    #[default]
    Continuous,
    /// Integer-valued parameter rounded before invocation.
    Discrete,
}

/// Ordered tuple of parameter values proposed by the sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterVector(Vec<f64>);

impl ParameterVector {
    /// Wraps the provided values.
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the vector has no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Component values in declaration order.
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Consumes the vector returning the raw values.
    pub fn into_values(self) -> Vec<f64> {
        self.0
    }

    /// Returns a copy with every discrete component rounded to the nearest integer.
    ///
    /// Ties round to even. Components beyond `kinds` are left untouched, callers are
    /// expected to have checked the dimension at construction time.
    pub fn rounded(&self, kinds: &[ParamKind]) -> ParameterVector {
        let values = self
            .0
            .iter()
            .enumerate()
            .map(|(idx, &value)| match kinds.get(idx) {
                Some(ParamKind::Discrete) => round_discrete(value),
                _ => value,
            })
            .collect();
        ParameterVector(values)
    }
}

impl From<Vec<f64>> for ParameterVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Rounds a discrete-intent value to the nearest integer, ties to even.
pub fn round_discrete(value: f64) -> f64 {
    value.round_ties_even()
}

/// Log-probability of a proposal; negative infinity marks a rejected proposal.
///
/// The constructor never lets NaN through: any computation that degenerates to NaN is
/// normalized to a rejection.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LogProbability(f64);

impl LogProbability {
    /// Rejected proposal.
    pub const REJECTED: LogProbability = LogProbability(f64::NEG_INFINITY);

    /// Wraps a raw value, mapping NaN to [`LogProbability::REJECTED`].
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self::REJECTED
        } else {
            Self(value)
        }
    }

    /// Raw value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Returns `true` for finite log-probabilities.
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Returns `true` when the proposal was rejected.
    pub fn is_rejected(self) -> bool {
        self.0 == f64::NEG_INFINITY
    }
}

impl std::ops::Add for LogProbability {
    type Output = LogProbability;

    fn add(self, rhs: LogProbability) -> LogProbability {
        if self.is_rejected() || rhs.is_rejected() {
            return LogProbability::REJECTED;
        }
        LogProbability::new(self.0 + rhs.0)
    }
}

impl fmt::Display for LogProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// JSON has no infinities, so rejections travel as `null`.
impl Serialize for LogProbability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_some(&self.0)
        } else {
            serializer.serialize_none()
        }
    }
}

impl<'de> Deserialize<'de> for LogProbability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.map_or(LogProbability::REJECTED, LogProbability::new))
    }
}

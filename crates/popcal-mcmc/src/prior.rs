//! Prior specification and log-prior evaluation.

use std::collections::BTreeSet;

use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::{LogProbability, ParamKind, ParameterVector};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::{Gamma, Normal};
use serde::{Deserialize, Serialize};

use crate::special::{gamma_ln_pdf, normal_ln_pdf, uniform_ln_pdf};

const MAX_BOUNDED_DRAWS: usize = 10_000;

/// Distribution family of a single parameter prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "kebab-case")]
pub enum PriorFamily {
    /// Gamma distribution, support `x > 0`.
    Gamma {
        /// Shape `k`.
        shape: f64,
        /// Scale `θ`.
        scale: f64,
    },
    /// Normal distribution, unbounded support.
    Normal {
        /// Location.
        mean: f64,
        /// Standard deviation.
        sd: f64,
    },
    /// Uniform distribution on `[low, high]`.
    Uniform {
        /// Lower edge, inclusive.
        low: f64,
        /// Upper edge, inclusive.
        high: f64,
    },
}

impl PriorFamily {
    fn validate(&self, name: &str) -> Result<(), CalibError> {
        let invalid = |message: &str| {
            Err(CalibError::Prior(
                ErrorInfo::new("prior-hyperparameter", message.to_string())
                    .with_context("parameter", name),
            ))
        };
        match *self {
            PriorFamily::Gamma { shape, scale } => {
                if !(shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0) {
                    return invalid("gamma shape and scale must be positive and finite");
                }
            }
            PriorFamily::Normal { mean, sd } => {
                if !(mean.is_finite() && sd.is_finite() && sd > 0.0) {
                    return invalid("normal sd must be positive and the mean finite");
                }
            }
            PriorFamily::Uniform { low, high } => {
                if !(low.is_finite() && high.is_finite() && low < high) {
                    return invalid("uniform bounds must be finite with low < high");
                }
            }
        }
        Ok(())
    }

    /// Log-density at `x`; negative infinity outside the family's support.
    pub fn ln_pdf(&self, x: f64) -> f64 {
        match *self {
            PriorFamily::Gamma { shape, scale } => gamma_ln_pdf(x, shape, scale),
            PriorFamily::Normal { mean, sd } => normal_ln_pdf(x, mean, sd),
            PriorFamily::Uniform { low, high } => uniform_ln_pdf(x, low, high),
        }
    }

    /// Draws one value from the distribution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, CalibError> {
        let draw = match *self {
            PriorFamily::Gamma { shape, scale } => Gamma::new(shape, scale)
                .map_err(|err| sample_error(err.to_string()))?
                .sample(rng),
            PriorFamily::Normal { mean, sd } => Normal::new(mean, sd)
                .map_err(|err| sample_error(err.to_string()))?
                .sample(rng),
            PriorFamily::Uniform { low, high } => Uniform::new_inclusive(low, high).sample(rng),
        };
        Ok(draw)
    }
}

fn sample_error(message: String) -> CalibError {
    CalibError::Prior(ErrorInfo::new("prior-sample", message))
}

/// Prior for one named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterPrior {
    /// Parameter name, used for artefact columns.
    pub name: String,
    /// Continuous or discrete.
    #[serde(default)]
    pub kind: ParamKind,
    /// Density family.
    pub distribution: PriorFamily,
    /// Optional inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    /// Optional inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

impl ParameterPrior {
    /// Unbounded prior.
    pub fn new(name: impl Into<String>, kind: ParamKind, distribution: PriorFamily) -> Self {
        Self {
            name: name.into(),
            kind,
            distribution,
            lower: None,
            upper: None,
        }
    }

    /// Adds inclusive bounds.
    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    /// `true` when `x` is finite and inside the explicit bounds.
    pub fn within_bounds(&self, x: f64) -> bool {
        x.is_finite()
            && self.lower.map_or(true, |lower| x >= lower)
            && self.upper.map_or(true, |upper| x <= upper)
    }

    /// Log-prior contribution of this parameter.
    pub fn ln_prior(&self, x: f64) -> f64 {
        if !self.within_bounds(x) {
            return f64::NEG_INFINITY;
        }
        self.distribution.ln_pdf(x)
    }

    fn validate(&self) -> Result<(), CalibError> {
        if self.name.trim().is_empty() {
            return Err(CalibError::Prior(ErrorInfo::new(
                "prior-name",
                "parameter names must not be empty",
            )));
        }
        self.distribution.validate(&self.name)?;
        let bound_ok = |bound: Option<f64>| bound.map_or(true, |value| !value.is_nan());
        if !bound_ok(self.lower) || !bound_ok(self.upper) {
            return Err(CalibError::Prior(
                ErrorInfo::new("prior-bounds", "bounds must not be NaN")
                    .with_context("parameter", self.name.clone()),
            ));
        }
        if let (Some(lower), Some(upper)) = (self.lower, self.upper) {
            if lower >= upper {
                return Err(CalibError::Prior(
                    ErrorInfo::new("prior-bounds", "lower bound must be below upper bound")
                        .with_context("parameter", self.name.clone())
                        .with_context("lower", lower.to_string())
                        .with_context("upper", upper.to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Ordered list of parameter priors.
///
/// Position `i` of every [`ParameterVector`] is scored by prior `i`. The mapping is fixed
/// at construction time and never re-derived from names.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorModel {
    params: Vec<ParameterPrior>,
}

impl PriorModel {
    /// Validates and wraps the priors.
    pub fn new(params: Vec<ParameterPrior>) -> Result<Self, CalibError> {
        if params.is_empty() {
            return Err(CalibError::Prior(
                ErrorInfo::new("prior-empty", "at least one parameter prior is required")
                    .with_hint("add entries under `priors` in the run configuration"),
            ));
        }
        let mut seen = BTreeSet::new();
        for prior in &params {
            prior.validate()?;
            if !seen.insert(prior.name.as_str()) {
                return Err(CalibError::Prior(
                    ErrorInfo::new("prior-duplicate", "parameter names must be unique")
                        .with_context("parameter", prior.name.clone()),
                ));
            }
        }
        Ok(Self { params })
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Always `false` for a constructed model.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Declared priors in order.
    pub fn parameters(&self) -> &[ParameterPrior] {
        &self.params
    }

    /// Parameter names in order.
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|prior| prior.name.clone()).collect()
    }

    /// Parameter kinds in order.
    pub fn kinds(&self) -> Vec<ParamKind> {
        self.params.iter().map(|prior| prior.kind).collect()
    }

    /// Fails unless `len` matches the declared parameter count.
    pub fn check_dimension(&self, len: usize) -> Result<(), CalibError> {
        if len != self.params.len() {
            return Err(CalibError::Config(
                ErrorInfo::new("dimension-mismatch", "vector length differs from prior list")
                    .with_context("expected", self.params.len().to_string())
                    .with_context("found", len.to_string()),
            ));
        }
        Ok(())
    }

    /// Sum of per-parameter log-densities, or a rejection when any component is
    /// out of bounds, outside its family's support or non-finite.
    pub fn log_prior(&self, vector: &ParameterVector) -> LogProbability {
        if vector.len() != self.params.len() {
            return LogProbability::REJECTED;
        }
        let mut total = 0.0;
        for (prior, &value) in self.params.iter().zip(vector.values()) {
            let contribution = prior.ln_prior(value);
            if !contribution.is_finite() {
                return LogProbability::REJECTED;
            }
            total += contribution;
        }
        LogProbability::new(total)
    }

    /// Draws a vector from the priors, re-drawing components that fall outside their
    /// explicit bounds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ParameterVector, CalibError> {
        let mut values = Vec::with_capacity(self.params.len());
        for prior in &self.params {
            let mut accepted = None;
            for _ in 0..MAX_BOUNDED_DRAWS {
                let draw = prior.distribution.sample(rng)?;
                if prior.ln_prior(draw).is_finite() {
                    accepted = Some(draw);
                    break;
                }
            }
            let value = accepted.ok_or_else(|| {
                CalibError::Prior(
                    ErrorInfo::new(
                        "prior-sample-bounds",
                        "could not draw a value inside the parameter bounds",
                    )
                    .with_context("parameter", prior.name.clone())
                    .with_hint("check that the bounds overlap the distribution's mass"),
                )
            })?;
            values.push(value);
        }
        Ok(ParameterVector::new(values))
    }
}

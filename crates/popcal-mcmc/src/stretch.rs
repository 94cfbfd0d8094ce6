//! Goodman & Weare affine-invariant stretch move.

use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::{LogProbability, ParameterVector};
use rand::Rng;

/// Stretch move with scale parameter `a`.
///
/// Stretch factors `z` are drawn from `g(z) ∝ 1/√z` on `[1/a, a]` by inverse transform,
/// `z = ((a - 1)·u + 1)² / a`. A proposal for walker `x` against complementary walker `c`
/// is `c + z·(x - c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchMove {
    a: f64,
}

impl Default for StretchMove {
    fn default() -> Self {
        Self { a: 2.0 }
    }
}

impl StretchMove {
    /// Custom scale; must be greater than one.
    pub fn new(a: f64) -> Result<Self, CalibError> {
        if !(a.is_finite() && a > 1.0) {
            return Err(CalibError::Config(
                ErrorInfo::new("stretch-scale", "stretch_scale must be greater than 1")
                    .with_context("stretch_scale", a.to_string()),
            ));
        }
        Ok(Self { a })
    }

    /// Scale parameter.
    pub fn scale(&self) -> f64 {
        self.a
    }

    /// Draws a stretch factor.
    pub fn sample_z<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.gen();
        ((self.a - 1.0) * u + 1.0).powi(2) / self.a
    }

    /// Proposes a new position for `current`, picking the partner uniformly from
    /// `complementary`. Returns the proposal and the stretch factor used.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        current: &ParameterVector,
        complementary: &[ParameterVector],
    ) -> (ParameterVector, f64) {
        let z = self.sample_z(rng);
        let partner = &complementary[rng.gen_range(0..complementary.len())];
        let values = current
            .values()
            .iter()
            .zip(partner.values())
            .map(|(&x, &c)| c + z * (x - c))
            .collect();
        (ParameterVector::new(values), z)
    }

    /// `min(1, z^(n-1)·exp(new - old))`; zero whenever the proposal was rejected.
    pub fn acceptance_probability(
        &self,
        z: f64,
        ndim: usize,
        old: LogProbability,
        new: LogProbability,
    ) -> f64 {
        if !new.is_finite() {
            return 0.0;
        }
        let log_ratio = (ndim as f64 - 1.0) * z.ln() + (new.value() - old.value());
        log_ratio.exp().min(1.0)
    }
}

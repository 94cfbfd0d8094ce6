//! Special functions needed by the prior log-densities.

use std::f64::consts::PI;

/// `ln(2π)`.
pub const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Lanczos approximation of `ln Γ(x)` with g = 5 and six coefficients.
///
/// Accurate to roughly 2e-10 for positive `x`. Returns `f64::INFINITY` at and below zero
/// where the gamma function has poles or is undefined for our purposes.
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.001_208_650_973_866_179,
        -5.395_239_384_953e-6,
    ];

    if x <= 0.0 || x.is_nan() {
        return f64::INFINITY;
    }

    let z = x - 1.0;
    let mut sum = 1.000_000_000_190_015_f64;
    for (i, &c) in COEFFS.iter().enumerate() {
        sum += c / (z + 1.0 + i as f64);
    }

    let t = z + 5.5;
    0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + sum.ln()
}

/// Log-density of a gamma distribution with the given shape and scale.
pub fn gamma_ln_pdf(x: f64, shape: f64, scale: f64) -> f64 {
    if x <= 0.0 {
        return f64::NEG_INFINITY;
    }
    (shape - 1.0) * x.ln() - x / scale - ln_gamma(shape) - shape * scale.ln()
}

/// Log-density of a normal distribution.
pub fn normal_ln_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    let standardized = (x - mean) / sd;
    -0.5 * standardized * standardized - sd.ln() - 0.5 * LN_2PI
}

/// Log-density of a uniform distribution on the closed interval `[low, high]`.
pub fn uniform_ln_pdf(x: f64, low: f64, high: f64) -> f64 {
    if x < low || x > high {
        return f64::NEG_INFINITY;
    }
    -(high - low).ln()
}

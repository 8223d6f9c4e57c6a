//! Gaussian line profile with a constant baseline.
//!
//! ```text
//! f(x; μ, σ, b, sc) = b + sc · (1 / (σ √(2π))) · exp(-(x - μ)² / (2σ²))
//! ```
//!
//! `sc` is the area under the profile above `b`, so it is the line flux in the
//! (normalized) intensity units of the input.

use crate::domain::{GaussianParams, PARAM_COUNT};

/// `1 / √(2π)`, the unit-area normalization of the Gaussian.
pub const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Evaluate the model at `x`.
pub fn gaussian(x: f64, p: &GaussianParams) -> f64 {
    p.b + p.sc * profile(x, p.mu, p.sigma)
}

/// Unit-area profile `(1 / (σ √(2π))) · exp(-(x - μ)² / (2σ²))`.
pub fn profile(x: f64, mu: f64, sigma: f64) -> f64 {
    let z = (x - mu) / sigma;
    FRAC_1_SQRT_2PI / sigma * (-0.5 * z * z).exp()
}

/// Partial derivatives of the model at `x`, in `(μ, σ, b, sc)` order.
pub fn gradient(x: f64, p: &GaussianParams) -> [f64; PARAM_COUNT] {
    let g = profile(x, p.mu, p.sigma);
    let dx = x - p.mu;
    let s2 = p.sigma * p.sigma;

    let d_mu = p.sc * g * dx / s2;
    let d_sigma = p.sc * g * (dx * dx / (s2 * p.sigma) - 1.0 / p.sigma);
    [d_mu, d_sigma, 1.0, g]
}

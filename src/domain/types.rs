//! Shared spectral-fit types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built from ingest or synthetic generation
//! - passed through the solver without copying
//! - exported to JSON/CSV after a fit

use std::path::PathBuf;

use nalgebra::{DVector, Matrix4};
use serde::Serialize;

/// Number of free parameters in the Gaussian-plus-offset model.
pub const PARAM_COUNT: usize = 4;

/// Parameter labels in solver order.
pub const PARAM_NAMES: [&str; PARAM_COUNT] = ["mu", "sigma", "b", "sc"];

/// One sample of a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectrumPoint {
    pub wavelength: f64,
    pub intensity: f64,
}

/// Ordered `(wavelength, intensity)` samples as loaded from disk.
///
/// Wavelengths are expected to be non-decreasing but this is not enforced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumTable {
    pub points: Vec<SpectrumPoint>,
}

impl SpectrumTable {
    pub fn new(points: Vec<SpectrumPoint>) -> Self {
        Self { points }
    }

    pub fn from_columns(wavelengths: &[f64], intensities: &[f64]) -> Self {
        let points = wavelengths
            .iter()
            .zip(intensities)
            .map(|(&wavelength, &intensity)| SpectrumPoint { wavelength, intensity })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn wavelengths(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.wavelength).collect()
    }

    pub fn intensities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.intensity).collect()
    }
}

/// Spectrum with intensities rescaled onto `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSpectrum {
    pub wavelengths: Vec<f64>,
    pub intensities: Vec<f64>,
    /// Raw intensity mapped to 0.
    pub raw_min: f64,
    /// `max(raw) - min(raw)`; always strictly positive.
    pub raw_range: f64,
}

/// Gaussian-plus-offset line profile parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaussianParams {
    /// Line centre (same units as the wavelength column).
    pub mu: f64,
    /// Line width (standard deviation).
    pub sigma: f64,
    /// Baseline offset.
    pub b: f64,
    /// Area scale; proportional to the integrated line flux above baseline.
    pub sc: f64,
}

impl GaussianParams {
    pub fn new(mu: f64, sigma: f64, b: f64, sc: f64) -> Self {
        Self { mu, sigma, b, sc }
    }

    /// Parameters as a solver vector in `PARAM_NAMES` order.
    pub fn to_dvector(self) -> DVector<f64> {
        DVector::from_column_slice(&[self.mu, self.sigma, self.b, self.sc])
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            mu: values[0],
            sigma: values[1],
            b: values[2],
            sc: values[3],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.mu.is_finite() && self.sigma.is_finite() && self.b.is_finite() && self.sc.is_finite()
    }
}

/// Partial initial guess; `None` components fall back to defaults derived
/// from the observed line wavelength.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GuessOverrides {
    pub mu: Option<f64>,
    pub sigma: Option<f64>,
    pub b: Option<f64>,
    pub sc: Option<f64>,
}

impl GuessOverrides {
    /// Default seed: `mu = wl, sigma = 0.5, b = 0.1, sc = 5`.
    pub fn resolve(&self, observed_wavelength: f64) -> GaussianParams {
        GaussianParams {
            mu: self.mu.unwrap_or(observed_wavelength),
            sigma: self.sigma.unwrap_or(0.5),
            b: self.b.unwrap_or(0.1),
            sc: self.sc.unwrap_or(5.0),
        }
    }
}

/// Fitted parameters plus their covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub params: GaussianParams,
    /// Covariance in `PARAM_NAMES` order, scaled by the reduced chi-square.
    pub covariance: Matrix4<f64>,
    pub iterations: usize,
    /// Sum of squared residuals at the solution.
    pub sse: f64,
    /// Degrees of freedom (`n - 4`).
    pub dof: usize,
}

impl FitResult {
    /// Standard errors: square roots of the covariance diagonal.
    pub fn std_errors(&self) -> [f64; PARAM_COUNT] {
        let mut out = [0.0; PARAM_COUNT];
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = self.covariance[(k, k)].sqrt();
        }
        out
    }

    pub fn flux(&self) -> FluxMeasurement {
        FluxMeasurement {
            flux: self.params.sc.abs(),
            error: self.std_errors()[3],
        }
    }
}

/// Reported line flux: `|sc|` and its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluxMeasurement {
    pub flux: f64,
    pub error: f64,
}

/// Full outcome of one spectrum, as exported to JSON.
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub source: String,
    pub samples: usize,
    pub redshift: f64,
    pub lambda_rest: f64,
    pub observed_wavelength: f64,
    pub normalization: NormalizationInfo,
    pub initial_guess: GaussianParams,
    pub params: GaussianParams,
    pub std_errors: GaussianParams,
    pub covariance: Vec<Vec<f64>>,
    pub iterations: usize,
    pub sse: f64,
    pub dof: usize,
    pub measurement: FluxMeasurement,
    /// Normalized spectrum and model values at each sample (not serialized).
    #[serde(skip)]
    pub samples_detail: Vec<SampleFit>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NormalizationInfo {
    pub raw_min: f64,
    pub raw_range: f64,
}

/// Per-sample comparison between normalized data and fitted model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleFit {
    pub wavelength: f64,
    pub normalized: f64,
    pub model: f64,
    pub residual: f64,
}

/// A full `fit` run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `.env` defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub inputs: Vec<PathBuf>,
    pub redshift: f64,
    pub lambda_rest: f64,
    pub guess: GuessOverrides,
    /// Solver iteration cap; `None` uses `200 * (p + 1)`.
    pub max_iterations: Option<usize>,
    pub export_json: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

/// Parameters for generating a synthetic line spectrum.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub start: f64,
    pub end: f64,
    pub samples: usize,
    pub params: GaussianParams,
    /// Standard deviation of additive Gaussian noise (0 disables noise).
    pub noise: f64,
    pub seed: u64,
}

/// A saved fit bundle (JSON).
#[derive(Debug, Clone, Serialize)]
pub struct FitBundle {
    pub tool: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub fits: Vec<FitReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flux_is_absolute_scale_and_last_error() {
        let mut cov = Matrix4::zeros();
        cov[(3, 3)] = 0.04;
        cov[(0, 0)] = 9.0;
        let fit = FitResult {
            params: GaussianParams::new(1.0, 0.5, 0.0, -2.5),
            covariance: cov,
            iterations: 3,
            sse: 0.0,
            dof: 10,
        };
        let m = fit.flux();
        assert!((m.flux - 2.5).abs() < 1e-12);
        assert!((m.error - 0.2).abs() < 1e-12);
        assert!((fit.std_errors()[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn guess_defaults_follow_observed_wavelength() {
        let g = GuessOverrides {
            sigma: Some(1.5),
            ..GuessOverrides::default()
        }
        .resolve(8400.64);
        assert_eq!(g, GaussianParams::new(8400.64, 1.5, 0.1, 5.0));
    }
}

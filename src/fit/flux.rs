//! Gaussian line fitting and flux estimation.
//!
//! The estimate is a single pass:
//!
//! - normalize intensities onto `[0, 1]`
//! - place the line at its observed wavelength `lambda_rest * (1 + z)`
//! - fit `(μ, σ, b, sc)` by Levenberg–Marquardt
//! - report `|sc|` and the standard error of `sc`
//!
//! No bounds are placed on the parameters. A negative σ is a valid minimum of
//! the same curve (with the sign of `sc` flipped), so it is accepted and only
//! logged; a zero or non-finite σ is a failed fit.

use nalgebra::{DMatrix, DVector, Matrix4};

use crate::domain::{
    FitReport, FitResult, FluxMeasurement, GaussianParams, GuessOverrides, NormalizationInfo, PARAM_COUNT,
    SampleFit, SpectrumTable,
};
use crate::error::AppError;
use crate::fit::normalize::{normalize, observed_wavelength};
use crate::math::{LeastSquaresProblem, SolverOptions, levenberg_marquardt};
use crate::models::{gaussian, gradient};

/// Least-squares view of `(x_i, y_i)` samples under the Gaussian model.
struct GaussianProblem<'a> {
    x: &'a [f64],
    y: &'a [f64],
}

impl LeastSquaresProblem for GaussianProblem<'_> {
    fn sample_count(&self) -> usize {
        self.x.len()
    }

    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let p = GaussianParams::from_slice(params.as_slice());
        DVector::from_iterator(
            self.x.len(),
            self.x.iter().zip(self.y).map(|(&x, &y)| gaussian(x, &p) - y),
        )
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let p = GaussianParams::from_slice(params.as_slice());
        let mut jac = DMatrix::zeros(self.x.len(), PARAM_COUNT);
        for (i, &x) in self.x.iter().enumerate() {
            for (k, d) in gradient(x, &p).into_iter().enumerate() {
                jac[(i, k)] = d;
            }
        }
        jac
    }
}

/// Fit the Gaussian-plus-offset model to raw `(x, y)` samples.
pub fn fit_gaussian(
    x: &[f64],
    y: &[f64],
    initial_guess: GaussianParams,
    opts: &SolverOptions,
) -> Result<FitResult, AppError> {
    if x.len() != y.len() {
        return Err(AppError::data_load(format!(
            "Mismatched sample columns: {} wavelengths vs {} intensities.",
            x.len(),
            y.len()
        )));
    }
    if x.len() < PARAM_COUNT {
        return Err(AppError::data_load(format!(
            "Need at least {PARAM_COUNT} samples to fit a Gaussian, got {}.",
            x.len()
        )));
    }
    if !initial_guess.is_finite() || initial_guess.sigma == 0.0 {
        return Err(AppError::data_load(format!(
            "Initial guess must be finite with sigma != 0: {initial_guess:?}"
        )));
    }

    let problem = GaussianProblem { x, y };
    let solution = levenberg_marquardt(&problem, initial_guess.to_dvector(), opts)?;

    let params = GaussianParams::from_slice(solution.params.as_slice());
    if !params.is_finite() || params.sigma == 0.0 {
        return Err(AppError::fit(format!("Fit produced an unusable line profile: {params:?}")));
    }
    if params.sigma < 0.0 {
        log::warn!(
            "Fitted sigma is negative ({:.4}); profile is equivalent to sigma={:.4}, sc={:.4}",
            params.sigma,
            -params.sigma,
            -params.sc
        );
    }

    let covariance: Matrix4<f64> = solution.covariance.fixed_view::<4, 4>(0, 0).into_owned();
    Ok(FitResult {
        params,
        covariance,
        iterations: solution.iterations,
        sse: solution.sse,
        dof: solution.dof,
    })
}

/// Estimate the flux of the line at `lambda_rest` redshifted by `z`.
pub fn estimate_flux(
    table: &SpectrumTable,
    z: f64,
    lambda_rest: f64,
    initial_guess: GaussianParams,
) -> Result<FluxMeasurement, AppError> {
    let (_, fit) = run_estimate(table, z, lambda_rest, initial_guess, &SolverOptions::default())?;
    Ok(fit.flux())
}

/// Like [`estimate_flux`], but returns everything needed for reporting/export.
pub fn estimate_flux_report(
    source: &str,
    table: &SpectrumTable,
    z: f64,
    lambda_rest: f64,
    guess: &GuessOverrides,
    opts: &SolverOptions,
) -> Result<FitReport, AppError> {
    let wl = observed_wavelength(lambda_rest, z);
    let initial_guess = guess.resolve(wl);
    let (normalized, fit) = run_estimate(table, z, lambda_rest, initial_guess, opts)?;

    let samples_detail = normalized
        .wavelengths
        .iter()
        .zip(&normalized.intensities)
        .map(|(&wavelength, &y)| {
            let model = gaussian(wavelength, &fit.params);
            SampleFit {
                wavelength,
                normalized: y,
                model,
                residual: y - model,
            }
        })
        .collect();

    let errors = fit.std_errors();
    let covariance = (0..PARAM_COUNT)
        .map(|r| (0..PARAM_COUNT).map(|c| fit.covariance[(r, c)]).collect())
        .collect();

    Ok(FitReport {
        source: source.to_string(),
        samples: table.len(),
        redshift: z,
        lambda_rest,
        observed_wavelength: wl,
        normalization: NormalizationInfo {
            raw_min: normalized.raw_min,
            raw_range: normalized.raw_range,
        },
        initial_guess,
        params: fit.params,
        std_errors: GaussianParams::from_slice(&errors),
        covariance,
        iterations: fit.iterations,
        sse: fit.sse,
        dof: fit.dof,
        measurement: fit.flux(),
        samples_detail,
    })
}

fn run_estimate(
    table: &SpectrumTable,
    z: f64,
    lambda_rest: f64,
    initial_guess: GaussianParams,
    opts: &SolverOptions,
) -> Result<(crate::domain::NormalizedSpectrum, FitResult), AppError> {
    if !(z.is_finite() && z >= 0.0) {
        return Err(AppError::data_load(format!("Redshift must be finite and >= 0, got {z}.")));
    }
    if !(lambda_rest.is_finite() && lambda_rest > 0.0) {
        return Err(AppError::data_load(format!(
            "Rest wavelength must be finite and > 0, got {lambda_rest}."
        )));
    }
    // Checked before normalization so a short table never reaches the solver.
    if table.len() < PARAM_COUNT {
        return Err(AppError::data_load(format!(
            "Spectrum has {} samples; at least {PARAM_COUNT} are required.",
            table.len()
        )));
    }

    let normalized = normalize(table)?;
    log::debug!(
        "Fitting {} samples around {:.3} (raw min={:.4}, range={:.4})",
        table.len(),
        observed_wavelength(lambda_rest, z),
        normalized.raw_min,
        normalized.raw_range
    );

    let fit = fit_gaussian(&normalized.wavelengths, &normalized.intensities, initial_guess, opts)?;
    log::info!(
        "Fit converged in {} iterations: mu={:.4} sigma={:.4} b={:.4} sc={:.4}",
        fit.iterations,
        fit.params.mu,
        fit.params.sigma,
        fit.params.b,
        fit.params.sc
    );
    Ok((normalized, fit))
}

//! Levenberg–Marquardt solver for small dense least-squares problems.
//!
//! We minimize the sum of squared residuals:
//!
//! ```text
//! minimize Σ r_i(p)^2
//! ```
//!
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr
//! ```
//!
//! and accepts the step only when it lowers the cost. λ shrinks by 10× on
//! success and grows by 10× on rejection (Marquardt scaling).
//!
//! The covariance of the estimate follows the usual curve-fitting convention:
//! `(JᵀJ)⁻¹ · SSR / (n - p)`, computed from the SVD of the Jacobian so that a
//! rank-deficient problem is reported instead of silently producing huge numbers.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Smallest diagonal used for Marquardt scaling (keeps flat directions damped).
const MIN_DIAG: f64 = 1e-12;
const MIN_LAMBDA: f64 = 1e-15;
const MAX_LAMBDA: f64 = 1e16;
const LAMBDA_FACTOR: f64 = 10.0;

/// A residual vector and its Jacobian as functions of the parameters.
pub trait LeastSquaresProblem {
    /// Number of residuals `n`.
    fn sample_count(&self) -> usize;

    /// `r_i(p) = model(x_i; p) - y_i`.
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// `J_ik = ∂r_i / ∂p_k`, an `n × p` matrix.
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Stop when the relative cost reduction of an accepted step is below this.
    pub ftol: f64,
    /// Stop when every component of an accepted step is below `xtol * (|p_k| + xtol)`.
    pub xtol: f64,
    /// Iteration cap; `None` means `200 * (p + 1)`.
    pub max_iterations: Option<usize>,
    pub initial_lambda: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            max_iterations: None,
            initial_lambda: 1e-3,
        }
    }
}

/// Why the solver stopped successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    ExactFit,
    CostTolerance,
    StepTolerance,
    /// No step lowered the cost even at maximum damping.
    Stalled,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LmError {
    #[error("underdetermined problem: {samples} samples for {params} parameters")]
    Underdetermined { samples: usize, params: usize },
    #[error("non-finite residuals or Jacobian at iteration {0}")]
    NonFinite(usize),
    #[error("no convergence within {0} iterations")]
    MaxIterations(usize),
    #[error("singular Jacobian; covariance cannot be estimated")]
    SingularCovariance,
}

#[derive(Debug, Clone)]
pub struct LmSolution {
    pub params: DVector<f64>,
    pub covariance: DMatrix<f64>,
    pub iterations: usize,
    /// Sum of squared residuals at `params`.
    pub sse: f64,
    pub dof: usize,
    pub termination: Termination,
}

/// Minimize `problem` starting from `initial`.
pub fn levenberg_marquardt<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    opts: &SolverOptions,
) -> Result<LmSolution, LmError> {
    let p = initial.len();
    let n = problem.sample_count();
    if n < p {
        return Err(LmError::Underdetermined { samples: n, params: p });
    }
    let max_iterations = opts.max_iterations.unwrap_or(200 * (p + 1));

    let mut params = initial;
    let mut residuals = problem.residuals(&params);
    let mut cost = residuals.norm_squared();
    if !cost.is_finite() {
        return Err(LmError::NonFinite(0));
    }

    let mut lambda = opts.initial_lambda;
    let mut iterations = 0usize;
    let mut termination = None;

    while iterations < max_iterations {
        if cost == 0.0 {
            termination = Some(Termination::ExactFit);
            break;
        }
        iterations += 1;

        let jac = problem.jacobian(&params);
        if !jac.iter().all(|v| v.is_finite()) {
            return Err(LmError::NonFinite(iterations));
        }
        let jtj = jac.tr_mul(&jac);
        let grad = jac.tr_mul(&residuals);

        let mut accepted = false;
        while lambda <= MAX_LAMBDA {
            let mut aug = jtj.clone();
            for i in 0..p {
                aug[(i, i)] += lambda * jtj[(i, i)].max(MIN_DIAG);
            }
            let Some(chol) = aug.cholesky() else {
                lambda *= LAMBDA_FACTOR;
                continue;
            };
            let step = -chol.solve(&grad);
            let candidate = &params + &step;
            let trial = problem.residuals(&candidate);
            let trial_cost = trial.norm_squared();

            if trial_cost.is_finite() && trial_cost < cost {
                let reduction = (cost - trial_cost) / cost;
                let small_step = step
                    .iter()
                    .zip(params.iter())
                    .all(|(d, x)| d.abs() <= opts.xtol * (x.abs() + opts.xtol));

                params = candidate;
                residuals = trial;
                cost = trial_cost;
                lambda = (lambda / LAMBDA_FACTOR).max(MIN_LAMBDA);
                accepted = true;

                if cost == 0.0 {
                    termination = Some(Termination::ExactFit);
                } else if reduction <= opts.ftol {
                    termination = Some(Termination::CostTolerance);
                } else if small_step {
                    termination = Some(Termination::StepTolerance);
                }
                break;
            }
            lambda *= LAMBDA_FACTOR;
        }

        if termination.is_some() {
            break;
        }
        if !accepted {
            termination = Some(Termination::Stalled);
            break;
        }
    }

    let Some(termination) = termination else {
        return Err(LmError::MaxIterations(max_iterations));
    };
    log::debug!("LM stopped after {iterations} iterations ({termination:?}), SSR={cost:.3e}");

    let jac = problem.jacobian(&params);
    if !jac.iter().all(|v| v.is_finite()) {
        return Err(LmError::NonFinite(iterations));
    }
    let dof = n - p;
    let covariance = covariance_from_jacobian(&jac, cost, dof)?;

    Ok(LmSolution {
        params,
        covariance,
        iterations,
        sse: cost,
        dof,
        termination,
    })
}

/// `(JᵀJ)⁻¹ · SSR / dof` via SVD of `J`.
///
/// With zero degrees of freedom the variance cannot be estimated and every
/// entry is `+∞`.
fn covariance_from_jacobian(jac: &DMatrix<f64>, sse: f64, dof: usize) -> Result<DMatrix<f64>, LmError> {
    let (n, p) = jac.shape();
    let svd = jac.clone().svd(false, true);
    let v_t = svd.v_t.ok_or(LmError::SingularCovariance)?;
    let s = &svd.singular_values;

    let s_max = s.iter().cloned().fold(0.0, f64::max);
    let threshold = f64::EPSILON * n.max(p) as f64 * s_max;
    if s_max <= 0.0 || s.iter().any(|&v| v <= threshold) {
        return Err(LmError::SingularCovariance);
    }

    if dof == 0 {
        log::warn!("No degrees of freedom left; parameter covariance is undefined");
        return Ok(DMatrix::from_element(p, p, f64::INFINITY));
    }

    let mut inv_s2 = DMatrix::zeros(s.len(), s.len());
    for (i, &v) in s.iter().enumerate() {
        inv_s2[(i, i)] = 1.0 / (v * v);
    }
    let unscaled = v_t.transpose() * inv_s2 * &v_t;
    Ok(unscaled * (sse / dof as f64))
}

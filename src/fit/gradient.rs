//! Local quasi-Newton refinement: L-BFGS with More-Thuente line search.
//!
//! The model's error function is bridged into an argmin problem; gradients
//! come from central finite differences of the objective. Bounds are not
//! enforced in this mode, and the objective is only piecewise-smooth, so a
//! failed line search is a normal outcome and maps to an optimization error
//! instead of a partial result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use argmin::core::{CostFunction, Error, Executor, Gradient, State};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use finitediff::FiniteDiff;

use crate::error::AppError;
use crate::fit::{FitOptions, FitOutcome, Fittable};

/// L-BFGS history length.
const LBFGS_MEMORY: usize = 7;

/// Bridges a `Fittable` to argmin's `CostFunction`/`Gradient`, counting
/// every objective evaluation (finite-difference probes included).
struct Objective<'a, F> {
    model: &'a F,
    evaluations: Arc<AtomicU64>,
}

impl<F: Fittable> CostFunction for Objective<'_, F> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, Error> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        Ok(self.model.error(params))
    }
}

impl<F: Fittable> Gradient for Objective<'_, F> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, params: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(params.central_diff(&|x: &Vec<f64>| {
            self.evaluations.fetch_add(1, Ordering::Relaxed);
            self.model.error(x)
        }))
    }
}

/// Minimize from the model's initial guess, unconstrained.
pub fn minimize<F: Fittable>(model: &F, options: &FitOptions) -> Result<FitOutcome, AppError> {
    let x0 = model.initial_guess();
    let evaluations = Arc::new(AtomicU64::new(0));
    let objective = Objective {
        model,
        evaluations: Arc::clone(&evaluations),
    };

    let linesearch = MoreThuenteLineSearch::new();
    let solver = LBFGS::new(linesearch, LBFGS_MEMORY);
    let max_iters = options.max_iters;

    let result = Executor::new(objective, solver)
        .configure(|state| state.param(x0).max_iters(max_iters))
        .run()
        .map_err(|e| AppError::new(4, format!("L-BFGS failed: {e}")))?;

    let mut state = result.state().clone();
    let iterations = state.get_iter();
    let value = state.get_best_cost();
    let params = state
        .take_best_param()
        .ok_or_else(|| AppError::new(4, "L-BFGS produced no parameter vector."))?;

    if !value.is_finite() {
        return Err(AppError::new(
            4,
            format!("L-BFGS best cost is not finite ({value})."),
        ));
    }

    Ok(FitOutcome {
        params,
        value,
        iterations,
        evaluations: evaluations.load(Ordering::Relaxed),
    })
}

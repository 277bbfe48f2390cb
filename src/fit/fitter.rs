//! Optimizer dispatch for a single branch fit.
//!
//! Given a model exposing:
//! - an objective `error(params)` (root-mean-square residual)
//! - an initial guess
//! - per-parameter bounds
//!
//! we run the selected optimizer and commit the winning parameter vector
//! into the model exactly once. Candidate evaluation never mutates the
//! model, so the committed breakpoints always correspond to the returned
//! winner, not to whatever the optimizer evaluated last.

use crate::domain::{FitQuality, OptimizerKind};
use crate::error::AppError;
use crate::fit::{evolution, gradient};
use crate::models::TangentModel;

/// Capability interface for anything the fitter can optimize.
///
/// `error` must be pure and deterministic for a given parameter vector;
/// `initial_guess` and `bounds` must agree on length.
pub trait Fittable {
    /// Objective value at a candidate parameter vector (lower is better).
    fn error(&self, params: &[f64]) -> f64;
    /// Starting point for local search; also seeds the evolution population.
    fn initial_guess(&self) -> Vec<f64>;
    /// Per-parameter bounds, hard-enforced by the evolution optimizer only.
    fn bounds(&self) -> Vec<(f64, f64)>;
}

/// Optimizer selection and budgets for one branch fit.
#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    pub optimizer: OptimizerKind,
    /// Seed for the evolution optimizer's random stream.
    pub seed: u64,
    /// Evolution population size (members, not a dimension multiplier).
    pub population: usize,
    /// Evolution generation cap.
    pub generations: u64,
    /// Relative convergence tolerance for evolution; `0` disables early stop.
    pub tol: f64,
    /// Iteration cap for the gradient optimizer.
    pub max_iters: u64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            optimizer: OptimizerKind::Evolution,
            seed: 0,
            population: 100,
            generations: 100,
            tol: 0.01,
            max_iters: 200,
        }
    }
}

/// Raw optimizer result, before any commit.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub params: Vec<f64>,
    /// Objective value at `params`.
    pub value: f64,
    /// Iterations (generations for evolution) actually run.
    pub iterations: u64,
    /// Objective evaluations, including finite-difference probes.
    pub evaluations: u64,
}

/// Minimize a `Fittable`'s error with the selected optimizer.
pub fn fit<F: Fittable + Sync>(model: &F, options: &FitOptions) -> Result<FitOutcome, AppError> {
    let outcome = match options.optimizer {
        OptimizerKind::Evolution => evolution::minimize(model, options)?,
        OptimizerKind::Gradient => gradient::minimize(model, options)?,
    };
    if !outcome.value.is_finite() {
        return Err(AppError::new(
            4,
            format!(
                "{} produced a non-finite objective ({}).",
                options.optimizer.display_name(),
                outcome.value
            ),
        ));
    }
    Ok(outcome)
}

/// A tangent model with its winning parameters committed.
#[derive(Debug, Clone)]
pub struct FittedTangent {
    pub model: TangentModel,
    pub params: Vec<f64>,
    pub quality: FitQuality,
}

/// Fit a tangent model and commit the winner exactly once.
pub fn fit_tangent(mut model: TangentModel, options: &FitOptions) -> Result<FittedTangent, AppError> {
    let outcome = fit(&model, options)?;
    model.update(&outcome.params);
    let quality = FitQuality {
        rmse: outcome.value,
        n: model.sample_count(),
        iterations: outcome.iterations,
        evaluations: outcome.evaluations,
    };
    Ok(FittedTangent {
        model,
        params: outcome.params,
        quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Branch, Breakpoint, RawSeries};
    use crate::models::tangent_value;

    const TRUE_PARAMS: [f64; 6] = [70.0, 25.0, 0.062, 0.058, 0.012, 0.008];

    fn noiseless_heating_series() -> RawSeries {
        let bp = [
            Breakpoint {
                temperature: 20.0,
                strain: 0.062,
            },
            Breakpoint {
                temperature: 70.0,
                strain: 0.058,
            },
            Breakpoint {
                temperature: 95.0,
                strain: 0.012,
            },
            Breakpoint {
                temperature: 140.0,
                strain: 0.008,
            },
        ];
        let mut series = RawSeries::default();
        for i in 0..25 {
            let t = 20.0 + 5.0 * i as f64;
            series.temperature.push(t);
            series.strain.push(tangent_value(&bp, t));
            series.stress.push(50.0);
        }
        series
    }

    fn heating_model() -> TangentModel {
        TangentModel::make(Branch::Austenite, &noiseless_heating_series()).unwrap()
    }

    #[test]
    fn evolution_recovers_known_configuration() {
        let options = FitOptions {
            optimizer: OptimizerKind::Evolution,
            seed: 11,
            population: 90,
            generations: 600,
            tol: 0.0,
            max_iters: 200,
        };
        let fitted = fit_tangent(heating_model(), &options).unwrap();

        // Recovered parameters within 1% of each bound's range.
        let bounds = fitted.model.bounds();
        for (i, ((lo, hi), truth)) in bounds.iter().zip(TRUE_PARAMS.iter()).enumerate() {
            let tol = 0.01 * (hi - lo);
            let got = fitted.params[i];
            assert!(
                (got - truth).abs() <= tol,
                "param {i}: expected {truth} +/- {tol}, got {got}"
            );
        }

        assert!(fitted.quality.rmse < 1e-3, "rmse {}", fitted.quality.rmse);
        assert_eq!(fitted.quality.n, 25);
        assert!(fitted.quality.evaluations > 0);
    }

    #[test]
    fn committed_breakpoints_match_winning_params() {
        let options = FitOptions {
            optimizer: OptimizerKind::Evolution,
            seed: 3,
            population: 20,
            generations: 30,
            tol: 0.0,
            max_iters: 200,
        };
        let fitted = fit_tangent(heating_model(), &options).unwrap();
        assert_eq!(
            *fitted.model.breakpoints(),
            fitted.model.breakpoints_at(&fitted.params)
        );
    }

    #[test]
    fn evolution_fit_is_reproducible() {
        let options = FitOptions {
            optimizer: OptimizerKind::Evolution,
            seed: 42,
            population: 30,
            generations: 50,
            tol: 0.0,
            max_iters: 200,
        };
        let a = fit_tangent(heating_model(), &options).unwrap();
        let b = fit_tangent(heating_model(), &options).unwrap();
        assert_eq!(a.params, b.params);
        assert_eq!(a.quality.rmse, b.quality.rmse);
        assert_eq!(a.quality.evaluations, b.quality.evaluations);
    }

    #[test]
    fn rejects_undersized_population() {
        let options = FitOptions {
            population: 3,
            ..FitOptions::default()
        };
        let err = fit_tangent(heating_model(), &options).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn gradient_mode_refines_or_fails_cleanly() {
        // The objective is only piecewise-smooth, so the line search may give
        // up; that must surface as an optimization error, never as a silent
        // partial result.
        let options = FitOptions {
            optimizer: OptimizerKind::Gradient,
            max_iters: 50,
            ..FitOptions::default()
        };
        let baseline = heating_model().error(&heating_model().initial_guess());
        match fit_tangent(heating_model(), &options) {
            Ok(fitted) => {
                assert!(fitted.quality.rmse <= baseline + 1e-9);
                assert_eq!(
                    *fitted.model.breakpoints(),
                    fitted.model.breakpoints_at(&fitted.params)
                );
            }
            Err(err) => assert_eq!(err.exit_code(), 4),
        }
    }
}

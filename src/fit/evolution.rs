//! Bounded global search: seeded differential evolution (rand/1/bin).
//!
//! Mutation picks three distinct partners per member, crossover is binomial
//! with one forced dimension, and every trial is clamped back into the
//! bounds, so the search can never leave the feasible box. Trial evaluation
//! within a generation runs on rayon; everything that consumes randomness is
//! sequential, so a given seed reproduces the run bit-for-bit regardless of
//! thread scheduling.

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::error::AppError;
use crate::fit::{FitOptions, FitOutcome, Fittable};

/// Per-dimension crossover probability.
const CROSSOVER_RATE: f64 = 0.7;
/// Differential weight is dithered per generation over this half-open range.
const WEIGHT_RANGE: (f64, f64) = (0.5, 1.0);

/// Minimize over the bounded box with differential evolution.
///
/// Early stop when the population's cost spread falls under
/// `tol * |mean cost|`; `tol = 0` disables the test and the full generation
/// budget runs.
pub fn minimize<F: Fittable + Sync>(
    model: &F,
    options: &FitOptions,
) -> Result<FitOutcome, AppError> {
    let bounds = model.bounds();
    let dim = bounds.len();
    if options.population < 4 {
        return Err(AppError::new(
            2,
            format!(
                "Evolution population must be at least 4, got {}.",
                options.population
            ),
        ));
    }
    for (i, (lo, hi)) in bounds.iter().enumerate() {
        if !(lo.is_finite() && hi.is_finite() && hi >= lo) {
            return Err(AppError::new(
                2,
                format!("Invalid bound [{lo}, {hi}] for parameter {i}."),
            ));
        }
    }

    let mut rng = StdRng::seed_from_u64(options.seed);

    // Initial population: uniform in bounds, member 0 pinned to the model's
    // own guess so the bound midpoint is always represented.
    let mut members: Vec<Vec<f64>> = (0..options.population)
        .map(|_| random_member(&mut rng, &bounds))
        .collect();
    members[0] = clamped(model.initial_guess(), &bounds);

    let mut costs: Vec<f64> = members
        .par_iter()
        .map(|m| sanitize(model.error(m)))
        .collect();
    let mut evaluations = options.population as u64;
    let mut generations_run = 0u64;

    for _ in 0..options.generations {
        let weight = rng.gen_range(WEIGHT_RANGE.0..WEIGHT_RANGE.1);

        // Build all trials with the sequential rng before evaluating them in
        // parallel; selection below is index-ordered.
        let trials: Vec<Vec<f64>> = (0..options.population)
            .map(|i| make_trial(&mut rng, &members, i, weight, &bounds, dim))
            .collect();
        let trial_costs: Vec<f64> = trials
            .par_iter()
            .map(|t| sanitize(model.error(t)))
            .collect();
        evaluations += options.population as u64;

        for i in 0..options.population {
            if trial_costs[i] <= costs[i] {
                members[i] = trials[i].clone();
                costs[i] = trial_costs[i];
            }
        }
        generations_run += 1;

        if options.tol > 0.0 && converged(&costs, options.tol) {
            break;
        }
    }

    let best = best_index(&costs);
    Ok(FitOutcome {
        params: members[best].clone(),
        value: costs[best],
        iterations: generations_run,
        evaluations,
    })
}

/// rand/1/bin trial for member `target`: mutant `a + F*(b - c)` crossed
/// binomially with the target, one dimension forced from the mutant.
fn make_trial(
    rng: &mut StdRng,
    members: &[Vec<f64>],
    target: usize,
    weight: f64,
    bounds: &[(f64, f64)],
    dim: usize,
) -> Vec<f64> {
    let [a, b, c] = distinct_partners(rng, members.len(), target);
    let forced = rng.gen_range(0..dim);

    let mut trial = Vec::with_capacity(dim);
    for j in 0..dim {
        let roll: f64 = rng.r#gen();
        let value = if roll < CROSSOVER_RATE || j == forced {
            members[a][j] + weight * (members[b][j] - members[c][j])
        } else {
            members[target][j]
        };
        trial.push(clamp(value, bounds[j]));
    }
    trial
}

/// Three distinct member indices, all different from `skip`.
fn distinct_partners(rng: &mut StdRng, population: usize, skip: usize) -> [usize; 3] {
    let mut picks = [0usize; 3];
    let mut filled = 0;
    while filled < 3 {
        let cand = rng.gen_range(0..population);
        if cand == skip || picks[..filled].contains(&cand) {
            continue;
        }
        picks[filled] = cand;
        filled += 1;
    }
    picks
}

fn random_member(rng: &mut StdRng, bounds: &[(f64, f64)]) -> Vec<f64> {
    bounds
        .iter()
        .map(|&(lo, hi)| if hi > lo { rng.gen_range(lo..=hi) } else { lo })
        .collect()
}

fn clamped(mut params: Vec<f64>, bounds: &[(f64, f64)]) -> Vec<f64> {
    for (v, &b) in params.iter_mut().zip(bounds) {
        *v = clamp(*v, b);
    }
    params
}

fn clamp(value: f64, (lo, hi): (f64, f64)) -> f64 {
    value.max(lo).min(hi)
}

/// NaN objectives count as +inf so a degenerate candidate can never win.
fn sanitize(value: f64) -> f64 {
    if value.is_nan() { f64::INFINITY } else { value }
}

/// Lowest cost; ties go to the lowest index.
fn best_index(costs: &[f64]) -> usize {
    let mut best = 0;
    for (i, &c) in costs.iter().enumerate() {
        if c < costs[best] {
            best = i;
        }
    }
    best
}

/// Population cost spread relative to its mean, scipy-style:
/// `std(costs) <= tol * |mean(costs)|`.
fn converged(costs: &[f64], tol: f64) -> bool {
    if costs.iter().any(|c| !c.is_finite()) {
        return false;
    }
    let n = costs.len() as f64;
    let mean = costs.iter().sum::<f64>() / n;
    let var = costs.iter().map(|c| (c - mean) * (c - mean)).sum::<f64>() / n;
    var.sqrt() <= tol * mean.abs()
}

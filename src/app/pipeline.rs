//! Shared calibration pipeline behind the `fit` and `demo` subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> peak segmentation -> per-branch tangent fit -> residuals
//!
//! The CLI front-end can then focus on presentation (report, plot,
//! exports).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::data::{PeakInfo, SegmentedSeries, generate_demo, segment};
use crate::domain::{Branch, BranchResult, CalibrationConfig, RawSeries};
use crate::error::AppError;
use crate::fit::{FitOptions, fit_tangent};
use crate::io::ingest::{IngestedSeries, from_series, read_series};
use crate::models::TangentModel;

/// All computed outputs of a single calibration run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedSeries,
    pub peak: PeakInfo,
    pub results: Vec<BranchResult>,
    /// Branches that were requested but could not be fitted, with the reason.
    pub skipped: Vec<(Branch, String)>,
}

/// Execute the full calibration pipeline and return the computed outputs.
pub fn run_calibration(config: &CalibrationConfig) -> Result<RunOutput, AppError> {
    // 1) Obtain a raw sweep: a measured file, or a synthetic demo cycle.
    let ingest = match &config.input {
        Some(path) => read_series(path)?,
        None => from_series(generate_demo(config)?, "synthetic demo cycle")?,
    };

    run_with_series(config, ingest)
}

/// Execute the calibration pipeline on an already-ingested sweep.
///
/// This is useful for callers that parse or synthesize the data themselves.
pub fn run_with_series(
    config: &CalibrationConfig,
    ingest: IngestedSeries,
) -> Result<RunOutput, AppError> {
    // 2) Split the sweep at the first occurrence of the temperature maximum.
    let segmented = segment(&ingest.series, config.driven)?;

    // 3) Fit every requested branch. The branches are independent, so a
    //    two-branch run fits them in parallel.
    let branches = config.branch_spec.branches();
    let outcomes: Vec<(Branch, Result<BranchResult, AppError>)> = match branches[..] {
        [first, second] => {
            let (a, b) = rayon::join(
                || fit_branch(first, &segmented, config),
                || fit_branch(second, &segmented, config),
            );
            vec![(first, a), (second, b)]
        }
        _ => branches
            .iter()
            .map(|&branch| (branch, fit_branch(branch, &segmented, config)))
            .collect(),
    };

    // 4) A branch that fails to fit is reported and skipped. Configuration
    //    errors abort the whole run, as does losing every branch.
    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for (branch, outcome) in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) if e.exit_code() == 2 => return Err(e),
            Err(e) => skipped.push((branch, e.to_string())),
        }
    }
    if results.is_empty() {
        let reasons = skipped
            .iter()
            .map(|(branch, reason)| format!("{}: {}", branch.display_name(), reason))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::new(
            4,
            format!("No branch could be fitted ({reasons})."),
        ));
    }

    Ok(RunOutput {
        ingest,
        peak: segmented.peak,
        results,
        skipped,
    })
}

/// Calibrate the tangent model on one branch of a segmented sweep.
fn fit_branch(
    branch: Branch,
    segmented: &SegmentedSeries,
    config: &CalibrationConfig,
) -> Result<BranchResult, AppError> {
    let series = segmented.branch(branch);
    let model = TangentModel::make(branch, series)?
        .with_temperature_bounds(config.t2_bounds, config.span_bounds)?;

    let options = FitOptions {
        optimizer: config.optimizer,
        seed: branch_seed(config, branch, series),
        population: config.population,
        generations: config.generations,
        tol: config.de_tol,
        max_iters: config.max_iters,
    };
    let fitted = fit_tangent(model, &options)?;

    let samples = crate::report::compute_samples(series, fitted.model.breakpoints())?;
    Ok(BranchResult {
        branch,
        params: fitted.params,
        breakpoints: *fitted.model.breakpoints(),
        summary: fitted.model.summary(),
        quality: fitted.quality,
        samples,
    })
}

/// Deterministic per-branch seed.
///
/// Mixes the run seed with the branch and its temperature column, so the
/// two branches draw distinct random streams while repeated runs on the
/// same input reproduce bit-for-bit.
fn branch_seed(config: &CalibrationConfig, branch: Branch, series: &RawSeries) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    branch.hash(&mut hasher);
    series.len().hash(&mut hasher);
    for &t in &series.temperature {
        t.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

//! Export per-sample results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::BranchResult;
use crate::error::AppError;

/// Write per-sample fit results of every branch to a CSV file.
pub fn write_results_csv(path: &Path, results: &[BranchResult]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })?;

    writeln!(
        file,
        "branch,temperature_c,stress_mpa,strain_obs,strain_fit,residual"
    )
    .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;

    for result in results {
        let branch = result.branch.display_name().to_lowercase();
        for s in &result.samples {
            writeln!(
                file,
                "{},{:.4},{:.4},{:.8},{:.8},{:.8}",
                branch, s.temperature, s.stress, s.strain_obs, s.strain_fit, s.residual,
            )
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
        }
    }

    Ok(())
}

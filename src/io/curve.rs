//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a calibration run:
//! - per-branch parameters, breakpoints and transformation summary
//! - fit quality diagnostics
//! - a precomputed strain grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Local;

use crate::domain::{BranchCurve, BranchResult, Breakpoint, CurveFile, CurveGrid, OptimizerKind};
use crate::error::AppError;
use crate::models::tangent_value;

/// Write a curve JSON file for the fitted branches.
pub fn write_curve_json(
    path: &Path,
    results: &[BranchResult],
    optimizer: OptimizerKind,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create curve JSON '{}': {e}", path.display()),
        )
    })?;

    let branches = results
        .iter()
        .map(|r| BranchCurve {
            branch: r.branch,
            params: r.params.clone(),
            breakpoints: r.breakpoints,
            summary: r.summary,
            quality: r.quality.clone(),
            grid: build_grid(&r.breakpoints, 101),
        })
        .collect();

    let curve = CurveFile {
        tool: "sma".to_string(),
        generated: Local::now().to_rfc3339(),
        optimizer,
        branches,
    };

    serde_json::to_writer_pretty(file, &curve)
        .map_err(|e| AppError::new(4, format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open curve JSON '{}': {e}", path.display()),
        )
    })?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}

/// Sample the tangent model on an even temperature grid over T_1..T_4.
pub fn build_grid(bp: &[Breakpoint; 4], n: usize) -> CurveGrid {
    let n = n.max(2);
    let mut t0 = bp[0].temperature;
    let mut t1 = bp[3].temperature;
    if !(t0.is_finite() && t1.is_finite()) || t1 <= t0 {
        t0 = 0.0;
        t1 = 100.0;
    }
    if (t1 - t0).abs() < 1e-9 {
        t0 -= 0.5;
        t1 += 0.5;
    }

    let mut temperature = Vec::with_capacity(n);
    let mut strain = Vec::with_capacity(n);

    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let t = t0 + u * (t1 - t0);
        temperature.push(t);
        strain.push(tangent_value(bp, t));
    }

    CurveGrid {
        temperature,
        strain,
    }
}

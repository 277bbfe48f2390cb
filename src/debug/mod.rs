//! Debug bundle writer for inspecting a calibration run end to end.

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::data::segment::PeakInfo;
use crate::domain::{Branch, BranchResult, CalibrationConfig};
use crate::error::AppError;
use crate::io::ingest::IngestedSeries;

/// Write a markdown bundle under `debug/` with the full run state:
/// config, ingest stats, segmentation and every branch's fit detail.
pub fn write_debug_bundle(
    ingest: &IngestedSeries,
    peak: &PeakInfo,
    results: &[BranchResult],
    skipped: &[(Branch, String)],
    config: &CalibrationConfig,
) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let seed = match config.seed {
        Some(s) => s.to_string(),
        None => "auto".to_string(),
    };
    let path = dir.join(format!("sma_debug_seed{seed}_{ts}.md"));

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;

    writeln!(file, "# sma debug bundle")
        .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    writeln!(file, "- generated: {}", Local::now().to_rfc3339())
        .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    writeln!(file, "- input: {}", ingest.source)
        .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    writeln!(file, "- optimizer: {}", config.optimizer.display_name())
        .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    writeln!(file, "- seed: {seed}")
        .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    writeln!(
        file,
        "- evolution: population={}, generations={}, tol={}",
        config.population, config.generations, config.de_tol
    )
    .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    writeln!(
        file,
        "- bounds: t2=[{:.2}, {:.2}], span=[{:.2}, {:.2}]",
        config.t2_bounds.0, config.t2_bounds.1, config.span_bounds.0, config.span_bounds.1
    )
    .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    writeln!(
        file,
        "- rows: read={} used={} bad={}",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    )
    .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;

    writeln!(file, "\n## Sweep")
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(
        file,
        "- T=[{:.3}, {:.3}] degC | strain=[{:.5}, {:.5}]",
        ingest.stats.temp_min, ingest.stats.temp_max, ingest.stats.strain_min, ingest.stats.strain_max
    )
    .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(
        file,
        "- peak: {:.3} degC at sample {}",
        peak.temperature, peak.index
    )
    .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    for bad in &ingest.row_errors {
        writeln!(file, "- bad row (line {}): {}", bad.line, bad.message)
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    }

    for r in results {
        writeln!(
            file,
            "\n## {} ({})",
            r.branch.display_name(),
            r.branch.sweep_name()
        )
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        writeln!(file, "- params: {}", fmt_vec(&r.params))
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        writeln!(
            file,
            "- {}={:.3} degC, {}={:.3} degC",
            r.branch.onset_label(),
            r.summary.onset,
            r.branch.finish_label(),
            r.summary.finish
        )
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        writeln!(
            file,
            "- quality: rmse={:.8}, n={}, iterations={}, evaluations={}",
            r.quality.rmse, r.quality.n, r.quality.iterations, r.quality.evaluations
        )
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;

        writeln!(file, "\n### Breakpoints")
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        writeln!(file, "| temperature | strain |")
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        writeln!(file, "| - | - |")
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        for b in &r.breakpoints {
            writeln!(file, "| {:.3} | {:.6} |", b.temperature, b.strain)
                .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        }

        writeln!(file, "\n### Samples")
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        writeln!(file, "| temperature | stress | strain_obs | strain_fit | residual |")
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        writeln!(file, "| - | - | - | - | - |")
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        for s in &r.samples {
            writeln!(
                file,
                "| {:.3} | {:.3} | {:.6} | {:.6} | {:.6} |",
                s.temperature, s.stress, s.strain_obs, s.strain_fit, s.residual
            )
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
        }
    }

    for (branch, reason) in skipped {
        writeln!(file, "\n- skipped {}: {}", branch.display_name(), reason)
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    }

    Ok(path)
}

fn fmt_vec(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

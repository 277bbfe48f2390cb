//! Reporting utilities: per-sample residuals and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::data::segment::PeakInfo;
use crate::domain::{
    Branch, BranchResult, Breakpoint, CalibrationConfig, OptimizerKind, RawSeries, SampleFit,
};
use crate::error::AppError;
use crate::io::ingest::IngestedSeries;
use crate::models::tangent_value;

/// Compute fitted values and residuals for each sample of one branch.
pub fn compute_samples(
    series: &RawSeries,
    bp: &[Breakpoint; 4],
) -> Result<Vec<SampleFit>, AppError> {
    let mut out = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        let strain_fit = tangent_value(bp, series.temperature[i]);
        if !strain_fit.is_finite() {
            return Err(AppError::new(
                4,
                "Non-finite model prediction during residual computation.",
            ));
        }
        out.push(SampleFit {
            temperature: series.temperature[i],
            stress: series.stress[i],
            strain_obs: series.strain[i],
            strain_fit,
            residual: series.strain[i] - strain_fit,
        });
    }
    Ok(out)
}

/// Format the full run summary (dataset stats + per-branch diagnostics).
pub fn format_run_summary(
    ingest: &IngestedSeries,
    peak: &PeakInfo,
    results: &[BranchResult],
    skipped: &[(Branch, String)],
    config: &CalibrationConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== sma - Transformation Calibration (tangent model) ===\n");
    out.push_str(&format!("Input: {}\n", ingest.source));
    out.push_str(&format!(
        "Rows: read={} | used={} | bad={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    for e in ingest.row_errors.iter().take(5) {
        out.push_str(&format!("  (line {}) {}\n", e.line, e.message));
    }
    if ingest.row_errors.len() > 5 {
        out.push_str(&format!(
            "  ... and {} more bad rows\n",
            ingest.row_errors.len() - 5
        ));
    }

    out.push_str(&format!(
        "Sweep: T=[{:.2}, {:.2}] degC | strain=[{:.4}, {:.4}]\n",
        ingest.stats.temp_min, ingest.stats.temp_max, ingest.stats.strain_min, ingest.stats.strain_max
    ));
    out.push_str(&format!(
        "Peak: {:.2} degC at sample {}\n",
        peak.temperature, peak.index
    ));
    out.push_str(&format!("Optimizer: {}\n", fmt_optimizer(config)));

    for r in results {
        out.push_str(&format!(
            "\n{} ({}):\n",
            r.branch.display_name(),
            r.branch.sweep_name()
        ));
        out.push_str(&format!(
            "- {}={:.2} degC | {}={:.2} degC\n",
            r.branch.onset_label(),
            r.summary.onset,
            r.branch.finish_label(),
            r.summary.finish
        ));
        out.push_str(&format!(
            "- t2={:.2} degC | span={:.2} degC (T3={:.2} degC)\n",
            r.params[0],
            r.params[1],
            r.params[0] + r.params[1]
        ));
        out.push_str(&format!("- breakpoints: {}\n", fmt_breakpoints(&r.breakpoints)));
        out.push_str(&format!(
            "- RMSE={:.6} | n={} | iters={} | evals={}\n",
            r.quality.rmse, r.quality.n, r.quality.iterations, r.quality.evaluations
        ));
    }

    for (branch, reason) in skipped {
        out.push_str(&format!("\n  (skipped {}) {reason}\n", branch.display_name()));
    }

    out.push('\n');
    out
}

fn fmt_optimizer(config: &CalibrationConfig) -> String {
    let seed = match config.seed {
        Some(s) => format!("seed={s}"),
        None => "seed=auto".to_string(),
    };
    match config.optimizer {
        OptimizerKind::Evolution => format!(
            "{} (population={}, generations={}, {seed})",
            config.optimizer.display_name(),
            config.population,
            config.generations
        ),
        OptimizerKind::Gradient => format!(
            "{} (max_iters={})",
            config.optimizer.display_name(),
            config.max_iters
        ),
    }
}

fn fmt_breakpoints(bp: &[Breakpoint; 4]) -> String {
    let parts: Vec<String> = bp
        .iter()
        .map(|b| format!("({:.2}, {:.5})", b.temperature, b.strain))
        .collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BranchSpec, DrivenBy, FitQuality, TransformSummary};
    use crate::io::ingest::from_series;

    fn flat_breakpoints() -> [Breakpoint; 4] {
        [
            Breakpoint {
                temperature: 0.0,
                strain: 0.05,
            },
            Breakpoint {
                temperature: 3.0,
                strain: 0.05,
            },
            Breakpoint {
                temperature: 6.0,
                strain: 0.05,
            },
            Breakpoint {
                temperature: 9.0,
                strain: 0.05,
            },
        ]
    }

    #[test]
    fn compute_samples_basic() {
        let series = RawSeries {
            temperature: vec![0.0, 9.0],
            strain: vec![0.05, 0.06],
            stress: vec![50.0, 51.0],
        };
        let samples = compute_samples(&series, &flat_breakpoints()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].strain_fit, 0.05);
        assert!((samples[0].residual - 0.0).abs() < 1e-12);
        assert!((samples[1].residual - 0.01).abs() < 1e-12);
        assert_eq!(samples[1].stress, 51.0);
    }

    #[test]
    fn summary_names_the_transformation_temperatures() {
        let series = RawSeries {
            temperature: vec![0.0, 9.0, 4.0],
            strain: vec![0.05, 0.06, 0.055],
            stress: vec![50.0; 3],
        };
        let ingest = from_series(series, "demo").unwrap();
        let peak = PeakInfo {
            index: 1,
            temperature: 9.0,
        };
        let result = BranchResult {
            branch: Branch::Austenite,
            params: vec![3.0, 3.0, 0.05, 0.05, 0.05, 0.05],
            breakpoints: flat_breakpoints(),
            summary: TransformSummary {
                branch: Branch::Austenite,
                onset: 0.0,
                finish: 9.0,
            },
            quality: FitQuality {
                rmse: 0.001,
                n: 2,
                iterations: 10,
                evaluations: 110,
            },
            samples: Vec::new(),
        };
        let config = CalibrationConfig {
            input: None,
            driven: DrivenBy::Temperature,
            branch_spec: BranchSpec::Both,
            optimizer: OptimizerKind::Evolution,
            seed: Some(7),
            population: 100,
            generations: 200,
            de_tol: 0.01,
            max_iters: 200,
            t2_bounds: (30.0, 120.0),
            span_bounds: (10.0, 60.0),
            sample_count: 40,
            noise_sigma: 0.0,
            plot: false,
            plot_width: 72,
            plot_height: 20,
            export_results: None,
            export_curve: None,
            debug_bundle: false,
        };

        let text = format_run_summary(
            &ingest,
            &peak,
            &[result],
            &[(Branch::Martensite, "Martensite branch has no samples.".to_string())],
            &config,
        );

        assert!(text.contains("Input: demo"));
        assert!(text.contains("Peak: 9.00 degC at sample 1"));
        assert!(text.contains("Austenite (heating):"));
        assert!(text.contains("As=0.00 degC | Af=9.00 degC"));
        assert!(text.contains("t2=3.00 degC | span=3.00 degC (T3=6.00 degC)"));
        assert!(text.contains("population=100, generations=200, seed=7"));
        assert!(text.contains("(skipped Martensite)"));
    }
}

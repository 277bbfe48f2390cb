//! Command-line parsing for the transformation-temperature calibrator.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/fitting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{BranchSpec, DrivenBy, OptimizerKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "sma",
    version,
    about = "SMA transformation-temperature calibration (tangent model)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calibrate both branches from a measurement table, print the summary,
    /// and optionally plot/export.
    Fit(FitArgs),
    /// Calibrate a built-in synthetic heating/cooling cycle.
    ///
    /// Uses the same pipeline as `sma fit` on generated data, so the tool
    /// runs end to end without a measurement file.
    Demo(FitArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
}

/// Common options for fitting measured or synthetic sweeps.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Measurement table (CSV/TSV/semicolon/whitespace) with temperature,
    /// strain and stress columns. Required by `fit`, rejected by `demo`.
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Sweep variable the cycle is driven by.
    #[arg(long, value_enum, default_value_t = DrivenBy::Temperature)]
    pub driven: DrivenBy,

    /// Which transformation branch(es) to calibrate.
    #[arg(short = 'b', long, value_enum, default_value_t = BranchSpec::Both)]
    pub branch: BranchSpec,

    /// Optimizer for the tangent-model fit.
    #[arg(long, value_enum, default_value_t = OptimizerKind::Evolution)]
    pub optimizer: OptimizerKind,

    /// Random seed (derived from the configuration and data when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Evolution population size.
    #[arg(long, default_value_t = 100)]
    pub population: usize,

    /// Evolution generation cap.
    #[arg(long, default_value_t = 100)]
    pub generations: u64,

    /// Evolution convergence tolerance (relative cost spread; 0 disables).
    #[arg(long, default_value_t = 0.01)]
    pub de_tol: f64,

    /// Iteration cap for the gradient optimizer.
    #[arg(long, default_value_t = 200)]
    pub max_iters: u64,

    /// Lower bound for the second breakpoint temperature (degC).
    #[arg(long, default_value_t = 30.0)]
    pub t2_min: f64,

    /// Upper bound for the second breakpoint temperature (degC).
    #[arg(long, default_value_t = 120.0)]
    pub t2_max: f64,

    /// Lower bound for the T_2..T_4 span (degC).
    #[arg(long, default_value_t = 10.0)]
    pub span_min: f64,

    /// Upper bound for the T_2..T_4 span (degC).
    #[arg(long, default_value_t = 60.0)]
    pub span_max: f64,

    /// Number of demo samples to generate (demo mode only).
    #[arg(short = 'n', long, default_value_t = 40)]
    pub samples: usize,

    /// Gaussian strain noise sigma for demo data.
    #[arg(long, default_value_t = 0.002)]
    pub noise: f64,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export per-sample results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the fitted curves (params + breakpoints + grid) to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,

    /// Write a markdown debug bundle under debug/.
    #[arg(long = "debug-bundle")]
    pub debug_bundle: bool,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `sma fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

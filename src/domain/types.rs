//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Transformation branch of a thermal half-cycle.
///
/// A full measurement sweeps temperature up to a peak and back down. The
/// heating portion transforms the specimen toward austenite, the cooling
/// portion toward martensite. Each branch gets its own tangent-model fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Austenite,
    Martensite,
}

impl Branch {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Branch::Austenite => "Austenite",
            Branch::Martensite => "Martensite",
        }
    }

    /// Standard label of the transformation-start temperature.
    pub fn onset_label(self) -> &'static str {
        match self {
            Branch::Austenite => "As",
            Branch::Martensite => "Ms",
        }
    }

    /// Standard label of the transformation-finish temperature.
    pub fn finish_label(self) -> &'static str {
        match self {
            Branch::Austenite => "Af",
            Branch::Martensite => "Mf",
        }
    }

    /// Sweep direction this branch is measured on.
    pub fn sweep_name(self) -> &'static str {
        match self {
            Branch::Austenite => "heating",
            Branch::Martensite => "cooling",
        }
    }
}

/// Which optimizer drives the fit.
///
/// `Evolution` searches the full bounded parameter box and is the robust
/// default. `Gradient` is a fast local refinement from the bound midpoints;
/// it ignores bounds and may fail on the kinked objective, which surfaces as
/// an optimization error rather than a bad silent result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Evolution,
    Gradient,
}

impl OptimizerKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            OptimizerKind::Evolution => "differential evolution",
            OptimizerKind::Gradient => "L-BFGS",
        }
    }
}

/// Variable whose extremum splits the raw sweep into branches.
///
/// Only temperature-driven segmentation exists; `Stress` is accepted at the
/// CLI so the request can be rejected with a clear error instead of a parse
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DrivenBy {
    Temperature,
    Stress,
}

/// Which branches a run should fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BranchSpec {
    Both,
    Austenite,
    Martensite,
}

impl BranchSpec {
    pub fn branches(self) -> Vec<Branch> {
        match self {
            BranchSpec::Both => vec![Branch::Austenite, Branch::Martensite],
            BranchSpec::Austenite => vec![Branch::Austenite],
            BranchSpec::Martensite => vec![Branch::Martensite],
        }
    }
}

/// Raw measured sweep: three equal-length columns indexed by sample order.
///
/// Temperature is not monotonic across the whole series (it rises to a peak
/// and falls back); it is monotonic within each segmented branch.
#[derive(Debug, Clone, Default)]
pub struct RawSeries {
    pub temperature: Vec<f64>,
    pub strain: Vec<f64>,
    pub stress: Vec<f64>,
}

impl RawSeries {
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}

/// One fitted breakpoint of the tangent model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub temperature: f64,
    pub strain: f64,
}

/// Onset/finish temperatures derived from a fitted branch.
///
/// These are the fixed endpoint temperatures of the model (As/Af for
/// austenite, Ms/Mf for martensite), not the fitted interior breakpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransformSummary {
    pub branch: Branch,
    pub onset: f64,
    pub finish: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub rmse: f64,
    pub n: usize,
    pub iterations: u64,
    pub evaluations: u64,
}

/// Per-sample fit detail of one branch, for exports and debugging.
#[derive(Debug, Clone, Copy)]
pub struct SampleFit {
    pub temperature: f64,
    pub stress: f64,
    pub strain_obs: f64,
    pub strain_fit: f64,
    pub residual: f64,
}

/// Everything the pipeline produces for one fitted branch.
#[derive(Debug, Clone)]
pub struct BranchResult {
    pub branch: Branch,
    /// Winning parameter vector `[t2, span, strain_1..4]`.
    pub params: Vec<f64>,
    /// Committed breakpoints, ascending temperature.
    pub breakpoints: [Breakpoint; 4],
    pub summary: TransformSummary,
    pub quality: FitQuality,
    pub samples: Vec<SampleFit>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    /// Measurement table to read; `None` runs on synthetic demo data.
    pub input: Option<PathBuf>,
    pub driven: DrivenBy,
    pub branch_spec: BranchSpec,
    pub optimizer: OptimizerKind,

    /// Run seed; `None` derives one from the config + data.
    pub seed: Option<u64>,
    pub population: usize,
    pub generations: u64,
    /// Relative convergence tolerance for evolution; `0` disables early stop.
    pub de_tol: f64,
    /// Iteration cap for the gradient optimizer.
    pub max_iters: u64,

    /// Override for the second-breakpoint temperature bound.
    pub t2_bounds: (f64, f64),
    /// Override for the breakpoint-span bound.
    pub span_bounds: (f64, f64),

    /// Demo-data shape (ignored when `input` is set).
    pub sample_count: usize,
    pub noise_sigma: f64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
    pub debug_bundle: bool,
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated: String,
    pub optimizer: OptimizerKind,
    pub branches: Vec<BranchCurve>,
}

/// One fitted branch in a curve file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchCurve {
    pub branch: Branch,
    /// Winning parameter vector `[t2, span, strain_1..4]`.
    pub params: Vec<f64>,
    pub breakpoints: [Breakpoint; 4],
    pub summary: TransformSummary,
    pub quality: FitQuality,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub temperature: Vec<f64>,
    pub strain: Vec<f64>,
}

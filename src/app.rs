//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - reads a measurement table or generates the synthetic demo cycle
//! - segments the sweep and calibrates each branch
//! - prints the run summary and optional plot
//! - writes optional exports and debug bundles
//!
//! The calibration itself lives in [`pipeline`]; everything here is argument
//! handling and presentation.

use clap::Parser;

use crate::cli::{Command, FitArgs, PlotArgs};
use crate::domain::CalibrationConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `sma` binary.
pub fn run() -> Result<(), AppError> {
    // We want `sma` and `sma --seed 7` to behave like `sma demo ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    if args.input.is_none() {
        return Err(AppError::new(
            2,
            "The fit subcommand requires --input (use `sma demo` for synthetic data).",
        ));
    }
    run_and_report(&calibration_config_from_args(&args))
}

fn handle_demo(args: FitArgs) -> Result<(), AppError> {
    if args.input.is_some() {
        return Err(AppError::new(
            2,
            "The demo subcommand generates its own data; use `sma fit --input ...` for a file.",
        ));
    }
    run_and_report(&calibration_config_from_args(&args))
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

/// Run the calibration pipeline and print/write everything the config asks
/// for.
fn run_and_report(config: &CalibrationConfig) -> Result<(), AppError> {
    let run = pipeline::run_calibration(config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, &run.peak, &run.results, &run.skipped, config)
    );

    if config.plot {
        let plot =
            crate::plot::render_ascii_plot(&run.results, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.results)?;
    }
    if let Some(path) = &config.export_curve {
        crate::io::curve::write_curve_json(path, &run.results, config.optimizer)?;
    }
    if config.debug_bundle {
        let path =
            crate::debug::write_debug_bundle(&run.ingest, &run.peak, &run.results, &run.skipped, config)?;
        println!("Debug bundle: {}", path.display());
    }

    Ok(())
}

pub fn calibration_config_from_args(args: &FitArgs) -> CalibrationConfig {
    CalibrationConfig {
        input: args.input.clone(),
        driven: args.driven,
        branch_spec: args.branch,
        optimizer: args.optimizer,
        seed: args.seed,
        population: args.population,
        generations: args.generations,
        de_tol: args.de_tol,
        max_iters: args.max_iters,
        t2_bounds: (args.t2_min, args.t2_max),
        span_bounds: (args.span_min, args.span_max),
        sample_count: args.samples,
        noise_sigma: args.noise,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_curve: args.export_curve.clone(),
        debug_bundle: args.debug_bundle,
    }
}

/// Rewrite argv so `sma` defaults to `sma demo`.
///
/// Rules:
/// - `sma`                      -> `sma demo`
/// - `sma --seed 7 ...`         -> `sma demo --seed 7 ...`
/// - `sma --help/--version/-h`  -> unchanged (show top-level help/version)
/// - `sma fit/demo/plot ...`    -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("demo".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "demo" | "plot");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "demo flags".
    if arg1.starts_with('-') {
        argv.insert(1, "demo".to_string());
        return argv;
    }

    // Otherwise, leave as-is (clap will report the unknown subcommand).
    argv
}

//! Synthetic demo sweep generation.
//!
//! Builds a full thermal cycle from two known tangent-model configurations
//! (one per branch) so the tool runs end to end without a measurement file.
//! The cooling transformation sits at lower temperatures than the heating
//! one, giving the usual hysteresis loop.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Breakpoint, CalibrationConfig, RawSeries};
use crate::error::AppError;
use crate::models::tangent_value;

/// Temperature range of the demo cycle (degC).
pub const DEMO_TEMP_RANGE: (f64, f64) = (20.0, 140.0);
/// Nominal applied stress of the demo cycle (MPa).
pub const DEMO_STRESS_MPA: f64 = 50.0;
/// True heating-branch configuration `[t2, span, strain_1..4]`.
pub const DEMO_HEATING_PARAMS: [f64; 6] = [70.0, 25.0, 0.062, 0.058, 0.012, 0.008];
/// True cooling-branch configuration. Same strain plateaus, transformation
/// window shifted down by 25 degC.
pub const DEMO_COOLING_PARAMS: [f64; 6] = [45.0, 25.0, 0.062, 0.058, 0.012, 0.008];

/// Generate a seeded heating/cooling sweep of `config.sample_count` samples.
///
/// The heating ramp runs low-to-peak, the cooling ramp peak-to-low sharing
/// the single peak sample, so the peak temperature occurs exactly once.
/// Strain noise is `noise_sigma` times a standard normal draw; zero sigma
/// reproduces the model values exactly.
pub fn generate_demo(config: &CalibrationConfig) -> Result<RawSeries, AppError> {
    if config.sample_count < 8 {
        return Err(AppError::new(2, "Demo sample count must be >= 8."));
    }
    if !(config.noise_sigma.is_finite() && config.noise_sigma >= 0.0) {
        return Err(AppError::new(2, "Noise sigma must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(demo_seed(config));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let heating_bp = demo_breakpoints(&DEMO_HEATING_PARAMS);
    let cooling_bp = demo_breakpoints(&DEMO_COOLING_PARAMS);

    let (lo, hi) = DEMO_TEMP_RANGE;
    let ramp = config.sample_count.div_ceil(2);
    let step = (hi - lo) / (ramp - 1) as f64;

    let mut series = RawSeries::default();
    for i in 0..ramp {
        let t = lo + step * i as f64;
        push_sample(&mut series, t, &heating_bp, config.noise_sigma, &normal, &mut rng);
    }
    // Cooling reuses the peak sample, so start one step below it.
    for i in 1..ramp {
        let t = hi - step * i as f64;
        push_sample(&mut series, t, &cooling_bp, config.noise_sigma, &normal, &mut rng);
    }

    Ok(series)
}

fn push_sample(
    series: &mut RawSeries,
    t: f64,
    bp: &[Breakpoint; 4],
    sigma: f64,
    normal: &Normal<f64>,
    rng: &mut StdRng,
) {
    let z: f64 = normal.sample(rng);
    let jitter: f64 = normal.sample(rng);
    series.temperature.push(t);
    series.strain.push(tangent_value(bp, t) + sigma * z);
    series.stress.push(DEMO_STRESS_MPA + 0.5 * jitter);
}

/// Breakpoints of a demo configuration over the fixed demo range.
pub fn demo_breakpoints(params: &[f64; 6]) -> [Breakpoint; 4] {
    let (lo, hi) = DEMO_TEMP_RANGE;
    [
        Breakpoint {
            temperature: lo,
            strain: params[2],
        },
        Breakpoint {
            temperature: params[0],
            strain: params[3],
        },
        Breakpoint {
            temperature: params[0] + params[1],
            strain: params[4],
        },
        Breakpoint {
            temperature: hi,
            strain: params[5],
        },
    ]
}

fn demo_seed(config: &CalibrationConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.sample_count.hash(&mut hasher);
    config.noise_sigma.to_bits().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BranchSpec, DrivenBy, OptimizerKind};

    fn demo_config(sample_count: usize, noise_sigma: f64, seed: Option<u64>) -> CalibrationConfig {
        CalibrationConfig {
            input: None,
            driven: DrivenBy::Temperature,
            branch_spec: BranchSpec::Both,
            optimizer: OptimizerKind::Evolution,
            seed,
            population: 100,
            generations: 100,
            de_tol: 0.01,
            max_iters: 200,
            t2_bounds: (30.0, 120.0),
            span_bounds: (10.0, 60.0),
            sample_count,
            noise_sigma,
            plot: false,
            plot_width: 72,
            plot_height: 20,
            export_results: None,
            export_curve: None,
            debug_bundle: false,
        }
    }

    #[test]
    fn peak_occurs_once_at_the_turnaround() {
        let series = generate_demo(&demo_config(40, 0.001, Some(1))).unwrap();
        let ramp = 20;
        assert_eq!(series.len(), 2 * ramp - 1);
        assert_eq!(series.temperature[0], 20.0);
        assert_eq!(series.temperature[ramp - 1], 140.0);
        assert_eq!(series.temperature[series.len() - 1], 20.0);

        let peaks = series
            .temperature
            .iter()
            .filter(|&&t| t == 140.0)
            .count();
        assert_eq!(peaks, 1, "peak temperature must appear exactly once");
    }

    #[test]
    fn odd_count_rounds_the_ramp_up() {
        let series = generate_demo(&demo_config(41, 0.0, None)).unwrap();
        // ramp = ceil(41 / 2) = 21, total 2 * 21 - 1.
        assert_eq!(series.len(), 41);
    }

    #[test]
    fn same_config_reproduces_bitwise() {
        let config = demo_config(30, 0.002, Some(9));
        let a = generate_demo(&config).unwrap();
        let b = generate_demo(&config).unwrap();
        assert_eq!(a.temperature, b.temperature);
        assert_eq!(a.strain, b.strain);
        assert_eq!(a.stress, b.stress);
    }

    #[test]
    fn seed_changes_the_noise() {
        let a = generate_demo(&demo_config(30, 0.002, Some(1))).unwrap();
        let b = generate_demo(&demo_config(30, 0.002, Some(2))).unwrap();
        assert_eq!(a.temperature, b.temperature);
        assert_ne!(a.strain, b.strain);
    }

    #[test]
    fn zero_noise_matches_the_models_exactly() {
        let series = generate_demo(&demo_config(40, 0.0, Some(5))).unwrap();
        let heating_bp = demo_breakpoints(&DEMO_HEATING_PARAMS);
        let cooling_bp = demo_breakpoints(&DEMO_COOLING_PARAMS);
        let ramp = 20;

        for i in 0..ramp {
            let t = series.temperature[i];
            assert_eq!(series.strain[i], tangent_value(&heating_bp, t), "heating at {t}");
        }
        for i in ramp..series.len() {
            let t = series.temperature[i];
            assert_eq!(series.strain[i], tangent_value(&cooling_bp, t), "cooling at {t}");
        }
    }

    #[test]
    fn branches_disagree_inside_the_hysteresis_window() {
        // At 80 degC heating is mid-transformation (strain still elevated)
        // while cooling has not yet started transforming back.
        let series = generate_demo(&demo_config(240, 0.0, None)).unwrap();
        let ramp = 120;
        let heat_at = |target: f64| {
            (0..ramp)
                .find(|&i| (series.temperature[i] - target).abs() < 1.0)
                .map(|i| series.strain[i])
                .unwrap()
        };
        let cool_at = |target: f64| {
            (ramp..series.len())
                .find(|&i| (series.temperature[i] - target).abs() < 1.0)
                .map(|i| series.strain[i])
                .unwrap()
        };
        assert!(heat_at(80.0) > cool_at(80.0) + 0.01);
    }

    #[test]
    fn rejects_undersized_count() {
        let err = generate_demo(&demo_config(7, 0.0, None)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

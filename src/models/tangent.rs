//! Four-segment tangent-line model of a transformation curve.
//!
//! The model describes strain vs. temperature of one transformation branch
//! with four breakpoints. The endpoint temperatures T_1/T_4 are fixed from
//! the data; the free parameters are the two interior breakpoint
//! temperatures (as offset + span) and the four breakpoint strains:
//!
//! `[t2, span, strain_1, strain_2, strain_3, strain_4]`, with
//! `T_2 = t2` and `T_3 = t2 + span`.

use crate::domain::{Branch, Breakpoint, RawSeries, TransformSummary};
use crate::error::AppError;
use crate::fit::Fittable;

/// Default bound of the second breakpoint temperature (degC).
///
/// Plausible transformation window for the NiTi-family alloys this tool is
/// used on; override per specimen via the CLI.
pub const DEFAULT_T2_BOUNDS: (f64, f64) = (30.0, 120.0);
/// Default bound of the interior breakpoint span (degC). A strictly positive
/// lower bound keeps T_2 < T_3 for every feasible parameter vector.
pub const DEFAULT_SPAN_BOUNDS: (f64, f64) = (10.0, 60.0);
/// Number of free parameters.
pub const PARAM_COUNT: usize = 6;

/// Tangent model of one branch, with a committed breakpoint configuration.
#[derive(Debug, Clone)]
pub struct TangentModel {
    branch: Branch,
    t1: f64,
    t4: f64,
    temperature: Vec<f64>,
    strain: Vec<f64>,
    bounds: [(f64, f64); PARAM_COUNT],
    breakpoints: [Breakpoint; 4],
}

impl TangentModel {
    /// Build a model for one segmented branch.
    ///
    /// T_1 is the low-temperature end and T_4 the peak regardless of sweep
    /// direction: for austenite (heating) T_1 is the first sample and T_4
    /// the last, for martensite (cooling) the roles are swapped. Strain
    /// bounds come from the observed strain range; the initial guess is the
    /// midpoint of every bound. The initial guess is committed so the model
    /// evaluates from birth.
    pub fn make(branch: Branch, series: &RawSeries) -> Result<Self, AppError> {
        if series.temperature.is_empty() {
            return Err(AppError::new(
                3,
                format!("{} branch has no samples.", branch.display_name()),
            ));
        }
        if series.strain.len() != series.temperature.len() {
            return Err(AppError::new(
                3,
                format!(
                    "{} branch columns differ: temperature={}, strain={}.",
                    branch.display_name(),
                    series.temperature.len(),
                    series.strain.len()
                ),
            ));
        }

        let first = series.temperature[0];
        let last = series.temperature[series.temperature.len() - 1];
        let (t1, t4) = match branch {
            Branch::Austenite => (first, last),
            Branch::Martensite => (last, first),
        };

        let (strain_lo, strain_hi) = strain_range(&series.strain).ok_or_else(|| {
            AppError::new(
                3,
                format!(
                    "{} branch strain column has no finite values.",
                    branch.display_name()
                ),
            )
        })?;

        let bounds = [
            DEFAULT_T2_BOUNDS,
            DEFAULT_SPAN_BOUNDS,
            (strain_lo, strain_hi),
            (strain_lo, strain_hi),
            (strain_lo, strain_hi),
            (strain_lo, strain_hi),
        ];

        let mut model = Self {
            branch,
            t1,
            t4,
            temperature: series.temperature.clone(),
            strain: series.strain.clone(),
            bounds,
            breakpoints: [Breakpoint {
                temperature: 0.0,
                strain: 0.0,
            }; 4],
        };
        let x0 = model.initial_guess();
        model.update(&x0);
        Ok(model)
    }

    /// Replace the temperature bounds (T_2 interval, span interval) and
    /// recommit the midpoint guess.
    pub fn with_temperature_bounds(
        mut self,
        t2: (f64, f64),
        span: (f64, f64),
    ) -> Result<Self, AppError> {
        if !(t2.0.is_finite() && t2.1.is_finite() && t2.1 > t2.0) {
            return Err(AppError::new(
                2,
                format!("Invalid T2 bound [{}, {}].", t2.0, t2.1),
            ));
        }
        if !(span.0.is_finite() && span.1.is_finite() && span.1 > span.0 && span.0 > 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid span bound [{}, {}] (must be positive).", span.0, span.1),
            ));
        }
        self.bounds[0] = t2;
        self.bounds[1] = span;
        let x0 = self.initial_guess();
        self.update(&x0);
        Ok(self)
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    /// Committed breakpoint configuration, in transformation order
    /// (ascending temperature).
    pub fn breakpoints(&self) -> &[Breakpoint; 4] {
        &self.breakpoints
    }

    /// Breakpoints implied by a parameter vector, without committing it.
    pub fn breakpoints_at(&self, params: &[f64]) -> [Breakpoint; 4] {
        [
            Breakpoint {
                temperature: self.t1,
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
                temperature: self.t4,
                strain: params[5],
            },
        ]
    }

    /// Commit a parameter vector as the model's breakpoint configuration.
    pub fn update(&mut self, params: &[f64]) {
        self.breakpoints = self.breakpoints_at(params);
    }

    /// Strain predicted at temperature `t` by the committed configuration.
    pub fn evaluate(&self, t: f64) -> f64 {
        tangent_value(&self.breakpoints, t)
    }

    /// Onset/finish temperatures: the fixed endpoints, labelled per branch.
    ///
    /// Austenite starts transforming at the low end (As = T_1) and finishes
    /// at the peak (Af = T_4); martensite starts at the peak (Ms = T_4, the
    /// first sample of the cooling branch) and finishes at the low end
    /// (Mf = T_1).
    pub fn summary(&self) -> TransformSummary {
        let (onset, finish) = match self.branch {
            Branch::Austenite => (self.t1, self.t4),
            Branch::Martensite => (self.t4, self.t1),
        };
        TransformSummary {
            branch: self.branch,
            onset,
            finish,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.temperature.len()
    }
}

impl Fittable for TangentModel {
    /// Root-mean-square residual of the configuration implied by `params`
    /// against the branch samples. Pure: the committed breakpoints are not
    /// touched.
    fn error(&self, params: &[f64]) -> f64 {
        let bp = self.breakpoints_at(params);
        let mut sse = 0.0;
        for (&t, &obs) in self.temperature.iter().zip(&self.strain) {
            let r = tangent_value(&bp, t) - obs;
            sse += r * r;
        }
        (sse / self.temperature.len() as f64).sqrt()
    }

    fn initial_guess(&self) -> Vec<f64> {
        self.bounds.iter().map(|(lo, hi)| (lo + hi) / 2.0).collect()
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        self.bounds.to_vec()
    }
}

/// Piecewise-linear strain at `t` for a breakpoint configuration
/// `[p1, p2, p3, p4]` in ascending temperature order.
///
/// The three segments are anchored at p1, p2 and p4 respectively. The
/// arithmetic form of each segment is fixed: exported curves are compared
/// across runs, and a rearranged but algebraically equal form shifts values
/// by ulps. Consequence of the p4 anchor: at `p3.temperature` the value
/// reproduces `p3.strain` only to ~1 ulp.
pub fn tangent_value(bp: &[Breakpoint; 4], t: f64) -> f64 {
    let [p1, p2, p3, p4] = bp;
    if t < p2.temperature {
        (p2.strain - p1.strain) / (p2.temperature - p1.temperature) * (t - p1.temperature)
            + p1.strain
    } else if t < p3.temperature {
        (p3.strain - p2.strain) / (p3.temperature - p2.temperature) * (t - p2.temperature)
            + p2.strain
    } else {
        (p4.strain - p3.strain) / (p4.temperature - p3.temperature) * (t - p4.temperature)
            + p4.strain
    }
}

fn strain_range(strain: &[f64]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &s in strain {
        lo = lo.min(s);
        hi = hi.max(s);
    }
    if lo.is_finite() && hi.is_finite() {
        Some((lo, hi))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Heating branch sampled exactly from a known configuration:
    // breakpoints (20, 0.062), (70, 0.058), (95, 0.012), (140, 0.008).
    const TRUE_PARAMS: [f64; 6] = [70.0, 25.0, 0.062, 0.058, 0.012, 0.008];

    fn noiseless_heating_series() -> RawSeries {
        let bp = [
            Breakpoint {
                temperature: 20.0,
                strain: 0.062,
            },
            Breakpoint {
                temperature: 70.0,
                strain: 0.058,
            },
            Breakpoint {
                temperature: 95.0,
                strain: 0.012,
            },
            Breakpoint {
                temperature: 140.0,
                strain: 0.008,
            },
        ];
        let mut series = RawSeries::default();
        for i in 0..25 {
            let t = 20.0 + 5.0 * i as f64;
            series.temperature.push(t);
            series.strain.push(tangent_value(&bp, t));
            series.stress.push(50.0);
        }
        series
    }

    fn heating_model() -> TangentModel {
        TangentModel::make(Branch::Austenite, &noiseless_heating_series()).unwrap()
    }

    #[test]
    fn evaluate_reproduces_breakpoint_strains() {
        let mut model = heating_model();
        model.update(&TRUE_PARAMS);

        // Segments are anchored at T_1, T_2 and T_4, so those three are exact.
        assert_eq!(model.evaluate(20.0), 0.062);
        assert_eq!(model.evaluate(70.0), 0.058);
        assert_eq!(model.evaluate(140.0), 0.008);

        // The third segment is anchored at T_4, so T_3 lands within ulps.
        let at_t3 = model.evaluate(95.0);
        assert!(
            (at_t3 - 0.012).abs() < 1e-12,
            "at T_3: expected ~0.012, got {at_t3}"
        );
    }

    #[test]
    fn segments_meet_at_interior_breakpoints() {
        let mut model = heating_model();
        model.update(&TRUE_PARAMS);

        let eps = 1e-9;
        for t in [70.0, 95.0] {
            let below = model.evaluate(t - eps);
            let above = model.evaluate(t + eps);
            assert!(
                (below - above).abs() < 1e-6,
                "discontinuity at {t}: {below} vs {above}"
            );
        }
    }

    #[test]
    fn error_is_zero_on_noiseless_data() {
        let model = heating_model();
        let err = model.error(&TRUE_PARAMS);
        assert!(err >= 0.0);
        assert!(err < 1e-9, "expected zero residual, got {err}");
    }

    #[test]
    fn error_matches_hand_computed_rmse() {
        let series = RawSeries {
            temperature: vec![10.0, 50.0, 90.0],
            strain: vec![0.2, 0.4, 0.6],
            stress: vec![0.0; 3],
        };
        let model = TangentModel::make(Branch::Austenite, &series).unwrap();
        let params = [40.0, 30.0, 0.1, 0.3, 0.5, 0.7];

        // f(10) = 0.1 (anchor), f(50) on the middle segment, f(90) = 0.7 (anchor).
        let f_mid: f64 = (0.5 - 0.3) / 30.0 * 10.0 + 0.3;
        let sse = (0.1f64 - 0.2).powi(2) + (f_mid - 0.4).powi(2) + (0.7f64 - 0.6).powi(2);
        let expected = (sse / 3.0).sqrt();

        let err = model.error(&params);
        assert!(
            (err - expected).abs() < 1e-12,
            "expected {expected}, got {err}"
        );
    }

    #[test]
    fn error_is_nonnegative_for_arbitrary_params() {
        let model = heating_model();
        for params in [
            [30.0, 10.0, 0.0, 0.0, 0.0, 0.0],
            [120.0, 60.0, 0.062, 0.008, 0.062, 0.008],
            [75.0, 35.0, 0.01, 0.05, 0.02, 0.06],
        ] {
            assert!(model.error(&params) >= 0.0);
        }
    }

    #[test]
    fn update_is_idempotent() {
        let mut model = heating_model();
        model.update(&TRUE_PARAMS);
        let first = *model.breakpoints();
        model.update(&TRUE_PARAMS);
        assert_eq!(*model.breakpoints(), first);
    }

    #[test]
    fn breakpoints_at_maps_offset_and_span() {
        let model = heating_model();
        let bp = model.breakpoints_at(&[65.0, 20.0, 0.06, 0.05, 0.02, 0.01]);
        assert_eq!(bp[0].temperature, 20.0);
        assert_eq!(bp[1].temperature, 65.0);
        assert_eq!(bp[2].temperature, 85.0);
        assert_eq!(bp[3].temperature, 140.0);
        assert_eq!(bp[0].strain, 0.06);
        assert_eq!(bp[3].strain, 0.01);
    }

    #[test]
    fn default_bounds_and_initial_guess() {
        let model = heating_model();
        let bounds = model.bounds();
        assert_eq!(bounds.len(), PARAM_COUNT);
        assert_eq!(bounds[0], DEFAULT_T2_BOUNDS);
        assert_eq!(bounds[1], DEFAULT_SPAN_BOUNDS);
        // Strain bounds span the observed strain range.
        assert_eq!(bounds[2], (0.008, 0.062));

        let x0 = model.initial_guess();
        assert_eq!(x0[0], 75.0);
        assert_eq!(x0[1], 35.0);
        assert!((x0[2] - 0.035).abs() < 1e-12);
    }

    #[test]
    fn bound_override_revalidates_and_recommits() {
        let model = heating_model()
            .with_temperature_bounds((40.0, 110.0), (15.0, 45.0))
            .unwrap();
        let x0 = model.initial_guess();
        assert_eq!(x0[0], 75.0);
        assert_eq!(x0[1], 30.0);
        assert_eq!(model.breakpoints()[1].temperature, 75.0);

        let inverted = heating_model().with_temperature_bounds((110.0, 40.0), (15.0, 45.0));
        assert_eq!(inverted.unwrap_err().exit_code(), 2);

        let zero_span = heating_model().with_temperature_bounds((40.0, 110.0), (0.0, 45.0));
        assert_eq!(zero_span.unwrap_err().exit_code(), 2);
    }

    #[test]
    fn summary_reports_fixed_endpoints_per_branch() {
        let heating = heating_model().summary();
        assert_eq!(heating.branch, Branch::Austenite);
        assert_eq!(heating.onset, 20.0);
        assert_eq!(heating.finish, 140.0);

        let cooling_series = RawSeries {
            temperature: vec![140.0, 100.0, 60.0, 20.0],
            strain: vec![0.008, 0.02, 0.05, 0.062],
            stress: vec![50.0; 4],
        };
        let cooling = TangentModel::make(Branch::Martensite, &cooling_series)
            .unwrap()
            .summary();
        assert_eq!(cooling.branch, Branch::Martensite);
        assert_eq!(cooling.onset, 140.0);
        assert_eq!(cooling.finish, 20.0);
        assert_eq!(cooling.branch.onset_label(), "Ms");
        assert_eq!(cooling.branch.finish_label(), "Mf");
    }

    #[test]
    fn martensite_evaluates_in_ascending_temperature_order() {
        // Cooling data runs peak-to-low, but the model's breakpoints are
        // always ordered T_1 < T_2 < T_3 < T_4.
        let series = RawSeries {
            temperature: vec![140.0, 95.0, 45.0, 20.0],
            strain: vec![0.008, 0.012, 0.058, 0.062],
            stress: vec![50.0; 4],
        };
        let mut model = TangentModel::make(Branch::Martensite, &series).unwrap();
        model.update(&[45.0, 50.0, 0.062, 0.058, 0.012, 0.008]);
        assert_eq!(model.evaluate(20.0), 0.062);
        assert_eq!(model.evaluate(140.0), 0.008);
        assert!(model.evaluate(60.0) < 0.062);
    }

    #[test]
    fn rejects_empty_branch() {
        let err = TangentModel::make(Branch::Austenite, &RawSeries::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}

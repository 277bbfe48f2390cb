//! Segmentation of a raw thermal sweep into transformation branches.
//!
//! A measurement sweeps temperature up to a peak and back down. The heating
//! portion (start through peak) is the austenite branch, the cooling portion
//! (peak through end) the martensite branch. Both branches keep the original
//! sample order and share the peak sample.

use crate::domain::{Branch, DrivenBy, RawSeries};
use crate::error::AppError;

/// Location of the sweep's temperature maximum.
#[derive(Debug, Clone, Copy)]
pub struct PeakInfo {
    /// Index of the first occurrence of the maximum.
    pub index: usize,
    pub temperature: f64,
}

/// The two overlapping monotonic-temperature branches of a sweep.
#[derive(Debug, Clone)]
pub struct SegmentedSeries {
    pub austenite: RawSeries,
    pub martensite: RawSeries,
    pub peak: PeakInfo,
}

impl SegmentedSeries {
    pub fn branch(&self, branch: Branch) -> &RawSeries {
        match branch {
            Branch::Austenite => &self.austenite,
            Branch::Martensite => &self.martensite,
        }
    }
}

/// Split a raw sweep at the first occurrence of its temperature maximum.
///
/// Austenite = samples `[0, peak]` inclusive, martensite = samples
/// `[peak, end]` inclusive; the peak sample belongs to both. Only
/// temperature-driven segmentation exists.
pub fn segment(series: &RawSeries, driven: DrivenBy) -> Result<SegmentedSeries, AppError> {
    if driven != DrivenBy::Temperature {
        return Err(AppError::new(
            3,
            "Only temperature-driven segmentation is supported.",
        ));
    }
    validate_series(series)?;

    let index = peak_index(&series.temperature);
    let peak = PeakInfo {
        index,
        temperature: series.temperature[index],
    };

    Ok(SegmentedSeries {
        austenite: slice_series(series, 0, index),
        martensite: slice_series(series, index, series.len() - 1),
        peak,
    })
}

fn validate_series(series: &RawSeries) -> Result<(), AppError> {
    if series.is_empty() {
        return Err(AppError::new(3, "Input series has no samples."));
    }
    let n = series.temperature.len();
    if series.strain.len() != n || series.stress.len() != n {
        return Err(AppError::new(
            3,
            format!(
                "Column lengths differ: temperature={}, strain={}, stress={}.",
                n,
                series.strain.len(),
                series.stress.len()
            ),
        ));
    }
    Ok(())
}

/// Index of the first occurrence of the maximum value.
fn peak_index(temperature: &[f64]) -> usize {
    let mut best = 0;
    for (i, &t) in temperature.iter().enumerate() {
        if t > temperature[best] {
            best = i;
        }
    }
    best
}

/// Copy samples `[lo, hi]` inclusive into a new series.
fn slice_series(series: &RawSeries, lo: usize, hi: usize) -> RawSeries {
    RawSeries {
        temperature: series.temperature[lo..=hi].to_vec(),
        strain: series.strain[lo..=hi].to_vec(),
        stress: series.stress[lo..=hi].to_vec(),
    }
}

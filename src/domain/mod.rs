//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration enums (`Branch`, `OptimizerKind`, `DrivenBy`)
//! - the raw measured series (`RawSeries`)
//! - fit outputs (`Breakpoint`, `TransformSummary`, `FitQuality`, `CurveFile`)

pub mod types;

pub use types::*;

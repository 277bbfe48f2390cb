//! Model fitting.
//!
//! Responsibilities:
//!
//! - define what a model must expose to be optimized (`Fittable`)
//! - dispatch to the selected optimizer and commit the winner once
//! - bounded global search (`evolution`) and local refinement (`gradient`)

pub mod evolution;
pub mod fitter;
pub mod gradient;

pub use fitter::*;

//! Transformation-curve model implementations.
//!
//! Models are small, self-contained structs so that fitting code can stay
//! generic over the `Fittable` trait.

pub mod tangent;

pub use tangent::*;

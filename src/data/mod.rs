//! Sweep preparation.
//!
//! - peak detection + branch segmentation (`segment`)
//! - seeded synthetic demo cycles (`synthetic`)

pub mod segment;
pub mod synthetic;

pub use segment::*;
pub use synthetic::*;

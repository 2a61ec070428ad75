//! # Mathematical Functions
//!
//! Checked integer arithmetic and 256-bit mul-div used by the accounting engines.

pub mod mul_div;
pub mod safe_math;

// Re-export commonly used functions
pub use mul_div::*;
pub use safe_math::*;

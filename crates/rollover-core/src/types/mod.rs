//! # Core Type Definitions
//!
//! Identifiers, pool slots and rewards bookkeeping shared by the engines.

pub mod ids;
pub mod pool;
pub mod rewards;

// Re-export all types
pub use ids::*;
pub use pool::*;
pub use rewards::*;

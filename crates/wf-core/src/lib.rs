//! wf-core: stable foundation for warmflow.
//!
//! Contains:
//! - ids (sensor and actuator identities)
//! - cycle (control-cycle time constants and conversions)

pub mod cycle;
pub mod ids;

// Re-exports: nice ergonomics for downstream crates
pub use cycle::*;
pub use ids::*;

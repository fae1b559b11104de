//! wf-app: the service layer between the control crates and the daemon.
//!
//! [`Engine`] owns every piece of control state and runs one cycle
//! end-to-end; [`pacing`] decides how long to sleep between cycles. The
//! binary only wires up hardware, signals and exit codes.

pub mod engine;
pub mod error;
pub mod pacing;

pub use engine::{Engine, EnginePaths};
pub use error::{AppError, AppResult};
pub use pacing::sleep_after_cycle;

//! wf-telemetry: what the controller writes about itself each cycle.
//!
//! Three artifacts: an append-only CSV data log, a JSON snapshot of the
//! latest cycle for other programs to poll, and a plain-text table of the
//! active configuration.

pub mod record;
pub mod writer;

pub use record::CycleRecord;
pub use writer::{write_config_table, write_snapshot, DataLog};

pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

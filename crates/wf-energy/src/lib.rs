//! wf-energy: consumption counters and their on-disk persistence.

pub mod meter;
pub mod store;

pub use meter::{EnergyMeter, MonthlyTotals};
pub use store::{EnergySnapshot, EnergyStore};

pub type EnergyResult<T> = Result<T, EnergyError>;

#[derive(thiserror::Error, Debug)]
pub enum EnergyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

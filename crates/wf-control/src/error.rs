//! Error types for the control engine.

use thiserror::Error;
use wf_core::SensorId;

/// Result type for control engine operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in the decision engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// A sensor channel has been unreadable for too many consecutive
    /// cycles. Fatal: the caller must shut all actuators down and exit.
    #[error("sensor '{channel}' unreadable for {streak} consecutive cycles")]
    SensorFault { channel: SensorId, streak: u16 },
}

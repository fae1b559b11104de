//! Error types for the wf-app service layer.

pub type AppResult<T> = Result<T, AppError>;

/// Wraps errors from the backend crates into the one type the daemon
/// turns into log lines and exit codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Control error: {0}")]
    Control(#[from] wf_control::ControlError),

    #[error("Config error: {0}")]
    Config(#[from] wf_config::ConfigError),

    #[error("Hardware error: {0}")]
    Hal(#[from] wf_hal::HalError),

    #[error("Energy store error: {0}")]
    Energy(#[from] wf_energy::EnergyError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] wf_telemetry::TelemetryError),

    #[error("Actuator release failed: {0}")]
    ReleaseFailed(wf_hal::HalError),
}

impl AppError {
    /// A sensor channel exceeded its error streak; the installation must
    /// not keep running on stale readings.
    pub fn is_sensor_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Control(wf_control::ControlError::SensorFault { .. })
        )
    }
}

//! wf-hal: the hardware boundary.
//!
//! The engine only sees the four traits in [`traits`]; the sysfs-backed
//! implementations here are what the daemon wires in on a real box, and
//! tests substitute in-memory fakes.

pub mod gpio;
pub mod onewire;
pub mod traits;

pub use gpio::{GpioCommsPort, GpioPowerSense, GpioSwitchBank, SysfsGpio};
pub use onewire::{parse_w1_payload, W1SensorBank};
pub use traits::{CommsPort, PowerSense, SensorBank, SwitchBank};

pub type HalResult<T> = Result<T, HalError>;

#[derive(thiserror::Error, Debug)]
pub enum HalError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl HalError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

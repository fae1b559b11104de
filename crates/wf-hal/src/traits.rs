//! The four seams between the control engine and the hardware.

use crate::HalResult;
use wf_core::{ActuatorId, SensorId};

/// Temperature inputs. `None` means the read failed this cycle; the
/// sensor filter turns that into an error streak.
pub trait SensorBank {
    fn read(&mut self, id: SensorId) -> Option<f64>;
}

/// Relay outputs for the main actuators.
pub trait SwitchBank {
    fn write(&mut self, id: ActuatorId, on: bool) -> HalResult<()>;

    /// Drive everything off, continuing past individual failures so a
    /// partly broken bank still releases as much as it can.
    fn release_all(&mut self) -> HalResult<()> {
        let mut first_err = None;
        for id in ActuatorId::ALL {
            if let Err(err) = self.write(id, false) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

/// The battery/grid sense line. Reads cannot fail on the installed
/// hardware; implementations that can fail report grid power.
pub trait PowerSense {
    fn on_battery(&mut self) -> bool;
}

/// Four-wire heat-pump handshake: two raw input bits, a 2-bit request out.
pub trait CommsPort {
    fn read_status(&mut self) -> u8;
    fn write_request(&mut self, request: u8) -> HalResult<()>;
}

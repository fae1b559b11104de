//! Relay and sense lines through the sysfs GPIO interface.

use crate::traits::{CommsPort, PowerSense, SwitchBank};
use crate::{HalError, HalResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use wf_core::ActuatorId;

const SYSFS_ROOT: &str = "/sys/class/gpio";

/// One exported GPIO line. `invert` flips the written level for the
/// active-low relay boards this controller usually drives; reads are
/// never inverted.
#[derive(Debug)]
pub struct SysfsGpio {
    pin: u8,
    invert: bool,
    value_path: PathBuf,
}

impl SysfsGpio {
    pub fn output(pin: u8, invert: bool) -> HalResult<Self> {
        Self::setup(Path::new(SYSFS_ROOT), pin, invert, "out")
    }

    pub fn input(pin: u8) -> HalResult<Self> {
        Self::setup(Path::new(SYSFS_ROOT), pin, false, "in")
    }

    /// Same as [`output`]/[`input`] against an alternate root, for tests.
    ///
    /// [`output`]: SysfsGpio::output
    /// [`input`]: SysfsGpio::input
    pub fn setup(root: &Path, pin: u8, invert: bool, direction: &str) -> HalResult<Self> {
        let line_dir = root.join(format!("gpio{pin}"));
        if !line_dir.exists() {
            let export = root.join("export");
            fs::write(&export, pin.to_string())
                .map_err(|e| HalError::io(export.display().to_string(), e))?;
        }
        let direction_path = line_dir.join("direction");
        fs::write(&direction_path, direction)
            .map_err(|e| HalError::io(direction_path.display().to_string(), e))?;
        Ok(Self {
            pin,
            invert,
            value_path: line_dir.join("value"),
        })
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn set(&mut self, on: bool) -> HalResult<()> {
        let level = if on != self.invert { "1" } else { "0" };
        fs::write(&self.value_path, level)
            .map_err(|e| HalError::io(self.value_path.display().to_string(), e))
    }

    pub fn get(&mut self) -> HalResult<bool> {
        let raw = fs::read_to_string(&self.value_path)
            .map_err(|e| HalError::io(self.value_path.display().to_string(), e))?;
        Ok(raw.trim() == "1")
    }
}

/// The four relay outputs. The heat-pump stages have no relay of their
/// own; they travel over the comms port, so writes to them are accepted
/// and dropped here.
pub struct GpioSwitchBank {
    lines: [Option<SysfsGpio>; ActuatorId::COUNT],
}

impl GpioSwitchBank {
    pub fn new(pump1: u8, pump2: u8, valve: u8, heater: u8, invert: bool) -> HalResult<Self> {
        Self::at(Path::new(SYSFS_ROOT), pump1, pump2, valve, heater, invert)
    }

    pub fn at(
        root: &Path,
        pump1: u8,
        pump2: u8,
        valve: u8,
        heater: u8,
        invert: bool,
    ) -> HalResult<Self> {
        let mut lines: [Option<SysfsGpio>; ActuatorId::COUNT] = Default::default();
        for (id, pin) in [
            (ActuatorId::FurnacePump, pump1),
            (ActuatorId::SolarPump, pump2),
            (ActuatorId::Valve, valve),
            (ActuatorId::Heater, heater),
        ] {
            let mut line = SysfsGpio::setup(root, pin, invert, "out")?;
            line.set(false)?;
            lines[id.index()] = Some(line);
        }
        Ok(Self { lines })
    }
}

impl SwitchBank for GpioSwitchBank {
    fn write(&mut self, id: ActuatorId, on: bool) -> HalResult<()> {
        match &mut self.lines[id.index()] {
            Some(line) => line.set(on),
            None => Ok(()),
        }
    }
}

/// Battery sense input; a failed read is reported as grid power.
pub struct GpioPowerSense {
    line: SysfsGpio,
}

impl GpioPowerSense {
    pub fn new(pin: u8) -> HalResult<Self> {
        Ok(Self {
            line: SysfsGpio::input(pin)?,
        })
    }

    pub fn from_line(line: SysfsGpio) -> Self {
        Self { line }
    }
}

impl PowerSense for GpioPowerSense {
    fn on_battery(&mut self) -> bool {
        match self.line.get() {
            Ok(active) => active,
            Err(err) => {
                warn!(pin = self.line.pin(), %err, "battery sense read failed");
                false
            }
        }
    }
}

/// Two input lines, two request lines.
pub struct GpioCommsPort {
    status_low: SysfsGpio,
    status_high: SysfsGpio,
    request_low: SysfsGpio,
    request_high: SysfsGpio,
}

impl GpioCommsPort {
    pub fn new(status_pins: (u8, u8), request_pins: (u8, u8)) -> HalResult<Self> {
        Ok(Self {
            status_low: SysfsGpio::input(status_pins.0)?,
            status_high: SysfsGpio::input(status_pins.1)?,
            request_low: SysfsGpio::setup(Path::new(SYSFS_ROOT), request_pins.0, false, "out")?,
            request_high: SysfsGpio::setup(Path::new(SYSFS_ROOT), request_pins.1, false, "out")?,
        })
    }

    pub fn from_lines(
        status_low: SysfsGpio,
        status_high: SysfsGpio,
        request_low: SysfsGpio,
        request_high: SysfsGpio,
    ) -> Self {
        Self {
            status_low,
            status_high,
            request_low,
            request_high,
        }
    }
}

impl CommsPort for GpioCommsPort {
    fn read_status(&mut self) -> u8 {
        let mut bits = 0;
        if self.status_low.get().unwrap_or(false) {
            bits |= 0b01;
        }
        if self.status_high.get().unwrap_or(false) {
            bits |= 0b10;
        }
        bits
    }

    fn write_request(&mut self, request: u8) -> HalResult<()> {
        self.request_low.set(request & 0b01 != 0)?;
        self.request_high.set(request & 0b10 != 0)?;
        Ok(())
    }
}

//! DS18B20 reads through the kernel w1 subsystem.
//!
//! Each sensor is a `w1_slave` file; the kernel prints two lines, a CRC
//! verdict and a `t=` milli-degree value:
//!
//! ```text
//! 2d 00 4b 46 ff ff 02 10 19 : crc=19 YES
//! 2d 00 4b 46 ff ff 02 10 19 t=22562
//! ```

use crate::traits::SensorBank;
use std::fs;
use tracing::warn;
use wf_core::SensorId;

/// The bus reports 85.0 °C for a sensor that answered before finishing a
/// conversion; treat it as a failed read.
const POWER_ON_RESET_C: f64 = 85.0;

/// Extract degrees Celsius from a `w1_slave` payload. `None` when the CRC
/// failed, the format is off, or the value is the power-on-reset artifact.
pub fn parse_w1_payload(payload: &str) -> Option<f64> {
    let mut lines = payload.lines();
    let crc_line = lines.next()?;
    if !crc_line.trim_end().ends_with("YES") {
        return None;
    }
    let data_line = lines.next()?;
    let milli: i32 = data_line.split("t=").nth(1)?.trim().parse().ok()?;
    let celsius = f64::from(milli) / 1000.0;
    if celsius == POWER_ON_RESET_C {
        return None;
    }
    Some(celsius)
}

/// Reads each sensor from its configured `w1_slave` path.
pub struct W1SensorBank {
    paths: [String; SensorId::COUNT],
}

impl W1SensorBank {
    pub fn new(paths: [String; SensorId::COUNT]) -> Self {
        Self { paths }
    }
}

impl SensorBank for W1SensorBank {
    fn read(&mut self, id: SensorId) -> Option<f64> {
        let path = &self.paths[id.index()];
        match fs::read_to_string(path) {
            Ok(payload) => {
                let value = parse_w1_payload(&payload);
                if value.is_none() {
                    warn!(sensor = %id, path, "unparseable 1-wire payload");
                }
                value
            }
            Err(err) => {
                warn!(sensor = %id, path, %err, "sensor read failed");
                None
            }
        }
    }
}

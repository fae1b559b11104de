//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use wf_core::SensorId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub sensors: SensorPaths,
    #[serde(default)]
    pub pins: PinAssignment,
    /// Relays driven active-low when set (ON writes a 0 to the line).
    #[serde(default = "default_true")]
    pub invert_output: bool,
    /// Desired boiler temperature, °C. Clamped to 25..=52.
    #[serde(default = "default_wanted_temp")]
    pub wanted_temp: f64,
    /// Absolute boiler ceiling, °C. Clamped to 40..=70 and >= wanted_temp + 3.
    #[serde(default = "default_abs_max_temp")]
    pub abs_max_temp: f64,
    /// Electric heater permitted during night-tariff hours.
    #[serde(default = "default_true")]
    pub use_heater_night: bool,
    /// Electric heater permitted during day hours.
    #[serde(default = "default_true")]
    pub use_heater_day: bool,
    #[serde(default)]
    pub pump1_always_on: bool,
    #[serde(default = "default_true")]
    pub use_pump1: bool,
    #[serde(default = "default_true")]
    pub use_pump2: bool,
    /// Day of month on which energy counters are reset. Clamped to 1..=28.
    #[serde(default = "default_reset_day")]
    pub counter_reset_day: u32,
    /// Pre-heat the boiler on cheap night energy beyond wanted_temp.
    #[serde(default)]
    pub night_boost: bool,
    /// Concurrent high-current loads allowed. Clamped to 1..=3.
    #[serde(default = "default_max_big_consumers")]
    pub max_big_consumers: u8,
    /// Heat-pump stages may be requested at all.
    #[serde(default = "default_true")]
    pub use_heat_pump: bool,
    #[serde(default)]
    pub target_policy: TargetPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            mode: Mode::default(),
            sensors: SensorPaths::default(),
            pins: PinAssignment::default(),
            invert_output: true,
            wanted_temp: default_wanted_temp(),
            abs_max_temp: default_abs_max_temp(),
            use_heater_night: true,
            use_heater_day: true,
            pump1_always_on: false,
            use_pump1: true,
            use_pump2: true,
            counter_reset_day: default_reset_day(),
            night_boost: false,
            max_big_consumers: default_max_big_consumers(),
            use_heat_pump: true,
            target_policy: TargetPolicy::default(),
        }
    }
}

impl Config {
    /// Ceiling for the night-boost pre-heat: several degrees above the wanted
    /// temperature, never past the absolute maximum. Too hot builds calcium
    /// in the tank; 30-45 °C is a perfect bacteria environment.
    pub fn night_boost_temp(&self) -> f64 {
        (self.wanted_temp + 10.0).min(self.abs_max_temp)
    }
}

/// Operating mode of the controller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// All actuators held off.
    Off,
    /// Reach the desired water temperature efficiently.
    #[default]
    Auto,
}

/// Target-temperature derivation policy (one per deployment).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Hourly curve, interpolated, compensated by the rolling outdoor average.
    #[default]
    CurveAveraged,
    /// Hourly curve minus the instantaneous outdoor reading.
    CurveInstant,
}

/// Filesystem paths of the DS18B20 sensor files, one per channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorPaths {
    #[serde(default = "default_sensor_path")]
    pub furnace: String,
    #[serde(default = "default_sensor_path")]
    pub collector: String,
    #[serde(default = "default_sensor_path")]
    pub boiler_top: String,
    #[serde(default = "default_sensor_path")]
    pub boiler_bottom: String,
    #[serde(default = "default_sensor_path")]
    pub outdoor: String,
}

impl Default for SensorPaths {
    fn default() -> Self {
        Self {
            furnace: default_sensor_path(),
            collector: default_sensor_path(),
            boiler_top: default_sensor_path(),
            boiler_bottom: default_sensor_path(),
            outdoor: default_sensor_path(),
        }
    }
}

impl SensorPaths {
    pub fn path(&self, id: SensorId) -> &str {
        match id {
            SensorId::Furnace => &self.furnace,
            SensorId::Collector => &self.collector,
            SensorId::BoilerTop => &self.boiler_top,
            SensorId::BoilerBottom => &self.boiler_bottom,
            SensorId::Outdoor => &self.outdoor,
        }
    }
}

/// BCM GPIO pin numbers. Each is clamped to 4..=27; a duplicate assignment
/// anywhere in the set falls back to the defaults wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinAssignment {
    #[serde(default = "default_battery_pin")]
    pub battery: u8,
    #[serde(default = "default_pump1_pin")]
    pub pump1: u8,
    #[serde(default = "default_pump2_pin")]
    pub pump2: u8,
    #[serde(default = "default_valve_pin")]
    pub valve: u8,
    #[serde(default = "default_heater_pin")]
    pub heater: u8,
    #[serde(default = "default_comms1_pin")]
    pub comms1: u8,
    #[serde(default = "default_comms2_pin")]
    pub comms2: u8,
    #[serde(default = "default_comms3_pin")]
    pub comms3: u8,
    #[serde(default = "default_comms4_pin")]
    pub comms4: u8,
}

impl Default for PinAssignment {
    fn default() -> Self {
        Self {
            battery: default_battery_pin(),
            pump1: default_pump1_pin(),
            pump2: default_pump2_pin(),
            valve: default_valve_pin(),
            heater: default_heater_pin(),
            comms1: default_comms1_pin(),
            comms2: default_comms2_pin(),
            comms3: default_comms3_pin(),
            comms4: default_comms4_pin(),
        }
    }
}

impl PinAssignment {
    pub fn all(&self) -> [u8; 9] {
        [
            self.battery,
            self.pump1,
            self.pump2,
            self.valve,
            self.heater,
            self.comms1,
            self.comms2,
            self.comms3,
            self.comms4,
        ]
    }
}

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_wanted_temp() -> f64 {
    40.0
}

fn default_abs_max_temp() -> f64 {
    63.0
}

fn default_reset_day() -> u32 {
    4
}

fn default_max_big_consumers() -> u8 {
    1
}

fn default_sensor_path() -> String {
    "/dev/null".to_string()
}

fn default_battery_pin() -> u8 {
    7
}

fn default_pump1_pin() -> u8 {
    5
}

fn default_pump2_pin() -> u8 {
    6
}

fn default_valve_pin() -> u8 {
    13
}

fn default_heater_pin() -> u8 {
    16
}

fn default_comms1_pin() -> u8 {
    17
}

fn default_comms2_pin() -> u8 {
    18
}

fn default_comms3_pin() -> u8 {
    27
}

fn default_comms4_pin() -> u8 {
    22
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.mode, Mode::Auto);
        assert_eq!(cfg.wanted_temp, 40.0);
        assert_eq!(cfg.abs_max_temp, 63.0);
        assert_eq!(cfg.max_big_consumers, 1);
        assert!(cfg.invert_output);
    }

    #[test]
    fn night_boost_temp_clamped_to_abs_max() {
        let mut cfg = Config::default();
        cfg.wanted_temp = 50.0;
        cfg.abs_max_temp = 55.0;
        assert_eq!(cfg.night_boost_temp(), 55.0);
        cfg.abs_max_temp = 65.0;
        assert_eq!(cfg.night_boost_temp(), 60.0);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").expect("parse");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_yaml_overrides() {
        let cfg: Config = serde_yaml::from_str("wanted_temp: 45\nnight_boost: true\n").expect("parse");
        assert_eq!(cfg.wanted_temp, 45.0);
        assert!(cfg.night_boost);
        assert_eq!(cfg.abs_max_temp, 63.0);
    }
}

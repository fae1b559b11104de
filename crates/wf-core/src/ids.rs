use core::fmt;

/// Temperature measurement channels of the installation.
///
/// The discriminant doubles as a stable array index, so per-channel state can
/// live in a plain fixed-size array without magic positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SensorId {
    Furnace = 0,
    Collector = 1,
    BoilerTop = 2,
    BoilerBottom = 3,
    Outdoor = 4,
}

impl SensorId {
    pub const COUNT: usize = 5;

    pub const ALL: [SensorId; Self::COUNT] = [
        SensorId::Furnace,
        SensorId::Collector,
        SensorId::BoilerTop,
        SensorId::BoilerBottom,
        SensorId::Outdoor,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable channel name, used in log messages.
    pub fn name(self) -> &'static str {
        match self {
            SensorId::Furnace => "furnace",
            SensorId::Collector => "solar collector",
            SensorId::BoilerTop => "boiler top",
            SensorId::BoilerBottom => "boiler bottom",
            SensorId::Outdoor => "outdoor",
        }
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Switchable devices under the controller's authority.
///
/// The first four drive physical relays; the heat-pump stages are request
/// lines to an external counterpart unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActuatorId {
    FurnacePump = 0,
    SolarPump = 1,
    Valve = 2,
    Heater = 3,
    HeatPumpLow = 4,
    HeatPumpHigh = 5,
}

impl ActuatorId {
    pub const COUNT: usize = 6;

    pub const ALL: [ActuatorId; Self::COUNT] = [
        ActuatorId::FurnacePump,
        ActuatorId::SolarPump,
        ActuatorId::Valve,
        ActuatorId::Heater,
        ActuatorId::HeatPumpLow,
        ActuatorId::HeatPumpHigh,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ActuatorId::FurnacePump => "furnace pump",
            ActuatorId::SolarPump => "solar pump",
            ActuatorId::Valve => "valve",
            ActuatorId::Heater => "heater",
            ActuatorId::HeatPumpLow => "heat pump low",
            ActuatorId::HeatPumpHigh => "heat pump high",
        }
    }

    /// High-current loads subject to concurrency budgeting.
    pub fn is_big_consumer(self) -> bool {
        matches!(
            self,
            ActuatorId::Heater | ActuatorId::HeatPumpLow | ActuatorId::HeatPumpHigh
        )
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Per-cycle desired actuator state.
//!
//! Internally the desired state is a set of named booleans; the 7-bit wire
//! mask (the contract with the heat-pump counterpart and the data log) is
//! produced only at the boundary.

/// Wire bit positions, stable across the external protocol and the log.
pub mod bits {
    pub const PUMP1: u8 = 1;
    pub const PUMP2: u8 = 2;
    pub const VALVE: u8 = 4;
    pub const HEATER: u8 = 8;
    pub const HEATER_FORCED: u8 = 16;
    pub const HP_LOW: u8 = 32;
    pub const HP_HIGH: u8 = 64;
}

/// What the demand rules want each actuator to be this cycle.
///
/// Produced fresh every cycle, narrowed by the arbiter and the battery
/// override, consumed by `ActuatorRegistry::apply`. Never retained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DesiredState {
    pub pump1: bool,
    pub pump2: bool,
    pub valve: bool,
    /// Heater requested through the normal guarded path.
    pub heater_wanted: bool,
    /// Heater forced on, bypassing its on-guard (battery override).
    pub heater_forced: bool,
    pub hp_low: bool,
    pub hp_high: bool,
}

impl DesiredState {
    pub const OFF: DesiredState = DesiredState {
        pump1: false,
        pump2: false,
        valve: false,
        heater_wanted: false,
        heater_forced: false,
        hp_low: false,
        hp_high: false,
    };

    /// Emergency heat evacuation: both pumps and the valve, nothing else.
    pub const EVACUATE: DesiredState = DesiredState {
        pump1: true,
        pump2: true,
        valve: true,
        heater_wanted: false,
        heater_forced: false,
        hp_low: false,
        hp_high: false,
    };

    /// Convert to the wire bitmask.
    pub fn to_bits(self) -> u8 {
        let mut b = 0;
        if self.pump1 {
            b |= bits::PUMP1;
        }
        if self.pump2 {
            b |= bits::PUMP2;
        }
        if self.valve {
            b |= bits::VALVE;
        }
        if self.heater_wanted {
            b |= bits::HEATER;
        }
        if self.heater_forced {
            b |= bits::HEATER_FORCED;
        }
        if self.hp_low {
            b |= bits::HP_LOW;
        }
        if self.hp_high {
            b |= bits::HP_HIGH;
        }
        b
    }

    pub fn from_bits(b: u8) -> Self {
        Self {
            pump1: b & bits::PUMP1 != 0,
            pump2: b & bits::PUMP2 != 0,
            valve: b & bits::VALVE != 0,
            heater_wanted: b & bits::HEATER != 0,
            heater_forced: b & bits::HEATER_FORCED != 0,
            hp_low: b & bits::HP_LOW != 0,
            hp_high: b & bits::HP_HIGH != 0,
        }
    }

    /// Monotone OR with another desired state: bits are only ever added.
    pub fn merge(&mut self, other: DesiredState) {
        self.pump1 |= other.pump1;
        self.pump2 |= other.pump2;
        self.valve |= other.valve;
        self.heater_wanted |= other.heater_wanted;
        self.heater_forced |= other.heater_forced;
        self.hp_low |= other.hp_low;
        self.hp_high |= other.hp_high;
    }

    /// Count of requested big consumers (heater counts once, forced or not).
    pub fn big_consumers_requested(self) -> u8 {
        (self.heater_wanted || self.heater_forced) as u8 + self.hp_low as u8 + self.hp_high as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip() {
        for b in 0..128u8 {
            assert_eq!(DesiredState::from_bits(b).to_bits(), b);
        }
    }

    #[test]
    fn merge_is_monotone() {
        let mut a = DesiredState {
            pump1: true,
            ..DesiredState::OFF
        };
        let b = DesiredState {
            valve: true,
            hp_low: true,
            ..DesiredState::OFF
        };
        a.merge(b);
        assert!(a.pump1 && a.valve && a.hp_low);
        // Merging OFF never clears anything.
        a.merge(DesiredState::OFF);
        assert!(a.pump1 && a.valve && a.hp_low);
    }

    #[test]
    fn big_consumer_count() {
        let s = DesiredState {
            heater_wanted: true,
            hp_low: true,
            hp_high: true,
            ..DesiredState::OFF
        };
        assert_eq!(s.big_consumers_requested(), 3);
        assert_eq!(DesiredState::EVACUATE.big_consumers_requested(), 0);
    }
}

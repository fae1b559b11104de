//! Heat-pump handshake over the four-wire comms port.
//!
//! Two input lines report the pump's readiness; two output lines carry our
//! stage request. The bit layout is fixed by the installed hardware.

use crate::state::DesiredState;

/// Decoded input lines.
///
/// `ready` means the pump accepts a new stage start; `release` means it
/// permits a running stage to stop. Both low is the pump's fault state and
/// blocks all transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommsStatus {
    pub ready: bool,
    pub release: bool,
}

impl CommsStatus {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            ready: bits & 0b01 != 0,
            release: bits & 0b10 != 0,
        }
    }
}

/// Encode the outgoing stage request.
///
/// Value 3 is the inhibit code: sent while on battery and held for a short
/// settle window after grid power returns, so the pump never sees a start
/// request that the power budget would immediately revoke.
pub fn encode_request(desired: &DesiredState, on_battery: bool, grid_settle_cycles: u64) -> u8 {
    if on_battery || grid_settle_cycles < 13 {
        3
    } else if desired.hp_high {
        2
    } else if desired.hp_low {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_decodes_both_lines() {
        assert_eq!(CommsStatus::from_bits(0), CommsStatus::default());
        assert!(CommsStatus::from_bits(1).ready);
        assert!(!CommsStatus::from_bits(1).release);
        assert!(CommsStatus::from_bits(2).release);
        assert!(CommsStatus::from_bits(3).ready && CommsStatus::from_bits(3).release);
    }

    #[test]
    fn battery_forces_inhibit() {
        let d = DesiredState {
            hp_high: true,
            ..DesiredState::OFF
        };
        assert_eq!(encode_request(&d, true, 1000), 3);
    }

    #[test]
    fn grid_settle_holds_inhibit() {
        let d = DesiredState::OFF;
        assert_eq!(encode_request(&d, false, 0), 3);
        assert_eq!(encode_request(&d, false, 12), 3);
        assert_eq!(encode_request(&d, false, 13), 0);
    }

    #[test]
    fn stage_request_prefers_high() {
        let mut d = DesiredState::OFF;
        d.hp_low = true;
        assert_eq!(encode_request(&d, false, 100), 1);
        d.hp_high = true;
        assert_eq!(encode_request(&d, false, 100), 2);
    }
}

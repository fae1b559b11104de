//! Range clamping for configuration snapshots.
//!
//! Invalid values are silently corrected, not rejected; each correction is
//! logged so an operator can spot a bad file.

use crate::schema::{Config, PinAssignment};
use tracing::warn;

/// Clamp every field of the snapshot into its safe range, in place.
pub fn clamp_config(cfg: &mut Config) {
    cfg.wanted_temp = clamp_f64("wanted_temp", cfg.wanted_temp, 25.0, 52.0);
    cfg.abs_max_temp = clamp_f64("abs_max_temp", cfg.abs_max_temp, 40.0, 70.0);
    // The ceiling must leave headroom above the wanted temperature.
    let floor = cfg.wanted_temp + 3.0;
    if cfg.abs_max_temp < floor {
        warn!(
            value = cfg.abs_max_temp,
            corrected = floor,
            "abs_max_temp below wanted_temp + 3, corrected"
        );
        cfg.abs_max_temp = floor;
    }
    cfg.counter_reset_day = clamp_u32("counter_reset_day", cfg.counter_reset_day, 1, 28);
    cfg.max_big_consumers = clamp_u8("max_big_consumers", cfg.max_big_consumers, 1, 3);

    clamp_pins(&mut cfg.pins);
}

fn clamp_pins(pins: &mut PinAssignment) {
    for (name, pin) in [
        ("battery", &mut pins.battery),
        ("pump1", &mut pins.pump1),
        ("pump2", &mut pins.pump2),
        ("valve", &mut pins.valve),
        ("heater", &mut pins.heater),
        ("comms1", &mut pins.comms1),
        ("comms2", &mut pins.comms2),
        ("comms3", &mut pins.comms3),
        ("comms4", &mut pins.comms4),
    ] {
        let clamped = (*pin).clamp(4, 27);
        if clamped != *pin {
            warn!(pin = name, value = *pin, corrected = clamped, "GPIO pin out of range, corrected");
            *pin = clamped;
        }
    }

    let all = pins.all();
    let mut sorted = all;
    sorted.sort_unstable();
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        warn!("GPIO pin assigned more than once, falling back to default pins");
        *pins = PinAssignment::default();
    }
}

fn clamp_f64(name: &str, value: f64, min: f64, max: f64) -> f64 {
    let clamped = if value.is_finite() { value.clamp(min, max) } else { min };
    if clamped != value {
        warn!(field = name, value, corrected = clamped, "config value out of range, corrected");
    }
    clamped
}

fn clamp_u32(name: &str, value: u32, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(field = name, value, corrected = clamped, "config value out of range, corrected");
    }
    clamped
}

fn clamp_u8(name: &str, value: u8, min: u8, max: u8) -> u8 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(field = name, value, corrected = clamped, "config value out of range, corrected");
    }
    clamped
}

//! Sensor validation and smoothing.
//!
//! Each channel keeps its last two accepted readings and an error streak.
//! A single bad read is recovered locally; a streak longer than
//! [`ERROR_STREAK_LIMIT`] cycles is fatal and must trigger an orderly
//! shutdown by the caller.

use crate::error::{ControlError, ControlResult};
use tracing::warn;
use wf_core::SensorId;

/// Maximum accepted change between consecutive readings, °C per cycle.
pub const MAX_TEMP_DIFF: f64 = 7.0;

/// Sentinel for "no reading yet" / unreadable channel.
pub const UNKNOWN_TEMP: f64 = -200.0;

/// Streak value above which a channel is declared dead.
pub const ERROR_STREAK_LIMIT: u16 = 5;

/// Channels start with their streak pre-loaded near the trip threshold so a
/// cold start without sensors fails within a few cycles.
const ERROR_STREAK_SEED: u16 = 3;

/// Number of startup cycles during which readings seed the history
/// directly, bypassing the slew limiter.
const SEED_CYCLES: u8 = 4;

#[derive(Clone, Copy, Debug)]
struct ChannelState {
    current: f64,
    previous: f64,
    error_streak: u16,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            current: UNKNOWN_TEMP,
            previous: UNKNOWN_TEMP,
            error_streak: ERROR_STREAK_SEED,
        }
    }
}

/// Validates and smooths raw sensor samples, one instance per installation.
#[derive(Clone, Debug)]
pub struct SensorFilter {
    channels: [ChannelState; SensorId::COUNT],
    seed_cycles_left: u8,
}

impl Default for SensorFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorFilter {
    pub fn new() -> Self {
        Self {
            channels: [ChannelState::default(); SensorId::COUNT],
            seed_cycles_left: SEED_CYCLES,
        }
    }

    /// Re-enter the seeding window (config hot-reload may have swapped
    /// sensor paths underneath us).
    pub fn reseed(&mut self) {
        self.seed_cycles_left = 1;
    }

    /// Feed one raw sample for a channel; returns the accepted value.
    ///
    /// `None` marks an unreadable channel: the streak grows and the last
    /// accepted value stands. A reading that jumps more than twice
    /// [`MAX_TEMP_DIFF`] is treated as noise, replaced by the previous
    /// value, and still counted against the streak. Anything else is
    /// slew-limited to `previous ± MAX_TEMP_DIFF`.
    pub fn accept(&mut self, id: SensorId, raw: Option<f64>) -> f64 {
        let seeding = self.seed_cycles_left > 0;
        let ch = &mut self.channels[id.index()];
        let raw = match raw {
            Some(v) if v.is_finite() => v,
            _ => {
                ch.error_streak += 1;
                warn!(
                    channel = %id,
                    streak = ch.error_streak,
                    "sensor unreadable, keeping last accepted value"
                );
                return ch.current;
            }
        };

        if seeding {
            ch.previous = raw;
            ch.current = raw;
            ch.error_streak = ch.error_streak.saturating_sub(1);
            return raw;
        }

        let diff = raw - ch.current;
        if diff.abs() > 2.0 * MAX_TEMP_DIFF {
            // Gross outlier: discard outright, but count the discard.
            ch.error_streak += 1;
            warn!(
                channel = %id,
                raw,
                last = ch.current,
                "discarding implausible reading"
            );
            return ch.current;
        }

        ch.error_streak = ch.error_streak.saturating_sub(1);
        let accepted = if diff > MAX_TEMP_DIFF {
            let corrected = ch.current + MAX_TEMP_DIFF;
            warn!(channel = %id, raw, corrected, "correcting HIGH reading");
            corrected
        } else if diff < -MAX_TEMP_DIFF {
            let corrected = ch.current - MAX_TEMP_DIFF;
            warn!(channel = %id, raw, corrected, "correcting LOW reading");
            corrected
        } else {
            raw
        };
        ch.previous = ch.current;
        ch.current = accepted;
        accepted
    }

    /// Fatal-fault check, called once per cycle after all channels are fed.
    pub fn check_health(&self) -> ControlResult<()> {
        for id in SensorId::ALL {
            let streak = self.channels[id.index()].error_streak;
            if streak > ERROR_STREAK_LIMIT {
                return Err(ControlError::SensorFault { channel: id, streak });
            }
        }
        Ok(())
    }

    /// End-of-cycle housekeeping: consume one seeding cycle if any remain.
    pub fn tick(&mut self) {
        self.seed_cycles_left = self.seed_cycles_left.saturating_sub(1);
    }

    /// Last accepted reading for a channel.
    pub fn current(&self, id: SensorId) -> f64 {
        self.channels[id.index()].current
    }

    /// Accepted reading from the cycle before last.
    pub fn previous(&self, id: SensorId) -> f64 {
        self.channels[id.index()].previous
    }

    /// Per-cycle change of the accepted reading.
    pub fn delta(&self, id: SensorId) -> f64 {
        let ch = &self.channels[id.index()];
        ch.current - ch.previous
    }

    pub fn error_streak(&self, id: SensorId) -> u16 {
        self.channels[id.index()].error_streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(value: f64) -> SensorFilter {
        let mut f = SensorFilter::new();
        for _ in 0..SEED_CYCLES {
            for id in SensorId::ALL {
                f.accept(id, Some(value));
            }
            f.tick();
        }
        f
    }

    #[test]
    fn seeding_bypasses_clamp() {
        let mut f = SensorFilter::new();
        let v = f.accept(SensorId::Furnace, Some(55.5));
        assert_eq!(v, 55.5);
        assert_eq!(f.previous(SensorId::Furnace), 55.5);
    }

    #[test]
    fn slew_limited_high() {
        let mut f = seeded(20.0);
        let v = f.accept(SensorId::Furnace, Some(30.0));
        assert_eq!(v, 27.0);
        assert_eq!(f.previous(SensorId::Furnace), 20.0);
    }

    #[test]
    fn slew_limited_low() {
        let mut f = seeded(20.0);
        let v = f.accept(SensorId::Outdoor, Some(5.0));
        assert_eq!(v, 13.0);
    }

    #[test]
    fn gross_outlier_reuses_previous() {
        let mut f = seeded(20.0);
        let v = f.accept(SensorId::Collector, Some(90.0));
        assert_eq!(v, 20.0);
        assert_eq!(f.error_streak(SensorId::Collector), 1);
    }

    #[test]
    fn unavailable_grows_streak_until_fatal() {
        let mut f = seeded(20.0);
        // Streak was decremented to zero while seeding with good reads.
        assert_eq!(f.error_streak(SensorId::Furnace), 0);
        for i in 1..=ERROR_STREAK_LIMIT {
            f.accept(SensorId::Furnace, None);
            assert_eq!(f.error_streak(SensorId::Furnace), i);
            assert!(f.check_health().is_ok());
        }
        f.accept(SensorId::Furnace, None);
        let err = f.check_health().unwrap_err();
        assert_eq!(
            err,
            ControlError::SensorFault {
                channel: SensorId::Furnace,
                streak: 6
            }
        );
    }

    #[test]
    fn cold_start_without_sensors_fails_fast() {
        let mut f = SensorFilter::new();
        // Streak is pre-loaded: three bad cycles are enough from scratch.
        for _ in 0..3 {
            for id in SensorId::ALL {
                f.accept(id, None);
            }
            f.tick();
        }
        assert!(f.check_health().is_err());
    }

    #[test]
    fn good_reads_recover_streak() {
        let mut f = seeded(20.0);
        f.accept(SensorId::Furnace, None);
        f.accept(SensorId::Furnace, None);
        assert_eq!(f.error_streak(SensorId::Furnace), 2);
        f.accept(SensorId::Furnace, Some(20.5));
        assert_eq!(f.error_streak(SensorId::Furnace), 1);
        f.accept(SensorId::Furnace, Some(20.5));
        assert_eq!(f.error_streak(SensorId::Furnace), 0);
        // Floor at zero.
        f.accept(SensorId::Furnace, Some(20.5));
        assert_eq!(f.error_streak(SensorId::Furnace), 0);
    }

    #[test]
    fn reseed_reopens_the_seed_window() {
        let mut f = seeded(20.0);
        // A swapped probe reporting 60 °C is an outlier under normal rules.
        assert_eq!(f.accept(SensorId::Furnace, Some(60.0)), 20.0);
        f.reseed();
        assert_eq!(f.accept(SensorId::Furnace, Some(60.0)), 60.0);
        f.tick();
        // The window is a single cycle; the limiter is back afterwards.
        assert_eq!(f.accept(SensorId::Furnace, Some(48.0)), 53.0);
    }

    #[test]
    fn non_finite_counts_as_unreadable() {
        let mut f = seeded(20.0);
        f.accept(SensorId::Furnace, Some(f64::NAN));
        assert_eq!(f.error_streak(SensorId::Furnace), 1);
        assert_eq!(f.current(SensorId::Furnace), 20.0);
    }
}

//! Control-cycle time constants.
//!
//! The control loop runs once per `CYCLE_SECONDS` wall-clock seconds; all
//! dwell times and schedules in the engine are expressed in whole cycles.

/// Nominal length of one control cycle, seconds.
pub const CYCLE_SECONDS: u64 = 10;

/// Cycles per minute of wall-clock time.
pub const CYCLES_PER_MINUTE: u64 = 60 / CYCLE_SECONDS;

/// Cycles per hour of wall-clock time.
pub const CYCLES_PER_HOUR: u64 = 60 * CYCLES_PER_MINUTE;

/// Expensive schedule fields are refreshed on this cadence (5 minutes).
pub const SCHEDULE_REFRESH_CYCLES: u64 = 5 * CYCLES_PER_MINUTE;

/// Convert whole minutes to cycles.
pub const fn minutes(m: u64) -> u64 {
    m * CYCLES_PER_MINUTE
}

/// Convert whole hours to cycles.
pub const fn hours(h: u64) -> u64 {
    h * CYCLES_PER_HOUR
}

/// Convert whole days to cycles.
pub const fn days(d: u64) -> u64 {
    d * 24 * CYCLES_PER_HOUR
}

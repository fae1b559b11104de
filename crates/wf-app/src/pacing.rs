//! Cycle pacing.

use std::time::Duration;
use wf_core::cycle::CYCLE_SECONDS;

/// Processing longer than this means the clock jumped or the box stalled;
/// the usual subtraction would produce nonsense.
const SKEW_THRESHOLD: Duration = Duration::from_secs(12);
/// Fallback sleep used after a skewed cycle.
const SKEW_SLEEP: Duration = Duration::from_secs(7);

/// How long to sleep after a cycle that took `elapsed` to process.
pub fn sleep_after_cycle(elapsed: Duration) -> Duration {
    let period = Duration::from_secs(CYCLE_SECONDS);
    if elapsed > SKEW_THRESHOLD {
        SKEW_SLEEP
    } else {
        period.saturating_sub(elapsed)
    }
}

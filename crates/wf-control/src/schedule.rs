//! Time-of-day scheduling and furnace-water target temperature.
//!
//! The scheduler derives hour/minute/month from the wall clock, keeps the
//! seasonal night-tariff window current, and computes the target furnace
//! water temperature from an hour-indexed curve with outdoor compensation.
//! Expensive fields are recomputed only on the 5-minute refresh cadence;
//! the rolling outdoor average is fed every cycle.

use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::info;
use wf_config::{Config, TargetPolicy};

/// Samples in the rolling outdoor-temperature average (~2 minutes).
const OUTDOOR_RING_LEN: usize = 12;

/// Hour-indexed base targets for heating season, °C (24:00 == 0).
const CURVE_HEAT: [f64; 24] = [
    26.0, 26.0, 26.0, 26.0, 26.0, 26.0, 32.0, 32.0, 32.0, 32.0, 32.0, 32.0, 32.0, 32.0, 32.0,
    32.0, 32.0, 32.0, 32.0, 32.0, 32.0, 32.0, 32.0, 26.0,
];

/// Hour-indexed base targets for cooling season, °C.
const CURVE_COOL: [f64; 24] = [15.0; 24];

/// Hour of the once-per-day solar pump run, indexed by month (1..=12).
const SOLAR_RUN_HOUR: [u32; 12] = [14, 13, 12, 11, 10, 9, 9, 10, 11, 12, 13, 14];

/// Night-tariff window: active from `start` through midnight to `stop`
/// inclusive ([start..24) ∪ [0..=stop] in hours).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NightWindow {
    pub start: u32,
    pub stop: u32,
}

impl NightWindow {
    pub fn contains(self, hour: u32) -> bool {
        hour >= self.start || hour <= self.stop
    }
}

/// Whether the installation is heating or cooling the house loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThermalMode {
    #[default]
    Heat,
    Cool,
}

/// Wall-clock derived context, recomputed in place; never persisted.
#[derive(Clone, Copy, Debug)]
pub struct ScheduleContext {
    pub hour: u32,
    pub minute: u32,
    pub month: u32,
    pub day_of_month: u32,
    pub night: NightWindow,
    /// Target furnace water temperature, °C.
    pub target: f64,
    /// Rolling average of the outdoor channel, °C.
    pub outdoor_avg: f64,
    pub mode: ThermalMode,
}

impl Default for ScheduleContext {
    fn default() -> Self {
        Self {
            hour: 0,
            minute: 0,
            month: 1,
            day_of_month: 1,
            night: NightWindow { start: 20, stop: 11 },
            target: 22.33,
            outdoor_avg: 20.0,
            mode: ThermalMode::Heat,
        }
    }
}

impl ScheduleContext {
    pub fn night_tariff_now(&self) -> bool {
        self.night.contains(self.hour)
    }

    /// Hour of the daily solar pump housekeeping run for the current month.
    pub fn solar_run_hour(&self) -> u32 {
        SOLAR_RUN_HOUR[(self.month.clamp(1, 12) - 1) as usize]
    }

    /// Outdoor average lies in the range where heat-pump heating pays off.
    pub fn heat_pump_may_heat(&self) -> bool {
        self.outdoor_avg > -2.5 && self.outdoor_avg < 16.0
    }

    /// Outdoor average is high enough that cooling is meaningful.
    pub fn heat_pump_may_cool(&self) -> bool {
        self.outdoor_avg > 28.0
    }
}

/// What a refresh noticed besides updating the context.
#[derive(Clone, Copy, Debug, Default)]
pub struct RefreshOutcome {
    /// Today is the configured counter-reset day; checked once per day
    /// during the 08:00 refresh.
    pub counter_reset_due: bool,
}

/// Owns the schedule context and the outdoor rolling average.
#[derive(Clone, Debug)]
pub struct TimeScheduler {
    ctx: ScheduleContext,
    ring: [f64; OUTDOOR_RING_LEN],
    ring_idx: usize,
    last_outdoor: f64,
    last_reset_check_day: Option<u32>,
}

impl Default for TimeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeScheduler {
    pub fn new() -> Self {
        Self {
            ctx: ScheduleContext::default(),
            ring: [20.0; OUTDOOR_RING_LEN],
            ring_idx: 0,
            last_outdoor: 20.0,
            last_reset_check_day: None,
        }
    }

    pub fn context(&self) -> &ScheduleContext {
        &self.ctx
    }

    /// Feed the accepted outdoor reading; called once per cycle.
    pub fn note_outdoor(&mut self, temp: f64) {
        self.ring_idx = (self.ring_idx + 1) % OUTDOOR_RING_LEN;
        self.ring[self.ring_idx] = temp;
        self.last_outdoor = temp;
        self.ctx.outdoor_avg = self.ring.iter().sum::<f64>() / OUTDOOR_RING_LEN as f64;
    }

    /// Recompute wall-clock fields, the night window and the target
    /// temperature. Called on startup, on config reload, and every 5 min.
    pub fn refresh(&mut self, now: NaiveDateTime, cfg: &Config) -> RefreshOutcome {
        self.ctx.hour = now.hour();
        self.ctx.minute = now.minute();
        self.ctx.month = now.month();
        self.ctx.day_of_month = now.day();

        self.adjust_night_window();

        self.ctx.mode = if self.ctx.outdoor_avg > 23.0 {
            ThermalMode::Cool
        } else {
            ThermalMode::Heat
        };
        self.ctx.target = self.compute_target(cfg);

        let mut outcome = RefreshOutcome::default();
        // Counter-reset bookkeeping happens once per day, at 8-something.
        if self.ctx.hour == 8 && self.last_reset_check_day != Some(self.ctx.day_of_month) {
            self.last_reset_check_day = Some(self.ctx.day_of_month);
            outcome.counter_reset_due = self.ctx.day_of_month == cfg.counter_reset_day;
        }
        outcome
    }

    fn adjust_night_window(&mut self) {
        let window = if (4..=10).contains(&self.ctx.month) {
            // April through October: 23:00 till 6:59.
            NightWindow { start: 23, stop: 6 }
        } else {
            // November through March: 22:00 till 5:59.
            NightWindow { start: 22, stop: 5 }
        };
        if window != self.ctx.night {
            self.ctx.night = window;
            info!(
                start = window.start,
                stop = window.stop,
                "adjusted night energy hours"
            );
        }
    }

    fn compute_target(&self, cfg: &Config) -> f64 {
        let curve: &[f64; 24] = match self.ctx.mode {
            ThermalMode::Heat => &CURVE_HEAT,
            ThermalMode::Cool => &CURVE_COOL,
        };
        let hour = self.ctx.hour as usize % 24;
        let base = curve[hour];
        match cfg.target_policy {
            TargetPolicy::CurveAveraged => {
                // Slide between this hour's base and the next, then apply a
                // smooth correction from the outdoor average.
                let next = curve[(hour + 1) % 24];
                let fraction = self.ctx.minute as f64 / 60.0;
                let mut target = base + fraction * (next - base);
                if self.ctx.outdoor_avg > -25.0 && self.ctx.outdoor_avg < 17.0 {
                    target -= (self.ctx.outdoor_avg - 10.0) * 0.2;
                }
                target
            }
            TargetPolicy::CurveInstant => {
                if self.last_outdoor > -30.0 && self.last_outdoor < 50.0 {
                    base - self.last_outdoor
                } else {
                    base
                }
            }
        }
    }
}

//! The actuator hysteresis state machine.
//!
//! Every actuator carries its on/off state and a counter of cycles since
//! its last transition. Transitions happen only through the guarded
//! `turn_on`/`turn_off` paths, so minimum dwell times are honored
//! everywhere. The cycle ordering is load-bearing: decide, apply, then
//! increment all counters exactly once — guards always see "cycles since
//! transition" as of the start of the current cycle.

use crate::comms::CommsStatus;
use crate::state::DesiredState;
use tracing::debug;
use wf_core::ActuatorId;

/// Dwell thresholds in cycles (1 cycle ≈ 10 s). Counters must exceed the
/// threshold (strictly) for the guard to open. Defaults reflect the
/// reference installation; deployments tune them in place of code edits.
#[derive(Clone, Copy, Debug)]
pub struct DwellSettings {
    pub pump1_min_off: u64,
    pub pump1_min_on: u64,
    pub pump2_min_off: u64,
    pub pump2_min_on: u64,
    pub valve_min_off: u64,
    /// Intentionally long: valve actuation is slow and chatter damages it.
    pub valve_min_on: u64,
    /// Prevents rapid re-strike of the immersion heater.
    pub heater_min_off: u64,
    /// Minimum heater run time once lit.
    pub heater_min_on: u64,
    /// Cycles a heat-pump stage must be settled before the heater may light.
    pub stage_settle: u64,
    /// Cycles the heater must be settled before a stage may start.
    pub heater_settle: u64,
    /// Cycles the low stage must be on before the high stage may join.
    pub hp_low_settle_for_high: u64,
    /// Cycles the high stage must be settled before the low stage may stop.
    pub hp_high_settle_for_low_off: u64,
    /// Battery fast-release: the heater counter is raised to
    /// `heater_min_on - fast_release_margin` so the off-guard becomes
    /// satisfiable shortly after grid power returns.
    pub fast_release_margin: u64,
}

impl Default for DwellSettings {
    fn default() -> Self {
        Self {
            pump1_min_off: 2,
            pump1_min_on: 5,
            pump2_min_off: 2,
            pump2_min_on: 5,
            valve_min_off: 5,
            valve_min_on: 17,
            heater_min_off: 29,
            heater_min_on: 120,
            stage_settle: 2,
            heater_settle: 2,
            hp_low_settle_for_high: 3,
            hp_high_settle_for_low_off: 5,
            fast_release_margin: 6,
        }
    }
}

/// Everything the guards need beyond the registry's own state.
#[derive(Clone, Copy, Debug)]
pub struct GuardContext {
    pub use_pump1: bool,
    pub use_pump2: bool,
    pub heater_allowed_night: bool,
    pub heater_allowed_day: bool,
    pub night_tariff_now: bool,
    pub comms: CommsStatus,
}

impl GuardContext {
    fn heater_allowed_now(&self) -> bool {
        if self.night_tariff_now {
            self.heater_allowed_night
        } else {
            self.heater_allowed_day
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ActuatorState {
    is_on: bool,
    cycles_since_transition: u64,
}

/// Owns all actuator state; the only mutation path for on/off decisions.
#[derive(Clone, Debug)]
pub struct ActuatorRegistry {
    states: [ActuatorState; ActuatorId::COUNT],
    dwell: DwellSettings,
}

/// Counter seeds at process start: large enough that a cold start is not
/// blocked by dwell guards, except the heat-pump stages which get a short
/// settling period after every daemon restart.
const STARTUP_CYCLES: [u64; ActuatorId::COUNT] = [150_000, 150_000, 2_200, 2_200, 32, 32];

impl ActuatorRegistry {
    pub fn new(dwell: DwellSettings) -> Self {
        let mut states = [ActuatorState {
            is_on: false,
            cycles_since_transition: 0,
        }; ActuatorId::COUNT];
        for id in ActuatorId::ALL {
            states[id.index()].cycles_since_transition = STARTUP_CYCLES[id.index()];
        }
        Self { states, dwell }
    }

    pub fn dwell(&self) -> &DwellSettings {
        &self.dwell
    }

    pub fn is_on(&self, id: ActuatorId) -> bool {
        self.states[id.index()].is_on
    }

    pub fn cycles(&self, id: ActuatorId) -> u64 {
        self.states[id.index()].cycles_since_transition
    }

    /// Actual state as a wire bitmask (heater-forced bit never set here).
    pub fn to_bits(&self) -> u8 {
        let mut s = DesiredState::OFF;
        s.pump1 = self.is_on(ActuatorId::FurnacePump);
        s.pump2 = self.is_on(ActuatorId::SolarPump);
        s.valve = self.is_on(ActuatorId::Valve);
        s.heater_wanted = self.is_on(ActuatorId::Heater);
        s.hp_low = self.is_on(ActuatorId::HeatPumpLow);
        s.hp_high = self.is_on(ActuatorId::HeatPumpHigh);
        s.to_bits()
    }

    pub fn can_turn_on(&self, id: ActuatorId, ctx: &GuardContext) -> bool {
        let d = &self.dwell;
        if self.is_on(id) {
            return false;
        }
        match id {
            ActuatorId::FurnacePump => ctx.use_pump1 && self.cycles(id) > d.pump1_min_off,
            ActuatorId::SolarPump => ctx.use_pump2 && self.cycles(id) > d.pump2_min_off,
            ActuatorId::Valve => self.cycles(id) > d.valve_min_off,
            ActuatorId::Heater => {
                self.cycles(id) >= d.heater_min_off
                    && self.cycles(ActuatorId::HeatPumpLow) >= d.stage_settle
                    && self.cycles(ActuatorId::HeatPumpHigh) >= d.stage_settle
                    && ctx.heater_allowed_now()
            }
            ActuatorId::HeatPumpLow => {
                self.is_on(ActuatorId::FurnacePump)
                    && self.cycles(ActuatorId::Heater) > d.heater_settle
                    && ctx.comms.ready
            }
            ActuatorId::HeatPumpHigh => {
                self.is_on(ActuatorId::HeatPumpLow)
                    && self.cycles(ActuatorId::HeatPumpLow) > d.hp_low_settle_for_high
                    && self.cycles(ActuatorId::Heater) > d.heater_settle
                    && ctx.comms.ready
            }
        }
    }

    pub fn can_turn_off(&self, id: ActuatorId, ctx: &GuardContext) -> bool {
        let d = &self.dwell;
        if !self.is_on(id) {
            return false;
        }
        match id {
            ActuatorId::FurnacePump => {
                !self.is_on(ActuatorId::Valve)
                    && !self.is_on(ActuatorId::HeatPumpLow)
                    && self.cycles(id) > d.pump1_min_on
                    && self.cycles(ActuatorId::Valve) > d.pump1_min_on
            }
            ActuatorId::SolarPump => self.cycles(id) > d.pump2_min_on,
            ActuatorId::Valve => self.cycles(id) > d.valve_min_on,
            ActuatorId::Heater => self.cycles(id) > d.heater_min_on,
            ActuatorId::HeatPumpLow => {
                !self.is_on(ActuatorId::HeatPumpHigh)
                    && self.cycles(ActuatorId::HeatPumpHigh) > d.hp_high_settle_for_low_off
                    && ctx.comms.release
            }
            ActuatorId::HeatPumpHigh => ctx.comms.release,
        }
    }

    /// Unguarded transition; resets the dwell counter. Only `apply` and the
    /// battery override should reach for these directly.
    pub fn turn_on(&mut self, id: ActuatorId) {
        let st = &mut self.states[id.index()];
        st.is_on = true;
        st.cycles_since_transition = 0;
    }

    pub fn turn_off(&mut self, id: ActuatorId) {
        let st = &mut self.states[id.index()];
        st.is_on = false;
        st.cycles_since_transition = 0;
    }

    /// Apply a desired state through the guards. Returns the actuators
    /// whose externally-visible state changed (hardware writes fire only
    /// for these). Does not advance counters; call [`tick`] afterwards.
    ///
    /// [`tick`]: ActuatorRegistry::tick
    pub fn apply(&mut self, desired: &DesiredState, ctx: &GuardContext) -> Vec<ActuatorId> {
        let before: Vec<bool> = ActuatorId::ALL.iter().map(|&id| self.is_on(id)).collect();

        self.apply_bit(ActuatorId::FurnacePump, desired.pump1, ctx);
        self.apply_bit(ActuatorId::SolarPump, desired.pump2, ctx);
        self.apply_bit(ActuatorId::Valve, desired.valve, ctx);

        // The heater has a third, forced path that bypasses its on-guard.
        if desired.heater_forced {
            if !self.is_on(ActuatorId::Heater) {
                self.turn_on(ActuatorId::Heater);
            }
        } else if desired.heater_wanted {
            if self.can_turn_on(ActuatorId::Heater, ctx) {
                self.turn_on(ActuatorId::Heater);
            }
        } else if self.can_turn_off(ActuatorId::Heater, ctx) {
            self.turn_off(ActuatorId::Heater);
        }

        self.apply_bit(ActuatorId::HeatPumpLow, desired.hp_low, ctx);
        self.apply_bit(ActuatorId::HeatPumpHigh, desired.hp_high, ctx);

        ActuatorId::ALL
            .iter()
            .copied()
            .filter(|&id| self.is_on(id) != before[id.index()])
            .inspect(|&id| {
                debug!(actuator = %id, on = self.is_on(id), "actuator transition");
            })
            .collect()
    }

    fn apply_bit(&mut self, id: ActuatorId, wanted: bool, ctx: &GuardContext) {
        if wanted {
            if self.can_turn_on(id, ctx) {
                self.turn_on(id);
            }
        } else if self.can_turn_off(id, ctx) {
            self.turn_off(id);
        }
    }

    /// Advance every dwell counter by one cycle. Called exactly once per
    /// cycle, after the decision has been applied.
    pub fn tick(&mut self) {
        for st in &mut self.states {
            st.cycles_since_transition += 1;
        }
    }

    /// Battery fast-release: raise the heater's counter so its off-guard is
    /// satisfiable within `fast_release_margin` cycles, without touching a
    /// counter that is already past that point.
    pub fn fast_release_heater(&mut self) {
        let floor = self
            .dwell
            .heater_min_on
            .saturating_sub(self.dwell.fast_release_margin);
        let st = &mut self.states[ActuatorId::Heater.index()];
        if st.is_on && st.cycles_since_transition < floor {
            st.cycles_since_transition = floor;
        }
    }
}

impl Default for ActuatorRegistry {
    fn default() -> Self {
        Self::new(DwellSettings::default())
    }
}

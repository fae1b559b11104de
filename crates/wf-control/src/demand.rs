//! Demand aggregation.
//!
//! Each rule family may only request actuators, never veto them, so the
//! combined demand is a monotone OR over all families. The dwell guards in
//! the registry and the power-budget arbiter then decide what actually
//! happens. The single exception is the emergency excursion, which replaces
//! the whole decision with an evacuation state.

use crate::filter::SensorFilter;
use crate::registry::ActuatorRegistry;
use crate::schedule::{ScheduleContext, ThermalMode};
use crate::state::DesiredState;
use tracing::{error, info, warn};
use wf_core::cycle::{days, hours, minutes};
use wf_core::{ActuatorId, SensorId};

/// Furnace water above this trips the emergency evacuation.
pub const EMERGENCY_FURNACE: f64 = 68.0;
/// Boiler top above this trips the emergency evacuation.
pub const EMERGENCY_BOILER_TOP: f64 = 71.0;

/// Anti-legionella purge: due after ~30 days of cycles, heats to 67 °C.
pub const LEGIONELLA_DUE_CYCLES: u64 = days(30);
pub const LEGIONELLA_TARGET: f64 = 67.0;

const FREEZE_COLLECTOR: f64 = 4.0;
const FREEZE_OUTDOOR: f64 = 2.0;
const BOIL_COLLECTOR: f64 = 65.0;
const FURNACE_HOT: f64 = 38.0;
const RISE_FAST: f64 = 0.18;
const RISE_WARM: f64 = 0.12;
const COLD_FLUSH_OUTDOOR: f64 = 3.0;
const COLD_FLUSH_IDLE: u64 = minutes(10);
const HP_LOW_COOLDOWN_HOLD: u64 = 15;
const HP_IDLE_CIRCULATION: u64 = 42;
const SOLAR_DAILY_IDLE: u64 = hours(4);
const PUMP1_PERIODIC_IDLE: u64 = hours(2);
const VALVE_ASSIST_PUMP1: u64 = 9;
const VALVE_ASSIST_PUMP2: u64 = 12;

/// Read-only view of everything the rules consult.
pub struct DemandInputs<'a> {
    pub filter: &'a SensorFilter,
    pub schedule: &'a ScheduleContext,
    pub registry: &'a ActuatorRegistry,
    pub wanted_temp: f64,
    pub abs_max_temp: f64,
    pub pump1_always_on: bool,
    pub night_boost: bool,
    pub night_boost_temp: f64,
    pub use_heat_pump: bool,
    /// Cycles since the last completed anti-legionella purge.
    pub legionella_cycles: u64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DemandOutcome {
    pub desired: DesiredState,
    /// Emergency excursion active this cycle.
    pub emergency: bool,
    /// The purge reached its target temperature; reset the counter.
    pub legionella_purge_done: bool,
    /// Purge currently driving the heater.
    pub legionella_active: bool,
}

/// Holds the alarm latch across cycles so the edges can be logged.
#[derive(Clone, Copy, Debug, Default)]
pub struct DemandAggregator {
    alarm: bool,
}

impl DemandAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alarm(&self) -> bool {
        self.alarm
    }

    pub fn compute(&mut self, inp: &DemandInputs<'_>) -> DemandOutcome {
        let furnace = inp.filter.current(SensorId::Furnace);
        let top = inp.filter.current(SensorId::BoilerTop);

        if furnace > EMERGENCY_FURNACE || top > EMERGENCY_BOILER_TOP {
            if !self.alarm {
                error!(furnace, boiler_top = top, "overtemperature, evacuating heat");
                self.alarm = true;
            }
            return DemandOutcome {
                desired: DesiredState::EVACUATE,
                emergency: true,
                ..DemandOutcome::default()
            };
        }
        if self.alarm {
            info!(furnace, boiler_top = top, "overtemperature cleared");
            self.alarm = false;
        }

        let mut desired = DesiredState::OFF;
        desired.merge(self.protection(inp));
        desired.merge(self.furnace_rules(inp));
        desired.merge(self.harvest(inp));
        desired.merge(self.housekeeping(inp));
        let (heater, legionella_active, legionella_purge_done) = self.heater_demand(inp);
        desired.merge(heater);
        desired.merge(self.heat_pump(inp));

        DemandOutcome {
            desired,
            emergency: false,
            legionella_active,
            legionella_purge_done,
        }
    }

    /// Freeze and boil-off protection. These never depend on feature flags.
    fn protection(&self, inp: &DemandInputs<'_>) -> DesiredState {
        let collector = inp.filter.current(SensorId::Collector);
        let outdoor = inp.filter.current(SensorId::Outdoor);
        let reg = inp.registry;
        let mut d = DesiredState::OFF;

        if collector < FREEZE_COLLECTOR && outdoor < FREEZE_OUTDOOR {
            d.pump2 = true;
        }
        if collector > BOIL_COLLECTOR {
            d.valve = true;
            if reg.is_on(ActuatorId::Valve) {
                if reg.cycles(ActuatorId::Valve) >= VALVE_ASSIST_PUMP1 {
                    d.pump1 = true;
                }
                if reg.cycles(ActuatorId::Valve) >= VALVE_ASSIST_PUMP2 {
                    d.pump2 = true;
                }
            }
        }
        d
    }

    fn furnace_rules(&self, inp: &DemandInputs<'_>) -> DesiredState {
        let furnace = inp.filter.current(SensorId::Furnace);
        let rise = inp.filter.delta(SensorId::Furnace);
        let outdoor = inp.filter.current(SensorId::Outdoor);
        let reg = inp.registry;
        let mut d = DesiredState::OFF;

        if furnace > FURNACE_HOT {
            d.pump1 = true;
        }
        if rise > RISE_FAST || (furnace > 20.0 && rise > RISE_WARM) {
            d.pump1 = true;
        }
        let pump1_idle = !reg.is_on(ActuatorId::FurnacePump);
        if pump1_idle && outdoor < COLD_FLUSH_OUTDOOR
            && reg.cycles(ActuatorId::FurnacePump) >= COLD_FLUSH_IDLE
        {
            d.pump1 = true;
        }
        let hp_low_idle = !reg.is_on(ActuatorId::HeatPumpLow);
        if hp_low_idle && reg.cycles(ActuatorId::HeatPumpLow) < HP_LOW_COOLDOWN_HOLD {
            d.pump1 = true;
        }
        if hp_low_idle && reg.cycles(ActuatorId::HeatPumpLow) % HP_IDLE_CIRCULATION == 0 {
            d.pump1 = true;
        }
        d
    }

    /// Move heat into the boiler from the collector and the furnace, gated
    /// on the store being below its absolute ceiling.
    fn harvest(&self, inp: &DemandInputs<'_>) -> DesiredState {
        let collector = inp.filter.current(SensorId::Collector);
        let furnace = inp.filter.current(SensorId::Furnace);
        let top = inp.filter.current(SensorId::BoilerTop);
        let bottom = inp.filter.current(SensorId::BoilerBottom);
        let reg = inp.registry;
        let mut d = DesiredState::OFF;

        // Harvest runs while either sensor still has room; only a store
        // that is full top to bottom blocks it.
        if top >= inp.abs_max_temp && bottom >= inp.abs_max_temp - 2.0 {
            return d;
        }

        if collector > bottom + 12.0 && collector > top - 2.0 {
            d.pump2 = true;
        }
        if reg.is_on(ActuatorId::SolarPump) && collector > bottom + 4.0 {
            d.pump2 = true;
        }

        if furnace > top + 2.0 || furnace > bottom + 4.0 {
            d.valve = true;
        }
        if reg.is_on(ActuatorId::Valve) {
            if furnace > bottom + 3.0 {
                d.valve = true;
            }
            if reg.cycles(ActuatorId::Valve) >= VALVE_ASSIST_PUMP1 {
                d.pump1 = true;
            }
        }
        d
    }

    fn housekeeping(&self, inp: &DemandInputs<'_>) -> DesiredState {
        let reg = inp.registry;
        let mut d = DesiredState::OFF;

        if inp.pump1_always_on {
            d.pump1 = true;
        }
        if !reg.is_on(ActuatorId::FurnacePump)
            && reg.cycles(ActuatorId::FurnacePump) >= PUMP1_PERIODIC_IDLE
        {
            d.pump1 = true;
        }
        if !reg.is_on(ActuatorId::SolarPump)
            && reg.cycles(ActuatorId::SolarPump) >= SOLAR_DAILY_IDLE
            && inp.schedule.hour == inp.schedule.solar_run_hour()
        {
            d.pump2 = true;
        }
        d
    }

    fn heater_demand(&self, inp: &DemandInputs<'_>) -> (DesiredState, bool, bool) {
        let top = inp.filter.current(SensorId::BoilerTop);
        let bottom = inp.filter.current(SensorId::BoilerBottom);
        let reg = inp.registry;
        let mut d = DesiredState::OFF;

        let bottom_margin = if inp.schedule.outdoor_avg < 16.0 { 3.0 } else { 11.0 };
        let needs_heat = top < inp.wanted_temp
            || bottom < inp.wanted_temp - bottom_margin
            || (reg.is_on(ActuatorId::Heater)
                && reg.is_on(ActuatorId::HeatPumpLow)
                && bottom < inp.wanted_temp);
        if needs_heat {
            d.heater_wanted = true;
        }

        if inp.night_boost && inp.schedule.hour == 4 && bottom < inp.night_boost_temp {
            d.heater_wanted = true;
        }

        let mut active = false;
        let mut done = false;
        if inp.legionella_cycles > LEGIONELLA_DUE_CYCLES {
            let hour = inp.schedule.hour;
            // The bottom is the coldest point of the store; the purge only
            // counts once the whole tank has been through the target.
            if hour >= 2 && hour <= inp.schedule.night.stop {
                if bottom >= LEGIONELLA_TARGET {
                    warn!(boiler_bottom = bottom, "anti-legionella purge complete");
                    done = true;
                } else {
                    d.heater_wanted = true;
                    active = true;
                }
            }
        }
        (d, active, done)
    }

    fn heat_pump(&self, inp: &DemandInputs<'_>) -> DesiredState {
        let mut d = DesiredState::OFF;
        if !inp.use_heat_pump {
            return d;
        }
        let allowed = match inp.schedule.mode {
            ThermalMode::Heat => inp.schedule.heat_pump_may_heat(),
            ThermalMode::Cool => inp.schedule.heat_pump_may_cool(),
        };
        if !allowed {
            return d;
        }

        // The pump conditions the furnace loop, not the store, so its
        // staging follows the furnace water against the curve target.
        let water = inp.filter.current(SensorId::Furnace);
        // Deficit is positive when the water needs conditioning, in either
        // mode; the margins below then read the same for heat and cool.
        let deficit = match inp.schedule.mode {
            ThermalMode::Heat => inp.schedule.target - water,
            ThermalMode::Cool => water - inp.schedule.target,
        };
        let reg = inp.registry;

        if reg.is_on(ActuatorId::HeatPumpLow) {
            if deficit > -0.6 {
                d.hp_low = true;
            }
        } else {
            let margin = if reg.cycles(ActuatorId::HeatPumpLow) <= 60 {
                -0.25
            } else {
                -1.12
            };
            if deficit > margin {
                d.hp_low = true;
            }
        }

        if reg.is_on(ActuatorId::HeatPumpHigh) {
            if deficit > -0.5 {
                d.hp_high = true;
            }
        } else if d.hp_low && reg.is_on(ActuatorId::HeatPumpLow) {
            let low_cycles = reg.cycles(ActuatorId::HeatPumpLow);
            if deficit > 1.5
                || (low_cycles > 120 && deficit > 0.8)
                || (low_cycles > 240 && deficit > -0.33)
            {
                d.hp_high = true;
            }
        }
        d
    }
}

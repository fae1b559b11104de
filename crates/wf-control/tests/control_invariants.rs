//! Cross-module invariants for the control crate, driven by proptest
//! where a single scenario would not cover the input space.

use proptest::prelude::*;
use wf_control::{
    arbitrate, ActuatorRegistry, CommsStatus, DesiredState, DwellSettings, GuardContext,
    SensorFilter, MAX_TEMP_DIFF,
};
use wf_core::{ActuatorId, SensorId};

fn ctx() -> GuardContext {
    GuardContext {
        use_pump1: true,
        use_pump2: true,
        heater_allowed_night: true,
        heater_allowed_day: true,
        night_tariff_now: false,
        comms: CommsStatus {
            ready: true,
            release: true,
        },
    }
}

fn seeded_filter() -> SensorFilter {
    let mut f = SensorFilter::new();
    for _ in 0..4 {
        for id in SensorId::ALL {
            f.accept(id, Some(20.0));
        }
        f.tick();
    }
    f
}

proptest! {
    /// Accepted values never jump more than the slew limit per cycle, no
    /// matter what the raw readings do.
    #[test]
    fn filter_bounds_per_cycle_change(raw in prop::collection::vec(
        prop::option::of(-50.0f64..120.0), 1..60,
    )) {
        let mut f = seeded_filter();
        let mut last = f.current(SensorId::Furnace);
        for r in raw {
            let v = f.accept(SensorId::Furnace, r);
            prop_assert!((v - last).abs() <= MAX_TEMP_DIFF + 1e-9);
            last = v;
            f.tick();
        }
    }

    /// Dwell guards hold under arbitrary demand: once past startup, no
    /// actuator's observed on-run or off-run is shorter than its minimum.
    #[test]
    fn registry_honors_minimum_dwell(masks in prop::collection::vec(0u8..128, 1..200)) {
        let mut reg = ActuatorRegistry::new(DwellSettings::default());
        let c = ctx();
        let mut run_len = [0u64; ActuatorId::COUNT];
        let mut prev_on = [false; ActuatorId::COUNT];
        // A run that started before the loop reflects the startup counter
        // seeds, so only runs between two observed transitions count.
        let mut armed = [false; ActuatorId::COUNT];
        for mask in masks {
            let desired = DesiredState::from_bits(mask);
            reg.apply(&desired, &c);
            for id in ActuatorId::ALL {
                let on = reg.is_on(id);
                if on != prev_on[id.index()] && !std::mem::replace(&mut armed[id.index()], true) {
                    run_len[id.index()] = 0;
                } else if armed[id.index()] && on != prev_on[id.index()] {
                    let d = reg.dwell();
                    let min = match (id, prev_on[id.index()]) {
                        (ActuatorId::SolarPump, true) => d.pump2_min_on,
                        (ActuatorId::SolarPump, false) => d.pump2_min_off,
                        (ActuatorId::Valve, true) => d.valve_min_on,
                        (ActuatorId::Valve, false) => d.valve_min_off,
                        (ActuatorId::Heater, true) => d.heater_min_on,
                        _ => 0,
                    };
                    prop_assert!(
                        run_len[id.index()] > min || min == 0,
                        "{id:?} ran {} cycles, minimum {min}",
                        run_len[id.index()],
                    );
                    run_len[id.index()] = 0;
                }
                prev_on[id.index()] = on;
                run_len[id.index()] += 1;
            }
            reg.tick();
        }
    }

    /// The arbiter never grants more big consumers than the budget allows
    /// when nothing is locked on.
    #[test]
    fn arbiter_respects_budget(mask in 0u8..128, budget in 1u8..=3) {
        let mut reg = ActuatorRegistry::new(DwellSettings::default());
        for id in ActuatorId::ALL {
            reg.turn_off(id);
        }
        for _ in 0..300 {
            reg.tick();
        }
        let raw = DesiredState::from_bits(mask & !wf_control::state::bits::HEATER_FORCED);
        let out = arbitrate(&raw, &reg, &ctx(), budget);
        prop_assert!(out.big_consumers_requested() <= budget);
    }

    /// Arbitration only ever removes big-consumer requests, never adds one
    /// that was not demanded (stage-1's forced pump aside).
    #[test]
    fn arbiter_is_a_restriction(mask in 0u8..128, budget in 1u8..=3) {
        let mut reg = ActuatorRegistry::new(DwellSettings::default());
        for id in ActuatorId::ALL {
            reg.turn_off(id);
        }
        for _ in 0..300 {
            reg.tick();
        }
        let raw = DesiredState::from_bits(mask);
        let out = arbitrate(&raw, &reg, &ctx(), budget);
        prop_assert!(!out.heater_wanted || raw.heater_wanted);
        prop_assert!(!out.hp_low || raw.hp_low);
        prop_assert!(!out.hp_high || raw.hp_high);
        prop_assert!(out.pump2 == raw.pump2 && out.valve == raw.valve);
    }
}

#[test]
fn chattering_demand_settles_into_long_runs() {
    // Alternate the solar pump request every cycle; the registry should
    // quantize that into runs no shorter than the dwell minimums.
    let mut reg = ActuatorRegistry::new(DwellSettings::default());
    let c = ctx();
    let mut transitions = 0u32;
    let mut prev = reg.is_on(ActuatorId::SolarPump);
    for cycle in 0..120u64 {
        let desired = DesiredState {
            pump2: cycle % 2 == 0,
            ..DesiredState::OFF
        };
        reg.apply(&desired, &c);
        let on = reg.is_on(ActuatorId::SolarPump);
        if on != prev {
            transitions += 1;
        }
        prev = on;
        reg.tick();
    }
    // 120 cycles with min dwell 5/2 allows at most ~30 transitions; the
    // alternating request must come nowhere near one per cycle.
    assert!(transitions <= 30, "pump chattered: {transitions} transitions");
}

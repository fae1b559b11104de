//! Power-budget arbitration over the three big consumers: the immersion
//! heater and the two heat-pump stages.
//!
//! Arbitration is deterministic with a fixed priority (heater, then
//! stage 1, then stage 2) and never strands a consumer: anything the
//! registry cannot currently turn off keeps its grant even over budget,
//! so the budget converges to the minimum achievable state rather than
//! demanding an impossible one.

use crate::registry::{ActuatorRegistry, GuardContext};
use crate::state::DesiredState;
use wf_core::ActuatorId;

/// Daytime peak hours where the grid contract caps us at one big consumer
/// regardless of configuration.
const PEAK_HOURS: [u32; 4] = [11, 12, 15, 16];

pub fn effective_budget(configured: u8, hour: u32) -> u8 {
    if PEAK_HOURS.contains(&hour) {
        1
    } else {
        configured.clamp(1, 3)
    }
}

/// Rewrite the raw demand so at most `budget` big consumers are granted.
/// Pumps and valve pass through untouched; a granted stage 1 forces the
/// furnace pump on so the stage always has flow.
pub fn arbitrate(
    raw: &DesiredState,
    registry: &ActuatorRegistry,
    ctx: &GuardContext,
    budget: u8,
) -> DesiredState {
    let budget = budget.clamp(1, 3) as usize;

    let locked = |id: ActuatorId| registry.is_on(id) && !registry.can_turn_off(id, ctx);
    let siblings_settled = |id: ActuatorId| {
        ActuatorId::ALL
            .into_iter()
            .filter(|&s| s.is_big_consumer() && s != id)
            .all(|s| registry.cycles(s) >= 1)
    };

    let mut grant_heater = raw.heater_forced || locked(ActuatorId::Heater);
    let mut grant_low = locked(ActuatorId::HeatPumpLow);
    let mut grant_high = locked(ActuatorId::HeatPumpHigh);
    let mut used = [grant_heater, grant_low, grant_high]
        .iter()
        .filter(|&&g| g)
        .count();

    if raw.heater_wanted && !grant_heater && used < budget
        && (budget != 3 || siblings_settled(ActuatorId::Heater))
    {
        grant_heater = true;
        used += 1;
    }
    if raw.hp_low && !grant_low && used < budget
        && (budget != 3 || siblings_settled(ActuatorId::HeatPumpLow))
    {
        grant_low = true;
        used += 1;
    }
    if raw.hp_high && !grant_high && used < budget && grant_low {
        let allowed = match budget {
            1 => false,
            2 => !raw.heater_wanted,
            _ => siblings_settled(ActuatorId::HeatPumpHigh),
        };
        if allowed {
            grant_high = true;
        }
    }

    let mut out = *raw;
    out.heater_wanted = grant_heater && !raw.heater_forced;
    out.heater_forced = raw.heater_forced;
    out.hp_low = grant_low;
    out.hp_high = grant_high;
    if grant_low {
        out.pump1 = true;
    }
    out
}

//! Mains/battery supervision.
//!
//! While the site runs on battery the immersion heater is forced on as a
//! dump load for the inverter and the heat pump is inhibited. When grid
//! power returns we count settle cycles before allowing the pump to start
//! again, and arrange for the heater to release quickly.

use crate::registry::ActuatorRegistry;
use crate::state::DesiredState;
use tracing::info;

#[derive(Clone, Copy, Debug)]
pub struct PowerMonitor {
    on_battery: bool,
    grid_settle_cycles: u64,
}

impl PowerMonitor {
    pub fn new() -> Self {
        Self {
            on_battery: false,
            grid_settle_cycles: u64::MAX,
        }
    }

    pub fn on_battery(&self) -> bool {
        self.on_battery
    }

    /// Cycles since grid power returned; saturated high when we have never
    /// seen a battery episode.
    pub fn grid_settle_cycles(&self) -> u64 {
        self.grid_settle_cycles
    }

    /// Feed the battery sense line for this cycle; logs the edges.
    pub fn update(&mut self, battery_active: bool) {
        if battery_active && !self.on_battery {
            info!("grid lost, running on battery");
        } else if !battery_active && self.on_battery {
            info!("grid power restored");
            self.grid_settle_cycles = 0;
        }
        self.on_battery = battery_active;
    }

    /// Rewrite the cycle's decision for battery operation: heater forced on
    /// through the bypass path, heat pump inhibited. On the battery-to-grid
    /// edge the heater's dwell is shortened so the dump load drops promptly.
    pub fn apply(&self, desired: &mut DesiredState, registry: &mut ActuatorRegistry) {
        if self.on_battery {
            desired.heater_forced = true;
            desired.hp_low = false;
            desired.hp_high = false;
        } else if self.grid_settle_cycles == 0 {
            registry.fast_release_heater();
        }
    }

    pub fn tick(&mut self) {
        if !self.on_battery {
            self.grid_settle_cycles = self.grid_settle_cycles.saturating_add(1);
        }
    }
}

impl Default for PowerMonitor {
    fn default() -> Self {
        Self::new()
    }
}

//! Wh bookkeeping per control cycle.
//!
//! The per-cycle constants come from the installed hardware: nameplate
//! power of each device times the 10 s cycle length. Night-tariff cycles
//! additionally accumulate into a separate counter so the monthly report
//! can split the bill.

use crate::store::EnergySnapshot;
use tracing::info;

/// Wh consumed per cycle while the device is on.
pub const WH_HEATER: f64 = 8.340;
pub const WH_FURNACE_PUMP: f64 = 0.135;
pub const WH_SOLAR_PUMP: f64 = 0.021;
pub const WH_VALVE: f64 = 0.006;
/// The controller board itself, drawn every cycle.
pub const WH_CONTROLLER: f64 = 0.022;

/// What a monthly reset reports before zeroing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonthlyTotals {
    pub total_wh: f64,
    pub nightly_wh: f64,
    pub daily_wh: f64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EnergyMeter {
    total_wh: f64,
    nightly_wh: f64,
    legionella_cycles: u64,
}

impl EnergyMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(s: &EnergySnapshot) -> Self {
        Self {
            total_wh: s.total_wh,
            nightly_wh: s.nightly_wh,
            legionella_cycles: s.legionella_cycles,
        }
    }

    pub fn snapshot(&self) -> EnergySnapshot {
        EnergySnapshot {
            total_wh: self.total_wh,
            nightly_wh: self.nightly_wh,
            legionella_cycles: self.legionella_cycles,
        }
    }

    pub fn total_wh(&self) -> f64 {
        self.total_wh
    }

    pub fn nightly_wh(&self) -> f64 {
        self.nightly_wh
    }

    pub fn legionella_cycles(&self) -> u64 {
        self.legionella_cycles
    }

    /// Account one finished cycle from the actual actuator states.
    pub fn record_cycle(
        &mut self,
        heater_on: bool,
        furnace_pump_on: bool,
        solar_pump_on: bool,
        valve_on: bool,
        night_tariff: bool,
    ) {
        let mut wh = WH_CONTROLLER;
        if heater_on {
            wh += WH_HEATER;
        }
        if furnace_pump_on {
            wh += WH_FURNACE_PUMP;
        }
        if solar_pump_on {
            wh += WH_SOLAR_PUMP;
        }
        if valve_on {
            wh += WH_VALVE;
        }
        self.total_wh += wh;
        if night_tariff {
            self.nightly_wh += wh;
        }
        self.legionella_cycles += 1;
    }

    /// The anti-legionella purge reached its target; restart the interval.
    pub fn legionella_purge_done(&mut self) {
        self.legionella_cycles = 0;
    }

    /// Monthly reset: report and zero the Wh counters. The legionella
    /// interval is independent of the billing month and keeps running.
    pub fn monthly_reset(&mut self) -> MonthlyTotals {
        let totals = MonthlyTotals {
            total_wh: self.total_wh,
            nightly_wh: self.nightly_wh,
            daily_wh: self.total_wh - self.nightly_wh,
        };
        info!(
            total_wh = totals.total_wh,
            nightly_wh = totals.nightly_wh,
            daily_wh = totals.daily_wh,
            "monthly energy counters reset"
        );
        self.total_wh = 0.0;
        self.nightly_wh = 0.0;
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_cycle_charges_only_the_controller() {
        let mut m = EnergyMeter::new();
        m.record_cycle(false, false, false, false, false);
        assert!((m.total_wh() - WH_CONTROLLER).abs() < 1e-12);
        assert_eq!(m.nightly_wh(), 0.0);
    }

    #[test]
    fn heater_dominates_the_cycle_cost() {
        let mut m = EnergyMeter::new();
        m.record_cycle(true, true, true, true, false);
        let expected = WH_CONTROLLER + WH_HEATER + WH_FURNACE_PUMP + WH_SOLAR_PUMP + WH_VALVE;
        assert!((m.total_wh() - expected).abs() < 1e-12);
    }

    #[test]
    fn night_cycles_count_twice() {
        let mut m = EnergyMeter::new();
        m.record_cycle(true, false, false, false, true);
        m.record_cycle(true, false, false, false, false);
        assert!((m.total_wh() - 2.0 * (WH_CONTROLLER + WH_HEATER)).abs() < 1e-12);
        assert!((m.nightly_wh() - (WH_CONTROLLER + WH_HEATER)).abs() < 1e-12);
    }

    #[test]
    fn monthly_reset_reports_and_zeroes() {
        let mut m = EnergyMeter::new();
        m.record_cycle(true, false, false, false, true);
        m.record_cycle(false, true, false, false, false);
        let before = m.total_wh();
        let totals = m.monthly_reset();
        assert_eq!(totals.total_wh, before);
        assert!((totals.daily_wh - (totals.total_wh - totals.nightly_wh)).abs() < 1e-12);
        assert_eq!(m.total_wh(), 0.0);
        assert_eq!(m.nightly_wh(), 0.0);
    }

    #[test]
    fn legionella_interval_survives_monthly_reset() {
        let mut m = EnergyMeter::new();
        m.record_cycle(false, false, false, false, false);
        m.record_cycle(false, false, false, false, false);
        m.monthly_reset();
        assert_eq!(m.legionella_cycles(), 2);
        m.legionella_purge_done();
        assert_eq!(m.legionella_cycles(), 0);
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut m = EnergyMeter::new();
        m.record_cycle(true, true, false, false, true);
        let restored = EnergyMeter::from_snapshot(&m.snapshot());
        assert_eq!(restored.total_wh(), m.total_wh());
        assert_eq!(restored.legionella_cycles(), 1);
    }
}

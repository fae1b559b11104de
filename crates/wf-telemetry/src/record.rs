use serde::{Deserialize, Serialize};

/// Everything worth keeping about one finished control cycle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle: u64,
    /// Local wall-clock time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub furnace_c: f64,
    pub collector_c: f64,
    pub boiler_top_c: f64,
    pub boiler_bottom_c: f64,
    pub outdoor_c: f64,
    pub outdoor_avg_c: f64,
    pub target_c: f64,
    /// Demand after arbitration, as the wire mask.
    pub wanted_bits: u8,
    /// What the registry actually holds on.
    pub actual_bits: u8,
    /// Wanted but denied by guards or budget this cycle.
    pub missed_bits: u8,
    pub alarm: bool,
    pub on_battery: bool,
    pub total_wh: f64,
    pub nightly_wh: f64,
}

impl CycleRecord {
    pub const CSV_HEADER: &'static str = "cycle,timestamp,furnace_c,collector_c,boiler_top_c,\
boiler_bottom_c,outdoor_c,outdoor_avg_c,target_c,wanted_bits,actual_bits,missed_bits,\
alarm,on_battery,total_wh,nightly_wh";

    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{},{},{},{},{},{:.3},{:.3}",
            self.cycle,
            self.timestamp,
            self.furnace_c,
            self.collector_c,
            self.boiler_top_c,
            self.boiler_bottom_c,
            self.outdoor_c,
            self.outdoor_avg_c,
            self.target_c,
            self.wanted_bits,
            self.actual_bits,
            self.missed_bits,
            self.alarm as u8,
            self.on_battery as u8,
            self.total_wh,
            self.nightly_wh,
        )
    }
}

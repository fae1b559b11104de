//! File writers for the three telemetry artifacts.

use crate::record::CycleRecord;
use crate::TelemetryResult;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Cycles skipped at startup while the sensor filter is still seeding;
/// those readings are sentinels, not data.
const WARMUP_CYCLES: u64 = 2;

/// Append-only CSV log, one line per cycle.
#[derive(Debug)]
pub struct DataLog {
    path: PathBuf,
    appended: u64,
}

impl DataLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            appended: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record; the first two calls are dropped and the header
    /// is written when the file does not exist yet.
    pub fn append(&mut self, record: &CycleRecord) -> TelemetryResult<()> {
        self.appended += 1;
        if self.appended <= WARMUP_CYCLES {
            return Ok(());
        }
        let fresh = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if fresh {
            writeln!(file, "{}", CycleRecord::CSV_HEADER)?;
        }
        writeln!(file, "{}", record.to_csv_line())?;
        Ok(())
    }
}

/// Overwrite the latest-cycle JSON snapshot.
pub fn write_snapshot(path: &Path, record: &CycleRecord) -> TelemetryResult<()> {
    let json = serde_json::to_string_pretty(record)?;
    fs::write(path, json)?;
    Ok(())
}

/// Overwrite the active-configuration table, one `name = value` row per
/// line, so an operator can confirm what the daemon actually loaded.
pub fn write_config_table(path: &Path, rows: &[(&str, String)]) -> TelemetryResult<()> {
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in rows {
        out.push_str(&format!("{name:width$} = {value}\n"));
    }
    fs::write(path, out)?;
    Ok(())
}

//! Counter persistence.
//!
//! A single JSON file holds the counters that must survive a restart.
//! It is rewritten every few minutes and on shutdown; a missing or
//! unreadable file starts the counters at zero rather than failing the
//! daemon.

use crate::EnergyResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergySnapshot {
    pub total_wh: f64,
    pub nightly_wh: f64,
    pub legionella_cycles: u64,
}

#[derive(Clone, Debug)]
pub struct EnergyStore {
    path: PathBuf,
}

impl EnergyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted counters, starting from zero when the file is
    /// missing or damaged.
    pub fn load(&self) -> EnergySnapshot {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "counter file unreadable, starting at zero");
                    EnergySnapshot::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "no counter file, starting at zero");
                EnergySnapshot::default()
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "counter file unreadable, starting at zero");
                EnergySnapshot::default()
            }
        }
    }

    pub fn save(&self, snapshot: &EnergySnapshot) -> EnergyResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

//! Control decision engine for warmflow.
//!
//! One control cycle flows through this crate in a fixed order:
//! sensor filtering, schedule refresh, demand aggregation, budget
//! arbitration, battery override, guarded application to the actuator
//! registry. All state is owned by the single control loop; nothing here
//! blocks or spawns.
//!
//! # Design principles
//!
//! - **Monotone aggregation**: demand rules may only add desired bits,
//!   never clear ones set by an earlier rule in the same cycle.
//! - **Guarded transitions**: actuators change state only through the
//!   registry, so dwell-time rules are honored everywhere.
//! - **Structured state, bitmask at the edge**: desired state is named
//!   booleans internally and becomes a wire bitmask only at the I/O and
//!   logging boundary.

pub mod arbiter;
pub mod comms;
pub mod demand;
pub mod error;
pub mod filter;
pub mod power;
pub mod registry;
pub mod schedule;
pub mod state;

pub use arbiter::{arbitrate, effective_budget};
pub use comms::{encode_request, CommsStatus};
pub use demand::{DemandAggregator, DemandInputs, DemandOutcome};
pub use error::{ControlError, ControlResult};
pub use filter::{SensorFilter, ERROR_STREAK_LIMIT, MAX_TEMP_DIFF, UNKNOWN_TEMP};
pub use power::PowerMonitor;
pub use registry::{ActuatorRegistry, DwellSettings, GuardContext};
pub use schedule::{NightWindow, ScheduleContext, ThermalMode, TimeScheduler};
pub use state::DesiredState;

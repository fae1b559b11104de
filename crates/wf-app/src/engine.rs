//! The control engine: one object that owns all controller state and
//! runs a full cycle against the hardware traits.

use crate::{AppError, AppResult};
use chrono::NaiveDateTime;
use std::path::PathBuf;
use tracing::{info, warn};
use wf_config::{Config, Mode};
use wf_control::{
    arbitrate, effective_budget, encode_request, state::bits, ActuatorRegistry, CommsStatus,
    DemandAggregator, DemandInputs, DesiredState, GuardContext, PowerMonitor, SensorFilter,
    TimeScheduler,
};
use wf_core::cycle::SCHEDULE_REFRESH_CYCLES;
use wf_core::{ActuatorId, SensorId};
use wf_energy::{EnergyMeter, EnergyStore};
use wf_hal::{CommsPort, PowerSense, SensorBank, SwitchBank};
use wf_telemetry::{write_config_table, write_snapshot, CycleRecord, DataLog};

/// Counters are flushed to disk on this cadence (10 minutes).
const PERSIST_EVERY_CYCLES: u64 = 60;

/// Where the engine writes its artifacts.
#[derive(Clone, Debug)]
pub struct EnginePaths {
    pub data_log: PathBuf,
    pub snapshot: PathBuf,
    pub config_table: PathBuf,
    pub counters: PathBuf,
}

pub struct Engine<S, W, P, C> {
    cfg: Config,
    config_path: Option<PathBuf>,
    sensors: S,
    switches: W,
    power_sense: P,
    comms: C,
    filter: SensorFilter,
    scheduler: TimeScheduler,
    registry: ActuatorRegistry,
    aggregator: DemandAggregator,
    power: PowerMonitor,
    meter: EnergyMeter,
    store: EnergyStore,
    data_log: DataLog,
    snapshot_path: PathBuf,
    config_table_path: PathBuf,
    cycle: u64,
    force_refresh: bool,
}

impl<S, W, P, C> Engine<S, W, P, C>
where
    S: SensorBank,
    W: SwitchBank,
    P: PowerSense,
    C: CommsPort,
{
    pub fn new(
        cfg: Config,
        config_path: Option<PathBuf>,
        sensors: S,
        switches: W,
        power_sense: P,
        comms: C,
        paths: EnginePaths,
    ) -> AppResult<Self> {
        let store = EnergyStore::new(paths.counters.clone());
        let meter = EnergyMeter::from_snapshot(&store.load());
        write_config_table(&paths.config_table, &config_rows(&cfg))?;
        Ok(Self {
            cfg,
            config_path,
            sensors,
            switches,
            power_sense,
            comms,
            filter: SensorFilter::new(),
            scheduler: TimeScheduler::new(),
            registry: ActuatorRegistry::default(),
            aggregator: DemandAggregator::new(),
            power: PowerMonitor::new(),
            meter,
            store,
            data_log: DataLog::new(paths.data_log),
            snapshot_path: paths.snapshot,
            config_table_path: paths.config_table,
            cycle: 0,
            force_refresh: true,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn registry(&self) -> &ActuatorRegistry {
        &self.registry
    }

    pub fn meter(&self) -> &EnergyMeter {
        &self.meter
    }

    pub fn alarm(&self) -> bool {
        self.aggregator.alarm()
    }

    /// One full control cycle at wall-clock time `now`.
    pub fn run_cycle(&mut self, now: NaiveDateTime) -> AppResult<()> {
        let battery = self.power_sense.on_battery();
        self.power.update(battery);

        for id in SensorId::ALL {
            let raw = self.sensors.read(id);
            self.filter.accept(id, raw);
        }
        self.filter.check_health().map_err(AppError::Control)?;
        self.scheduler
            .note_outdoor(self.filter.current(SensorId::Outdoor));

        if self.force_refresh || self.cycle % SCHEDULE_REFRESH_CYCLES == 0 {
            self.force_refresh = false;
            let refresh = self.scheduler.refresh(now, &self.cfg);
            if refresh.counter_reset_due {
                self.meter.monthly_reset();
                self.store.save(&self.meter.snapshot())?;
            }
        }

        let comms_status = CommsStatus::from_bits(self.comms.read_status());
        let schedule = *self.scheduler.context();
        let ctx = GuardContext {
            use_pump1: self.cfg.use_pump1,
            use_pump2: self.cfg.use_pump2,
            heater_allowed_night: self.cfg.use_heater_night,
            heater_allowed_day: self.cfg.use_heater_day,
            night_tariff_now: schedule.night_tariff_now(),
            comms: comms_status,
        };

        let outcome = self.aggregator.compute(&DemandInputs {
            filter: &self.filter,
            schedule: &schedule,
            registry: &self.registry,
            wanted_temp: self.cfg.wanted_temp,
            abs_max_temp: self.cfg.abs_max_temp,
            pump1_always_on: self.cfg.pump1_always_on,
            night_boost: self.cfg.night_boost,
            night_boost_temp: self.cfg.night_boost_temp(),
            use_heat_pump: self.cfg.use_heat_pump,
            legionella_cycles: self.meter.legionella_cycles(),
        });
        if outcome.legionella_purge_done {
            self.meter.legionella_purge_done();
        }

        let raw = if self.cfg.mode == Mode::Off && !outcome.emergency {
            DesiredState::OFF
        } else {
            outcome.desired
        };
        let budget = effective_budget(self.cfg.max_big_consumers, schedule.hour);
        let mut desired = arbitrate(&raw, &self.registry, &ctx, budget);
        self.power.apply(&mut desired, &mut self.registry);

        let changed = self.registry.apply(&desired, &ctx);
        for id in changed {
            self.switches.write(id, self.registry.is_on(id))?;
        }
        let request = encode_request(&desired, self.power.on_battery(), self.power.grid_settle_cycles());
        self.comms.write_request(request)?;

        let night = schedule.night_tariff_now();
        self.meter.record_cycle(
            self.registry.is_on(ActuatorId::Heater),
            self.registry.is_on(ActuatorId::FurnacePump),
            self.registry.is_on(ActuatorId::SolarPump),
            self.registry.is_on(ActuatorId::Valve),
            night,
        );

        self.write_telemetry(now, &schedule, &desired)?;

        if self.cycle % PERSIST_EVERY_CYCLES == PERSIST_EVERY_CYCLES - 1 {
            self.store.save(&self.meter.snapshot())?;
        }

        self.registry.tick();
        self.filter.tick();
        self.power.tick();
        self.cycle += 1;
        Ok(())
    }

    fn write_telemetry(
        &mut self,
        now: NaiveDateTime,
        schedule: &wf_control::ScheduleContext,
        desired: &DesiredState,
    ) -> AppResult<()> {
        let wanted_bits = desired.to_bits();
        let actual_bits = self.registry.to_bits();
        let effective_wanted = (wanted_bits & !bits::HEATER_FORCED)
            | if wanted_bits & bits::HEATER_FORCED != 0 {
                bits::HEATER
            } else {
                0
            };
        let record = CycleRecord {
            cycle: self.cycle,
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            furnace_c: self.filter.current(SensorId::Furnace),
            collector_c: self.filter.current(SensorId::Collector),
            boiler_top_c: self.filter.current(SensorId::BoilerTop),
            boiler_bottom_c: self.filter.current(SensorId::BoilerBottom),
            outdoor_c: self.filter.current(SensorId::Outdoor),
            outdoor_avg_c: schedule.outdoor_avg,
            target_c: schedule.target,
            wanted_bits,
            actual_bits,
            missed_bits: effective_wanted & !actual_bits,
            alarm: self.aggregator.alarm(),
            on_battery: self.power.on_battery(),
            total_wh: self.meter.total_wh(),
            nightly_wh: self.meter.nightly_wh(),
        };
        self.data_log.append(&record)?;
        write_snapshot(&self.snapshot_path, &record)?;
        Ok(())
    }

    /// Re-read the configuration file between cycles (SIGUSR1 path).
    pub fn reload(&mut self) -> AppResult<()> {
        let Some(path) = self.config_path.clone() else {
            warn!("reload requested but no config file was given");
            return Ok(());
        };
        match wf_config::load_yaml(&path) {
            Ok(cfg) => {
                info!(path = %path.display(), "configuration reloaded");
                self.cfg = cfg;
                self.force_refresh = true;
                // Sensor paths may have changed; let the next sample land
                // without the slew limiter fighting it.
                self.filter.reseed();
                write_config_table(&self.config_table_path, &config_rows(&self.cfg))?;
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "reload failed, keeping active config");
            }
        }
        Ok(())
    }

    /// Orderly shutdown: release every output, drop the comms request,
    /// persist the counters. A failed release is its own error so the
    /// daemon can exit with the dedicated status.
    pub fn shutdown(&mut self) -> AppResult<()> {
        let release = self.switches.release_all();
        let _ = self.comms.write_request(0);
        self.store.save(&self.meter.snapshot())?;
        release.map_err(AppError::ReleaseFailed)
    }
}

fn config_rows(cfg: &Config) -> Vec<(&'static str, String)> {
    vec![
        ("mode", format!("{:?}", cfg.mode).to_lowercase()),
        ("wanted_temp", format!("{:.1}", cfg.wanted_temp)),
        ("abs_max_temp", format!("{:.1}", cfg.abs_max_temp)),
        ("use_heater_night", cfg.use_heater_night.to_string()),
        ("use_heater_day", cfg.use_heater_day.to_string()),
        ("use_pump1", cfg.use_pump1.to_string()),
        ("use_pump2", cfg.use_pump2.to_string()),
        ("pump1_always_on", cfg.pump1_always_on.to_string()),
        ("night_boost", cfg.night_boost.to_string()),
        ("counter_reset_day", cfg.counter_reset_day.to_string()),
        ("max_big_consumers", cfg.max_big_consumers.to_string()),
        ("use_heat_pump", cfg.use_heat_pump.to_string()),
        ("invert_output", cfg.invert_output.to_string()),
    ]
}

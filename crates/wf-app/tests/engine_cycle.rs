//! End-to-end engine cycles against in-memory hardware fakes.

use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use wf_app::{Engine, EnginePaths};
use wf_config::{Config, Mode};
use wf_core::{ActuatorId, SensorId};
use wf_hal::{CommsPort, HalResult, PowerSense, SensorBank, SwitchBank};

#[derive(Clone)]
struct FakeSensors {
    values: Arc<Mutex<[Option<f64>; SensorId::COUNT]>>,
}

impl FakeSensors {
    fn new(furnace: f64, collector: f64, top: f64, bottom: f64, outdoor: f64) -> Self {
        Self {
            values: Arc::new(Mutex::new([
                Some(furnace),
                Some(collector),
                Some(top),
                Some(bottom),
                Some(outdoor),
            ])),
        }
    }

    fn set(&self, id: SensorId, value: Option<f64>) {
        self.values.lock().unwrap()[id.index()] = value;
    }
}

impl SensorBank for FakeSensors {
    fn read(&mut self, id: SensorId) -> Option<f64> {
        self.values.lock().unwrap()[id.index()]
    }
}

#[derive(Clone, Default)]
struct FakeSwitches {
    writes: Arc<Mutex<Vec<(ActuatorId, bool)>>>,
}

impl FakeSwitches {
    fn last_state(&self, id: ActuatorId) -> Option<bool> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(w, _)| *w == id)
            .map(|(_, on)| *on)
    }

    fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

impl SwitchBank for FakeSwitches {
    fn write(&mut self, id: ActuatorId, on: bool) -> HalResult<()> {
        self.writes.lock().unwrap().push((id, on));
        Ok(())
    }
}

#[derive(Clone)]
struct FakePower {
    battery: Arc<AtomicBool>,
}

impl PowerSense for FakePower {
    fn on_battery(&mut self) -> bool {
        self.battery.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
struct FakeComms {
    status: Arc<AtomicU8>,
    requests: Arc<Mutex<Vec<u8>>>,
}

impl FakeComms {
    fn last_request(&self) -> Option<u8> {
        self.requests.lock().unwrap().last().copied()
    }
}

impl CommsPort for FakeComms {
    fn read_status(&mut self) -> u8 {
        self.status.load(Ordering::Relaxed)
    }

    fn write_request(&mut self, request: u8) -> HalResult<()> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

struct Rig {
    sensors: FakeSensors,
    switches: FakeSwitches,
    battery: Arc<AtomicBool>,
    comms: FakeComms,
    engine: Engine<FakeSensors, FakeSwitches, FakePower, FakeComms>,
    dir: PathBuf,
}

impl Rig {
    fn new(name: &str, cfg: Config, sensors: FakeSensors) -> Self {
        let dir = Self::fresh_dir(name);
        Self::assemble(dir, cfg, None, sensors)
    }

    /// Same rig, but the configuration comes from a YAML file in the rig
    /// directory so `reload` has something to re-read.
    fn with_config_file(name: &str, yaml: &str, sensors: FakeSensors) -> Self {
        let dir = Self::fresh_dir(name);
        let path = dir.join("config.yaml");
        std::fs::write(&path, yaml).unwrap();
        let cfg = wf_config::load_yaml(&path).unwrap();
        Self::assemble(dir, cfg, Some(path), sensors)
    }

    fn fresh_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wf_engine_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn assemble(
        dir: PathBuf,
        cfg: Config,
        config_path: Option<PathBuf>,
        sensors: FakeSensors,
    ) -> Self {
        let switches = FakeSwitches::default();
        let battery = Arc::new(AtomicBool::new(false));
        let comms = FakeComms {
            status: Arc::new(AtomicU8::new(0b11)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let paths = EnginePaths {
            data_log: dir.join("data.csv"),
            snapshot: dir.join("state.json"),
            config_table: dir.join("config.txt"),
            counters: dir.join("counters.json"),
        };
        let engine = Engine::new(
            cfg,
            config_path,
            sensors.clone(),
            switches.clone(),
            FakePower {
                battery: battery.clone(),
            },
            comms.clone(),
            paths,
        )
        .unwrap();
        Self {
            sensors,
            switches,
            battery,
            comms,
            engine,
            dir,
        }
    }

    fn run(&mut self, cycles: u32) {
        let mut now = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        for _ in 0..cycles {
            self.engine.run_cycle(now).unwrap();
            now += chrono::Duration::seconds(10);
        }
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

#[test]
fn quiet_plant_writes_telemetry_and_nothing_else() {
    let sensors = FakeSensors::new(25.0, 30.0, 45.0, 42.0, 15.0);
    let mut rig = Rig::new("quiet", Config::default(), sensors);
    rig.run(6);
    assert!(!rig.engine.alarm());
    assert!(rig.dir.join("state.json").exists());
    assert!(rig.dir.join("config.txt").exists());
    assert!(rig.dir.join("data.csv").exists());
    assert_ne!(rig.switches.last_state(ActuatorId::Heater), Some(true));
}

#[test]
fn dead_sensor_becomes_fatal_within_a_minute() {
    let sensors = FakeSensors::new(25.0, 30.0, 45.0, 42.0, 15.0);
    sensors.set(SensorId::Furnace, None);
    let mut rig = Rig::new("fatal", Config::default(), sensors);
    let now = NaiveDate::from_ymd_opt(2026, 1, 5)
        .unwrap()
        .and_hms_opt(14, 0, 0)
        .unwrap();
    let mut fatal = None;
    for cycle in 0..6 {
        if let Err(err) = rig.engine.run_cycle(now) {
            fatal = Some((cycle, err));
            break;
        }
    }
    let (cycle, err) = fatal.expect("sensor fault never escalated");
    assert!(err.is_sensor_fatal());
    assert!(cycle <= 5, "took {cycle} cycles");
}

#[test]
fn battery_forces_heater_and_blocks_heat_pump() {
    let sensors = FakeSensors::new(25.0, 30.0, 45.0, 42.0, 15.0);
    let mut rig = Rig::new("battery", Config::default(), sensors);
    rig.battery.store(true, Ordering::Relaxed);
    rig.run(2);
    assert_eq!(rig.switches.last_state(ActuatorId::Heater), Some(true));
    assert_eq!(rig.comms.last_request(), Some(3));
}

#[test]
fn hot_furnace_starts_its_pump() {
    let sensors = FakeSensors::new(45.0, 30.0, 45.0, 42.0, 15.0);
    let mut rig = Rig::new("hot_furnace", Config::default(), sensors);
    rig.run(2);
    assert_eq!(rig.switches.last_state(ActuatorId::FurnacePump), Some(true));
}

#[test]
fn overtemperature_evacuates_and_raises_alarm() {
    let sensors = FakeSensors::new(72.0, 30.0, 45.0, 42.0, 15.0);
    let mut rig = Rig::new("emergency", Config::default(), sensors);
    rig.run(2);
    assert!(rig.engine.alarm());
    assert_eq!(rig.switches.last_state(ActuatorId::FurnacePump), Some(true));
    assert_eq!(rig.switches.last_state(ActuatorId::SolarPump), Some(true));
    assert_eq!(rig.switches.last_state(ActuatorId::Valve), Some(true));
    assert_ne!(rig.switches.last_state(ActuatorId::Heater), Some(true));
}

#[test]
fn mode_off_requests_nothing() {
    let sensors = FakeSensors::new(25.0, 30.0, 30.0, 25.0, 15.0);
    let cfg = Config {
        mode: Mode::Off,
        ..Config::default()
    };
    let mut rig = Rig::new("mode_off", cfg, sensors);
    rig.run(6);
    assert_ne!(rig.switches.last_state(ActuatorId::Heater), Some(true));
    assert_ne!(rig.switches.last_state(ActuatorId::FurnacePump), Some(true));
}

#[test]
fn unchanged_state_writes_no_relays() {
    let sensors = FakeSensors::new(25.0, 30.0, 45.0, 42.0, 15.0);
    let mut rig = Rig::new("no_writes", Config::default(), sensors);
    rig.run(1);
    let after_first = rig.switches.write_count();
    rig.run(5);
    assert_eq!(rig.switches.write_count(), after_first);
}

#[test]
fn shutdown_releases_everything_and_persists() {
    let sensors = FakeSensors::new(45.0, 30.0, 45.0, 42.0, 15.0);
    let mut rig = Rig::new("shutdown", Config::default(), sensors);
    rig.run(3);
    rig.engine.shutdown().unwrap();
    for id in ActuatorId::ALL {
        assert_eq!(rig.switches.last_state(id), Some(false), "{id:?} still on");
    }
    assert_eq!(rig.comms.last_request(), Some(0));
    assert!(rig.dir.join("counters.json").exists());
}

#[test]
fn reload_swaps_config_between_cycles() {
    let sensors = FakeSensors::new(25.0, 30.0, 45.0, 42.0, 15.0);
    let mut rig = Rig::with_config_file("reload", "wanted_temp: 40.0\n", sensors);
    rig.run(2);
    assert_eq!(rig.engine.config().wanted_temp, 40.0);

    std::fs::write(rig.dir.join("config.yaml"), "wanted_temp: 45.0\n").unwrap();
    rig.engine.reload().unwrap();
    assert_eq!(rig.engine.config().wanted_temp, 45.0);

    // A broken file keeps the active configuration running.
    std::fs::write(rig.dir.join("config.yaml"), "wanted_temp: [oops\n").unwrap();
    rig.engine.reload().unwrap();
    assert_eq!(rig.engine.config().wanted_temp, 45.0);
    rig.run(2);
}

#[test]
fn cold_boiler_lights_the_heater() {
    let sensors = FakeSensors::new(25.0, 30.0, 30.0, 25.0, 15.0);
    let mut rig = Rig::new("cold_boiler", Config::default(), sensors);
    rig.run(2);
    assert_eq!(rig.switches.last_state(ActuatorId::Heater), Some(true));
}

use clap::{Parser, Subcommand};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info, warn};
use wf_app::{sleep_after_cycle, Engine, EnginePaths};
use wf_core::SensorId;
use wf_hal::{GpioCommsPort, GpioPowerSense, GpioSwitchBank, W1SensorBank};

/// A sensor channel died and the controller refused to keep running.
const EXIT_SENSOR_FAULT: i32 = 55;
/// Shutdown could not release the relays; the hardware may still be live.
const EXIT_RELEASE_FAILED: i32 = 66;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);
static RELOAD: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(name = "wf-daemon")]
#[command(about = "warmflow - domestic boiler and thermal-storage controller", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop
    Run {
        /// Path to the configuration YAML file
        config: PathBuf,
        /// Directory for the data log, snapshot and counters
        #[arg(short, long, default_value = "/var/lib/warmflow")]
        data_dir: PathBuf,
    },
    /// Load a configuration file, apply the clamps and print the result
    CheckConfig {
        /// Path to the configuration YAML file
        config: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run { config, data_dir } => cmd_run(&config, &data_dir),
        Commands::CheckConfig { config } => cmd_check_config(&config),
    };
    std::process::exit(code);
}

fn cmd_check_config(path: &Path) -> i32 {
    match wf_config::load_yaml(path) {
        Ok(cfg) => {
            match serde_output(&cfg) {
                Ok(yaml) => print!("{yaml}"),
                Err(err) => {
                    error!(%err, "could not render config");
                    return 1;
                }
            }
            0
        }
        Err(err) => {
            error!(path = %path.display(), %err, "config rejected");
            1
        }
    }
}

fn serde_output(cfg: &wf_config::Config) -> Result<String, wf_config::ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

fn cmd_run(config_path: &Path, data_dir: &Path) -> i32 {
    let cfg = match wf_config::load_yaml(config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(path = %config_path.display(), %err, "cannot load config");
            return 1;
        }
    };
    if let Err(err) = std::fs::create_dir_all(data_dir) {
        error!(path = %data_dir.display(), %err, "cannot create data directory");
        return 1;
    }
    if let Err(err) = write_pid_file(data_dir) {
        warn!(%err, "pid file not written");
    }
    install_signal_handlers();

    let sensor_paths: [String; SensorId::COUNT] =
        std::array::from_fn(|i| cfg.sensors.path(SensorId::ALL[i]).to_string());
    let sensors = W1SensorBank::new(sensor_paths);
    let switches = match GpioSwitchBank::new(
        cfg.pins.pump1,
        cfg.pins.pump2,
        cfg.pins.valve,
        cfg.pins.heater,
        cfg.invert_output,
    ) {
        Ok(bank) => bank,
        Err(err) => {
            error!(%err, "relay bank setup failed");
            return 1;
        }
    };
    let power = match GpioPowerSense::new(cfg.pins.battery) {
        Ok(sense) => sense,
        Err(err) => {
            error!(%err, "battery sense setup failed");
            return 1;
        }
    };
    let comms = match GpioCommsPort::new(
        (cfg.pins.comms1, cfg.pins.comms2),
        (cfg.pins.comms3, cfg.pins.comms4),
    ) {
        Ok(port) => port,
        Err(err) => {
            error!(%err, "comms port setup failed");
            return 1;
        }
    };

    let paths = EnginePaths {
        data_log: data_dir.join("data.csv"),
        snapshot: data_dir.join("state.json"),
        config_table: data_dir.join("config.txt"),
        counters: data_dir.join("counters.json"),
    };
    let mut engine = match Engine::new(
        cfg,
        Some(config_path.to_path_buf()),
        sensors,
        switches,
        power,
        comms,
        paths,
    ) {
        Ok(engine) => engine,
        Err(err) => {
            error!(%err, "engine setup failed");
            return 1;
        }
    };

    info!(config = %config_path.display(), data = %data_dir.display(), "warmflow started");
    let mut fatal = 0;
    loop {
        if SHUTDOWN.load(Ordering::SeqCst) {
            info!("shutdown requested");
            break;
        }
        if RELOAD.swap(false, Ordering::SeqCst) {
            if let Err(err) = engine.reload() {
                warn!(%err, "reload failed");
            }
        }
        let started = Instant::now();
        let now = chrono::Local::now().naive_local();
        if let Err(err) = engine.run_cycle(now) {
            if err.is_sensor_fatal() {
                error!(%err, "sensor fault, stopping");
                fatal = EXIT_SENSOR_FAULT;
                break;
            }
            warn!(%err, "cycle failed");
        }
        std::thread::sleep(sleep_after_cycle(started.elapsed()));
    }

    match engine.shutdown() {
        Ok(()) => {
            info!("outputs released, counters saved");
            fatal
        }
        Err(err) => {
            error!(%err, "shutdown could not release outputs");
            EXIT_RELEASE_FAILED
        }
    }
}

fn write_pid_file(data_dir: &Path) -> std::io::Result<()> {
    std::fs::write(data_dir.join("warmflow.pid"), std::process::id().to_string())
}

fn install_signal_handlers() {
    unsafe {
        let stop = SigAction::new(
            SigHandler::Handler(stop_handler),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        let _ = signal::sigaction(Signal::SIGTERM, &stop);
        let _ = signal::sigaction(Signal::SIGINT, &stop);

        let reload = SigAction::new(
            SigHandler::Handler(reload_handler),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        let _ = signal::sigaction(Signal::SIGUSR1, &reload);
    }
}

extern "C" fn stop_handler(_signal: nix::libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

extern "C" fn reload_handler(_signal: nix::libc::c_int) {
    RELOAD.store(true, Ordering::SeqCst);
}

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use padlink::config::{start_reload_task, Config, JoystickSettings};
use padlink::controller::{GilrsBackend, InputEvent, InputEventKind, InputSystem};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "padlink", about = "Keeps one gamepad active and prints its normalized input")]
struct Cli {
    /// Do not open the gamepad backend at all
    #[arg(long)]
    nojoy: bool,

    /// Config file, defaults to ~/.config/padlink/config.toml
    #[arg(long, env = "PADLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Device index to use instead of the first available one
    #[arg(long, allow_negative_numbers = true)]
    preferred_device: Option<i32>,

    /// Interval between backend pumps
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u64).range(1..))]
    pump_interval_ms: u64,

    /// Interval between config file reloads
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    reload_interval_s: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup()?;

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    Config::ensure_default(&config_path).await?;
    let config = Config::load(&config_path).await?;

    let mut settings = config.joystick;
    settings.disable_at_startup = cli.nojoy;
    if let Some(index) = cli.preferred_device {
        settings.preferred_device = index;
    }
    info!("Starting with joystick settings: {:?}", settings);

    let (events_tx, events_rx) = mpsc::channel(1000);
    let (settings_tx, settings_rx) = watch::channel(settings.clone());
    let (persist_tx, persist_rx) = mpsc::channel(16);
    let token = CancellationToken::new();

    let _reload_handle =
        start_reload_task(config_path.clone(), settings_tx, cli.reload_interval_s);
    let _persist_handle = tokio::spawn(persist_settings(config_path, persist_rx));
    let _event_handle = tokio::spawn(log_events(events_rx));

    let pump_token = token.clone();
    let interval = Duration::from_millis(cli.pump_interval_ms);
    let pump_handle = tokio::task::spawn_blocking(move || {
        run_pump(settings, settings_rx, events_tx, persist_tx, pump_token, interval)
    });

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| eyre!("Failed to listen for Ctrl-C: {}", e))?;
    info!("Ctrl-C received, shutting down");
    token.cancel();

    pump_handle
        .await
        .map_err(|e| eyre!("Pump task failed: {}", e))?;
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

// Owns the input system; gilrs stays on this thread for its whole life
fn run_pump(
    settings: JoystickSettings,
    mut settings_rx: watch::Receiver<JoystickSettings>,
    events_tx: mpsc::Sender<InputEvent>,
    persist_tx: mpsc::Sender<JoystickSettings>,
    token: CancellationToken,
    interval: Duration,
) {
    let mut system = InputSystem::new(GilrsBackend::new(), settings, events_tx);
    let mut flags_rx = system.subscribe_flags();
    let mut own_settings_rx = system.subscribe_settings();
    system.initialize();

    if !system.is_initialized() {
        warn!("Joystick subsystem not initialized, no gamepad input this session");
    }

    while !token.is_cancelled() {
        if settings_rx.has_changed().unwrap_or(false) {
            let next = settings_rx.borrow_and_update().clone();
            system.apply_settings(next);
        }

        system.pump();
        system.swap_analog_buffers();

        if flags_rx.has_changed().unwrap_or(false) {
            let flags = *flags_rx.borrow_and_update();
            info!(
                "Gamepad present: {}, joystick input enabled: {}",
                flags.gamepad_present, flags.joystick_input_enabled
            );
        }

        if own_settings_rx.has_changed().unwrap_or(false) {
            let updated = own_settings_rx.borrow_and_update().clone();
            if let Err(e) = persist_tx.try_send(updated) {
                warn!("Failed to queue settings for saving: {}", e);
            }
        }

        std::thread::sleep(interval);
    }

    system.shutdown();
}

async fn persist_settings(path: PathBuf, mut rx: mpsc::Receiver<JoystickSettings>) {
    while let Some(joystick) = rx.recv().await {
        let config = Config { joystick };
        match config.save(&path).await {
            Ok(_) => debug!("Persisted joystick settings"),
            Err(e) => error!("Failed to persist joystick settings: {}", e),
        }
    }
}

async fn log_events(mut rx: mpsc::Receiver<InputEvent>) {
    while let Some(event) = rx.recv().await {
        let time = event.timestamp.format("%H:%M:%S.%3f");
        match event.kind {
            InputEventKind::ButtonPressed(code) => info!("Button pressed: {:?} at {}", code, time),
            InputEventKind::ButtonReleased(code) => {
                info!("Button released: {:?} at {}", code, time)
            }
            InputEventKind::AnalogValueChanged { code, value, delta } => {
                debug!("Analog {:?} = {} (delta {}) at {}", code, value, delta, time)
            }
        }
    }
}

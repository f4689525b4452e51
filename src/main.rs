//! ShuttleMidi
//!
//! Bridge a Contour ShuttlePRO v2 to MIDI control changes and a Mackie Control display.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shuttle_midi::config::{AppConfig, ConfigWatcher};
use shuttle_midi::dispatcher::{CommandDispatcher, DispatcherHandle};
use shuttle_midi::display::{DisplayHandle, DisplayWriter};
use shuttle_midi::media_keys::MusicAppKeys;
use shuttle_midi::midi::{discovery, MidirOutput};
use shuttle_midi::router::Router;
use shuttle_midi::shuttle::{self, ShuttleDevice, ShuttleEvent, ShuttleReader};

/// Decoded events buffered between the reader thread and the event loop
const EVENT_QUEUE_DEPTH: usize = 256;

/// ShuttleMidi - ShuttlePRO v2 jog/shuttle to MIDI control changes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: ~/.config/shuttle-midi.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI output ports
    #[arg(long)]
    list_ports: bool,

    /// List connected ShuttlePRO devices
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_ports {
        discovery::print_ports()?;
        return Ok(());
    }

    if args.list_devices {
        print_devices()?;
        return Ok(());
    }

    info!("Starting ShuttleMidi v{}...", env!("CARGO_PKG_VERSION"));

    let config_path = match args.config {
        Some(path) => path,
        None => AppConfig::default_path()?,
    };
    info!("Configuration file: {}", config_path.display());

    let (config_watcher, config) = ConfigWatcher::new(config_path).await?;
    info!("Configuration loaded with hot-reload enabled");

    let device = ShuttleDevice::open().context("ShuttlePRO v2 not available")?;
    info!("🎛️  Using {}", device.product());

    run_app(device, config, config_watcher, shutdown_signal()).await?;

    info!("ShuttleMidi shutdown complete");
    Ok(())
}

async fn run_app(
    device: ShuttleDevice,
    mut config: AppConfig,
    mut config_watcher: ConfigWatcher,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let dispatcher = connect_dispatcher(&config)
        .context("Unable to open MIDI device, check midi.control_device")?;

    let mut router = Router::from_config(&config, dispatcher, Arc::new(MusicAppKeys::new()));
    if config.display.enabled {
        router.set_display(connect_display(&config));
    }

    let (event_tx, mut event_rx) = mpsc::channel::<ShuttleEvent>(EVENT_QUEUE_DEPTH);
    let reader = match ShuttleReader::spawn(device, event_tx) {
        Ok(reader) => reader,
        Err(e) => {
            router.stop_display().await;
            router.stop_dispatcher().await;
            return Err(e).context("Failed to start ShuttlePRO input");
        }
    };

    router.resync();
    info!("✅ Ready to process ShuttlePRO events");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => router.handle_event(event).await,
                None => {
                    warn!("ShuttlePRO reader stopped");
                    break;
                }
            },

            Some(new_config) = config_watcher.next_config() => {
                info!("📝 Configuration file changed, applying...");
                apply_config(&mut router, &config, &new_config).await;
                config = new_config;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    info!("Shutting down...");
    router.stop_display().await;
    router.stop_dispatcher().await;

    reader.stop();
    drop(event_rx);
    tokio::task::spawn_blocking(move || reader.join())
        .await
        .context("Failed to join ShuttlePRO reader")?
        .context("ShuttlePRO input failed")?;

    Ok(())
}

/// Apply the runtime-relevant differences between two configurations
async fn apply_config(router: &mut Router, old: &AppConfig, new: &AppConfig) {
    let changes = old.changes(new);
    if changes.is_empty() {
        info!("No runtime changes; other settings take effect on restart");
        return;
    }
    debug!(?changes, "Config changes");

    if changes.control_device {
        info!("Control device changed to '{}', reconnecting", new.midi.control_device);
        router.stop_dispatcher().await;
        match connect_dispatcher(new) {
            Ok(dispatcher) => {
                router.set_dispatcher(dispatcher);
                router.resync();
            }
            Err(e) => error!("Unable to open MIDI device '{}': {:#}", new.midi.control_device, e),
        }
    }

    if changes.display_device {
        info!("Display device changed to '{}', reconnecting", new.midi.display_device);
        router.stop_display().await;
        if new.display.enabled {
            router.set_display(connect_display(new));
            router.refresh_display();
        }
    }

    if let Some(enabled) = changes.display_enabled {
        if enabled && !router.has_display() {
            router.set_display(connect_display(new));
        }
        router.set_display_enabled(enabled);
    }

    if let Some(enabled) = changes.media_keys_enabled {
        router.set_media_keys_enabled(enabled);
    }
}

fn connect_dispatcher(config: &AppConfig) -> Result<DispatcherHandle> {
    let output = MidirOutput::connect(&config.midi.control_device)?;
    Ok(CommandDispatcher::spawn(
        Box::new(output),
        config.midi.dispatcher_config(),
    ))
}

/// A missing display is not fatal: controls keep working without it
fn connect_display(config: &AppConfig) -> Option<DisplayHandle> {
    match MidirOutput::connect(&config.midi.display_device) {
        Ok(output) => Some(DisplayWriter::spawn(
            Box::new(output),
            config.display.row_delay(),
        )),
        Err(e) => {
            warn!(
                "Display device '{}' unavailable: {}",
                config.midi.display_device, e
            );
            None
        }
    }
}

fn print_devices() -> Result<()> {
    use colored::*;

    println!("\n{}", "=== ShuttlePRO Devices ===".bold().cyan());

    let devices = shuttle::list_devices()?;
    if devices.is_empty() {
        println!("  {}", "No ShuttlePRO v2 connected".dimmed());
    }
    for device in devices {
        let serial = device
            .serial
            .as_deref()
            .map(|s| format!("[{}]", s))
            .unwrap_or_default();
        println!(
            "  {} {} {}",
            device.product.as_str().green(),
            serial.as_str().yellow(),
            device.path.as_str().dimmed()
        );
    }
    println!();

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}

//! midi2key - MIDI controller to keyboard input gateway
//!
//! Opens a MIDI input port and turns note events into synthetic
//! key presses according to a JSON key-map document.

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midi2key::config::{ConfigWatcher, KeymapConfig};
use midi2key::device::{self, PortSelector, RawMidiEvent};
use midi2key::dispatcher::Dispatcher;
use midi2key::keymap::KeyMap;
use midi2key::keys::{ConsoleActuator, KeyActuator};

/// Drive keyboard-only games and applications from a MIDI controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the key-map document
    #[arg(short, long, default_value = "keymap.json")]
    config: String,

    /// MIDI input port: index or name substring (auto-selects when
    /// exactly one port exists)
    #[arg(short, long)]
    port: Option<String>,

    /// Override the key map's octave shift
    #[arg(short, long)]
    octave_shift: Option<i32>,

    /// Log key actions instead of injecting them
    #[arg(long)]
    dry_run: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_ports {
        device::list_ports_formatted();
        return Ok(());
    }

    info!("Starting midi2key...");
    info!("Key-map file: {}", args.config);

    // Load the key map with hot-reload watcher; an unreadable document
    // is fatal at startup
    let (mut config_watcher, initial_config) = ConfigWatcher::new(args.config.clone()).await?;
    let keymap = build_keymap(&initial_config, args.octave_shift);
    if keymap.is_empty() {
        warn!("Key map has no usable bindings; notes will be ignored");
    }
    info!(
        "Loaded {} bindings, octave shift {}",
        keymap.len(),
        keymap.octave_shift()
    );

    let actuator = make_actuator(args.dry_run);
    let mut dispatcher = Dispatcher::new(keymap, actuator);

    // Connect the MIDI input; the driver callback forwards raw events
    // into this channel and the loop below is the only consumer, so
    // event handling and key-map replacement are serialized
    let (event_tx, mut event_rx) = mpsc::channel::<RawMidiEvent>(1000);
    let selector = args
        .port
        .as_deref()
        .map(PortSelector::parse)
        .unwrap_or(PortSelector::Auto);
    let source = device::connect(&selector, event_tx)?;
    info!("Listening on '{}' (Ctrl+C to exit)", source.port_name);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                dispatcher.handle(&event.bytes);
            }

            Some(new_config) = config_watcher.next_config() => {
                info!("Key-map file changed, reloading...");
                dispatcher.replace_keymap(build_keymap(&new_config, args.octave_shift));
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    // No stuck keys at exit
    dispatcher.release_all();
    drop(source);

    info!("midi2key shutdown complete");
    Ok(())
}

/// Build a binding table from a document, logging each skipped entry
fn build_keymap(config: &KeymapConfig, octave_override: Option<i32>) -> KeyMap {
    let (mut keymap, errors) = KeyMap::from_config(config);
    for error in &errors {
        warn!("Skipping key-map entry: {}", error);
    }

    if let Some(shift) = octave_override {
        info!("Octave shift overridden from command line: {}", shift);
        keymap.set_octave_shift(shift);
    }

    keymap
}

#[cfg(windows)]
fn make_actuator(dry_run: bool) -> Box<dyn KeyActuator> {
    if dry_run {
        Box::new(ConsoleActuator::new())
    } else {
        Box::new(midi2key::keys::SendInputActuator::new())
    }
}

#[cfg(not(windows))]
fn make_actuator(dry_run: bool) -> Box<dyn KeyActuator> {
    if !dry_run {
        warn!("Key injection is only implemented on Windows; running dry");
    }
    Box::new(ConsoleActuator::new())
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

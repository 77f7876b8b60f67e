//! MIDI input device handling
//!
//! Wraps midir port enumeration and connection. The driver invokes
//! the input callback on its own thread, one message at a time; the
//! callback only forwards `(timestamp, bytes)` into a channel so the
//! translation engine runs on the consumer task instead of inside the
//! driver's delivery path.

use anyhow::{bail, Context, Result};
use midir::{MidiInput, MidiInputConnection};
use tokio::sync::mpsc;
use tracing::{debug, info};

const CLIENT_NAME: &str = "midi2key";

/// Raw MIDI event as delivered by the driver
#[derive(Debug, Clone)]
pub struct RawMidiEvent {
    /// Driver timestamp in microseconds
    pub timestamp_us: u64,
    pub bytes: Vec<u8>,
}

/// How the input port is chosen
#[derive(Debug, Clone)]
pub enum PortSelector {
    /// Pick the only port, fail if there are several
    Auto,
    /// Port index as printed by `--list-ports`
    Index(usize),
    /// Case-insensitive substring of the port name
    Pattern(String),
}

impl PortSelector {
    /// Parse a `--port` argument: an integer is an index, anything
    /// else a name pattern
    pub fn parse(arg: &str) -> Self {
        match arg.parse::<usize>() {
            Ok(index) => PortSelector::Index(index),
            Err(_) => PortSelector::Pattern(arg.to_string()),
        }
    }
}

/// An open MIDI input connection feeding the event channel
pub struct MidiSource {
    // Held so the connection stays open; dropping it disconnects
    _conn: MidiInputConnection<()>,
    pub port_name: String,
}

/// List available MIDI input port names
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;

    let mut port_names = Vec::new();
    for port in midi_in.ports() {
        if let Ok(name) = midi_in.port_name(&port) {
            port_names.push(name);
        }
    }

    Ok(port_names)
}

/// Print a formatted listing of input ports
pub fn list_ports_formatted() {
    use colored::*;

    println!("\n{}", "=== Available MIDI Input Ports ===".bold().cyan());

    match list_input_ports() {
        Ok(ports) if ports.is_empty() => {
            println!("  {}", "No input ports found".dimmed());
        }
        Ok(ports) => {
            for (index, name) in ports.iter().enumerate() {
                println!("  {} {}", format!("[{}]", index).green(), name);
            }
        }
        Err(e) => {
            println!("  {}", format!("Failed to enumerate ports: {}", e).red());
        }
    }
    println!();
}

/// Open the selected input port and forward every delivered message
/// into `event_tx`.
pub fn connect(
    selector: &PortSelector,
    event_tx: mpsc::Sender<RawMidiEvent>,
) -> Result<MidiSource> {
    let midi_in = MidiInput::new(CLIENT_NAME).context("Failed to create MIDI input")?;

    let ports = midi_in.ports();
    if ports.is_empty() {
        bail!("No MIDI input ports available");
    }
    debug!("Found {} MIDI input ports", ports.len());

    let (port, port_name) = match selector {
        PortSelector::Auto => {
            if ports.len() > 1 {
                let names = list_input_ports().unwrap_or_default();
                bail!(
                    "{} MIDI input ports available, select one with --port: {:?}",
                    ports.len(),
                    names
                );
            }
            let port = ports
                .into_iter()
                .next()
                .context("No MIDI input ports available")?;
            let name = midi_in.port_name(&port).unwrap_or_default();
            (port, name)
        }
        PortSelector::Index(index) => {
            let Some(port) = ports.into_iter().nth(*index) else {
                bail!("Invalid MIDI port index {}", index);
            };
            let name = midi_in.port_name(&port).unwrap_or_default();
            (port, name)
        }
        PortSelector::Pattern(pattern) => {
            // Case-insensitive substring match
            let needle = pattern.to_lowercase();
            let mut found = None;
            for port in ports {
                if let Ok(name) = midi_in.port_name(&port) {
                    if name.to_lowercase().contains(&needle) {
                        debug!("Found port '{}' matching pattern '{}'", name, pattern);
                        found = Some((port, name));
                        break;
                    }
                }
            }
            found.ok_or_else(|| anyhow::anyhow!("No MIDI input port matches '{}'", pattern))?
        }
    };

    info!("Connecting to MIDI input port: {}", port_name);

    let conn = midi_in
        .connect(
            &port,
            CLIENT_NAME,
            move |timestamp_us, bytes, _| {
                // Never block the driver thread; a full channel just
                // drops the event.
                let _ = event_tx.try_send(RawMidiEvent {
                    timestamp_us,
                    bytes: bytes.to_vec(),
                });
            },
            (),
        )
        .map_err(|e| anyhow::anyhow!("Failed to connect to input port: {}", e))?;

    Ok(MidiSource {
        _conn: conn,
        port_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_selector_parses_index() {
        assert!(matches!(PortSelector::parse("2"), PortSelector::Index(2)));
    }

    #[test]
    fn test_port_selector_parses_pattern() {
        match PortSelector::parse("Arturia") {
            PortSelector::Pattern(p) => assert_eq!(p, "Arturia"),
            other => panic!("expected pattern, got {:?}", other),
        }
    }
}

//! MIDI utilities and message types
//!
//! Provides the outbound message encoding and the midir-backed output ports
//! used by the command dispatcher and the display writer.

use std::fmt;

use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use thiserror::Error;
use tracing::{debug, info, trace};

/// Client name announced to the MIDI backend
const CLIENT_NAME: &str = "ShuttleMidi";

/// Errors raised by MIDI output ports
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI output port '{0}' not found")]
    PortNotFound(String),

    #[error("MIDI backend initialisation failed: {0}")]
    Init(#[from] midir::InitError),

    #[error("failed to connect to MIDI output port '{port}': {reason}")]
    Connect { port: String, reason: String },

    #[error("failed to send MIDI message: {0}")]
    Send(#[from] midir::SendError),
}

/// Outbound MIDI message types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// System Exclusive payload without the F0/F7 framing
    SysEx { data: Vec<u8> },
}

impl MidiMessage {
    /// Encode the message to MIDI bytes
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            MidiMessage::ControlChange { channel, cc, value } => {
                vec![0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
            MidiMessage::SysEx { ref data } => {
                let mut result = Vec::with_capacity(data.len() + 2);
                result.push(0xF0);
                result.extend(data.iter().map(|b| b & 0x7F));
                result.push(0xF7);
                result
            }
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
            MidiMessage::SysEx { ref data } => {
                write!(f, "SysEx {} bytes", data.len())
            }
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Destination for encoded MIDI messages
///
/// Implemented by real ports and by in-memory recorders in tests. Owned by
/// exactly one actor at a time, hence `&mut self`.
pub trait MidiOut: Send + 'static {
    /// Human readable port name for logs
    fn name(&self) -> &str;

    /// Send one message
    fn send(&mut self, message: &MidiMessage) -> Result<(), MidiError>;
}

/// Find an output port by case-insensitive substring match
pub fn find_port_by_substring(
    midi_out: &MidiOutput,
    pattern: &str,
) -> Option<(MidiOutputPort, String)> {
    let pattern = pattern.to_lowercase();
    for port in midi_out.ports() {
        if let Ok(name) = midi_out.port_name(&port) {
            if name.to_lowercase().contains(&pattern) {
                debug!("Found port '{}' matching pattern '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}

/// midir output connection
pub struct MidirOutput {
    name: String,
    conn: MidiOutputConnection,
}

impl MidirOutput {
    /// Connect to the first output port whose name contains `pattern`
    pub fn connect(pattern: &str) -> Result<Self, MidiError> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;

        let (port, name) = find_port_by_substring(&midi_out, pattern)
            .ok_or_else(|| MidiError::PortNotFound(pattern.to_string()))?;

        info!("Connecting to output port: {}", name);

        let conn = midi_out
            .connect(&port, CLIENT_NAME)
            .map_err(|e| MidiError::Connect {
                port: name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { name, conn })
    }
}

impl MidiOut for MidirOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, message: &MidiMessage) -> Result<(), MidiError> {
        let data = message.encode();
        self.conn.send(&data)?;
        trace!("Sent: {} | {}", format_hex(&data), message);
        Ok(())
    }
}

/// Port discovery utilities
pub mod discovery {
    use super::*;
    use colored::*;

    /// Information about a MIDI port
    #[derive(Debug, Clone)]
    pub struct PortInfo {
        pub index: usize,
        pub name: String,
        pub is_virtual: bool,
    }

    /// Discover output ports
    pub fn output_ports() -> Result<Vec<PortInfo>, MidiError> {
        let midi_out = MidiOutput::new("ShuttleMidi-Discovery")?;

        let mut port_infos = Vec::new();
        for (index, port) in midi_out.ports().iter().enumerate() {
            if let Ok(name) = midi_out.port_name(port) {
                let is_virtual = name.contains("Virtual")
                    || name.contains("loopMIDI")
                    || name.contains("IAC");

                port_infos.push(PortInfo {
                    index,
                    name,
                    is_virtual,
                });
            }
        }

        Ok(port_infos)
    }

    /// Print discovered output ports
    pub fn print_ports() -> Result<(), MidiError> {
        println!("\n{}", "=== MIDI Output Ports ===".bold().cyan());

        let ports = output_ports()?;
        if ports.is_empty() {
            println!("  {}", "No output ports found".dimmed());
        }
        for port in ports {
            let marker = if port.is_virtual {
                "[VIRTUAL]".yellow()
            } else {
                "[PHYSICAL]".green()
            };
            println!("  {}: {} {}", port.index, marker, port.name);
        }
        println!();
        Ok(())
    }
}

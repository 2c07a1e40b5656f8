use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use padloop_core::midi::{note_off_bytes, note_on_bytes, parse_midi_message, MidiMessage};
use padloop_core::output::ControllerOutput;
use padloop_types::{PadColor, PadIndex};

const CLIENT_NAME: &str = "padloop";

/// Information about an available MIDI port
#[derive(Debug, Clone)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

pub fn list_input_ports() -> Vec<MidiPortInfo> {
    let Ok(midi_in) = MidiInput::new(CLIENT_NAME) else {
        return Vec::new();
    };
    midi_in
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            let name = midi_in.port_name(port).ok()?;
            Some(MidiPortInfo { index, name })
        })
        .collect()
}

pub fn list_output_ports() -> Vec<MidiPortInfo> {
    let Ok(midi_out) = MidiOutput::new(CLIENT_NAME) else {
        return Vec::new();
    };
    midi_out
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            let name = midi_out.port_name(port).ok()?;
            Some(MidiPortInfo { index, name })
        })
        .collect()
}

/// Inbound MIDI, stamped with the instant each message arrived.
pub struct MidiInputManager {
    connection: Option<MidiInputConnection<()>>,
    receiver: Option<Receiver<(Instant, MidiMessage)>>,
    connected_port_name: Option<String>,
}

impl MidiInputManager {
    pub fn new() -> Self {
        Self {
            connection: None,
            receiver: None,
            connected_port_name: None,
        }
    }

    pub fn connected_port_name(&self) -> Option<&str> {
        self.connected_port_name.as_deref()
    }

    /// Connect to a MIDI input port by index
    pub fn connect(&mut self, port_index: usize) -> Result<(), String> {
        self.disconnect();

        let mut midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| e.to_string())?;
        // Timing Clock must get through
        midi_in.ignore(Ignore::SysexAndActiveSense);
        let ports = midi_in.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| format!("Invalid input port index: {}", port_index))?;
        let port_name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let (tx, rx) = mpsc::channel();
        let connection = midi_in
            .connect(
                port,
                "padloop-input",
                move |_, message, _| {
                    if let Some(msg) = parse_midi_message(message) {
                        let _ = tx.send((Instant::now(), msg));
                    }
                },
                (),
            )
            .map_err(|e| e.to_string())?;

        log::info!(target: "midi", "input connected: {}", port_name);
        self.connection = Some(connection);
        self.receiver = Some(rx);
        self.connected_port_name = Some(port_name);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
        }
        self.receiver = None;
        self.connected_port_name = None;
    }

    /// Poll for pending MIDI messages (non-blocking)
    pub fn poll_messages(&self) -> Vec<(Instant, MidiMessage)> {
        let mut messages = Vec::new();
        if let Some(ref rx) = self.receiver {
            while let Ok(msg) = rx.try_recv() {
                messages.push(msg);
            }
        }
        messages
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Engine output routed to a MIDI port, with notices printed to the terminal.
pub struct MidiOutputSink {
    connection: Option<MidiOutputConnection>,
    channel: u8,
}

impl MidiOutputSink {
    /// A sink with no port attached; notes are dropped.
    pub fn disconnected(channel: u8) -> Self {
        Self {
            connection: None,
            channel,
        }
    }

    pub fn connect(port_index: usize, channel: u8) -> Result<Self, String> {
        let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| e.to_string())?;
        let ports = midi_out.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| format!("Invalid output port index: {}", port_index))?;
        let port_name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());
        let connection = midi_out
            .connect(port, "padloop-output")
            .map_err(|e| e.to_string())?;
        log::info!(target: "midi", "output connected: {}", port_name);
        Ok(Self {
            connection: Some(connection),
            channel,
        })
    }

    fn send(&mut self, bytes: &[u8]) {
        if let Some(conn) = self.connection.as_mut() {
            if let Err(e) = conn.send(bytes) {
                log::warn!(target: "midi", "send failed: {}", e);
            }
        }
    }
}

impl ControllerOutput for MidiOutputSink {
    fn send_note_on(&mut self, note: u8, velocity: u8) {
        let bytes = note_on_bytes(self.channel, note, velocity);
        self.send(&bytes);
    }

    fn send_note_off(&mut self, note: u8) {
        let bytes = note_off_bytes(self.channel, note);
        self.send(&bytes);
    }

    fn notify(&mut self, text: &str) {
        log::info!(target: "display", "{}", text);
        println!("{}", text);
    }

    fn set_pad_lit(&mut self, pad: PadIndex, color: PadColor) {
        log::trace!(target: "display", "pad {} {:?}", pad, color);
    }
}

impl Drop for MidiOutputSink {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
        }
    }
}

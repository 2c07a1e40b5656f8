//! Inbound MIDI messages the engine reacts to, and the outbound note bytes the
//! host writes to its ports. Everything else on the wire is ignored.

/// MIDI realtime and channel messages consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    /// Timing Clock, 24 per quarter note.
    Clock,
    Start,
    Continue,
    Stop,
}

pub const CLOCK: u8 = 0xF8;
pub const START: u8 = 0xFA;
pub const CONTINUE: u8 = 0xFB;
pub const STOP: u8 = 0xFC;

/// Parse a raw MIDI message into a `MidiMessage`
pub fn parse_midi_message(data: &[u8]) -> Option<MidiMessage> {
    let status = *data.first()?;

    // Realtime bytes carry no channel and no data bytes
    match status {
        CLOCK => return Some(MidiMessage::Clock),
        START => return Some(MidiMessage::Start),
        CONTINUE => return Some(MidiMessage::Continue),
        STOP => return Some(MidiMessage::Stop),
        _ => {}
    }

    let channel = status & 0x0F;
    match status & 0xF0 {
        0x80 if data.len() >= 3 => Some(MidiMessage::NoteOff {
            channel,
            note: data[1],
        }),
        0x90 if data.len() >= 3 => {
            // Note On with velocity 0 is a Note Off
            if data[2] == 0 {
                Some(MidiMessage::NoteOff {
                    channel,
                    note: data[1],
                })
            } else {
                Some(MidiMessage::NoteOn {
                    channel,
                    note: data[1],
                    velocity: data[2],
                })
            }
        }
        _ => None,
    }
}

pub fn note_on_bytes(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

pub fn note_off_bytes(channel: u8, note: u8) -> [u8; 3] {
    [0x80 | (channel & 0x0F), note & 0x7F, 0]
}

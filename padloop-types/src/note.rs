use serde::{Deserialize, Serialize};

/// Seconds on the engine's monotonic clock.
pub type Seconds = f64;

/// Index of a pad on the grid (0-based).
pub type PadIndex = u8;

/// Number of pads on the grid, and so of chord slots.
pub const PAD_COUNT: usize = 16;

/// A single recorded note-on or note-off.
///
/// `time_offset` is relative to the start instant of the loop that owns the
/// event. Events are immutable once recorded; quantization and trimming build
/// new events through [`NoteEvent::with_offset`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub note: u8,
    pub velocity: u8,
    pub time_offset: Seconds,
    pub pad_index: PadIndex,
}

impl NoteEvent {
    pub fn new(note: u8, velocity: u8, time_offset: Seconds, pad_index: PadIndex) -> Self {
        Self {
            note,
            velocity,
            time_offset,
            pad_index,
        }
    }

    /// Same note, moved to a different offset.
    pub fn with_offset(&self, time_offset: Seconds) -> Self {
        Self {
            time_offset,
            ..*self
        }
    }

    /// Same event transposed by `semitones`, or `None` if it leaves the MIDI range.
    pub fn transposed(&self, semitones: i16) -> Option<Self> {
        let pitch = self.note as i16 + semitones;
        if (0..=127).contains(&pitch) {
            Some(Self {
                note: pitch as u8,
                ..*self
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_offset_keeps_note_data() {
        let ev = NoteEvent::new(60, 100, 0.25, 3);
        let moved = ev.with_offset(0.5);
        assert_eq!(moved.note, 60);
        assert_eq!(moved.velocity, 100);
        assert_eq!(moved.pad_index, 3);
        assert_eq!(moved.time_offset, 0.5);
    }

    #[test]
    fn transposed_stays_in_midi_range() {
        let ev = NoteEvent::new(120, 100, 0.0, 0);
        assert_eq!(ev.transposed(7).map(|e| e.note), Some(127));
        assert!(ev.transposed(12).is_none());
        let low = NoteEvent::new(5, 100, 0.0, 0);
        assert!(low.transposed(-12).is_none());
    }
}

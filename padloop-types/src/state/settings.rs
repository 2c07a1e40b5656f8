use serde::{Deserialize, Serialize};

use super::{ArpType, LoopKind, NoteLength, TrimMode};

/// Flat set of named parameters loaded at startup and saved at shutdown.
///
/// Every field has a default so partial files load cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tempo used until an external clock corroborates another one.
    pub bpm: u16,
    /// MIDI note sounded by pad 0.
    pub base_note: u8,
    pub default_velocity: u8,
    /// Follow the external MIDI transport instead of starting immediately.
    pub external_sync: bool,
    pub trim_mode: TrimMode,
    pub quantize_grid: NoteLength,
    /// 0 leaves notes alone, 100 snaps them onto the grid.
    pub quantize_strength: u8,
    pub quantize_loop: bool,
    pub arp_type: ArpType,
    pub arp_length: NoteLength,
    /// Octave shift applied to arpeggiated notes (-3..=3).
    pub arp_octave: i8,
    pub arp_mono: bool,
    /// Encoder detents per arpeggiator step.
    pub encoder_steps_per_note: u8,
    pub chord_kind: LoopKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bpm: 120,
            base_note: 36,
            default_velocity: 100,
            external_sync: false,
            trim_mode: TrimMode::Both,
            quantize_grid: NoteLength::Sixteenth,
            quantize_strength: 100,
            quantize_loop: true,
            arp_type: ArpType::Up,
            arp_length: NoteLength::Eighth,
            arp_octave: 0,
            arp_mono: true,
            encoder_steps_per_note: 1,
            chord_kind: LoopKind::ChordLoop,
        }
    }
}

impl Settings {
    /// Clamp values that may have come from a hand-edited file.
    pub fn sanitized(mut self) -> Self {
        self.bpm = self.bpm.clamp(20, 300);
        self.base_note = self.base_note.min(127 - 15);
        self.default_velocity = self.default_velocity.clamp(1, 127);
        self.quantize_strength = self.quantize_strength.min(100);
        self.arp_octave = self.arp_octave.clamp(-3, 3);
        self.encoder_steps_per_note = self.encoder_steps_per_note.max(1);
        if self.chord_kind == LoopKind::Loop {
            self.chord_kind = LoopKind::ChordLoop;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_already_sane() {
        let settings = Settings::default();
        assert_eq!(settings.clone().sanitized(), settings);
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let settings = Settings {
            bpm: 1000,
            quantize_strength: 250,
            arp_octave: 9,
            encoder_steps_per_note: 0,
            chord_kind: LoopKind::Loop,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(settings.bpm, 300);
        assert_eq!(settings.quantize_strength, 100);
        assert_eq!(settings.arp_octave, 3);
        assert_eq!(settings.encoder_steps_per_note, 1);
        assert_eq!(settings.chord_kind, LoopKind::ChordLoop);
    }
}

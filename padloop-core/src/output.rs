//! Outward side effects of the engine: MIDI notes, display text and pad LEDs.
//!
//! `ControllerOutput` captures what the engine *means* to do independently of
//! the MIDI port or renderer behind it, so sequencing logic can be tested
//! without hardware. Every call is one-way; nothing returned here feeds back
//! into engine decisions.

use std::collections::BTreeSet;

use padloop_types::{PadColor, PadIndex};

pub trait ControllerOutput {
    fn send_note_on(&mut self, note: u8, velocity: u8);

    fn send_note_off(&mut self, note: u8);

    /// Show a short message on the status display.
    fn notify(&mut self, text: &str);

    fn set_pad_lit(&mut self, pad: PadIndex, color: PadColor);
}

// ─── NullOutput ─────────────────────────────────────────────────────

/// Discards everything. Useful when no port or display is attached.
pub struct NullOutput;

impl ControllerOutput for NullOutput {
    fn send_note_on(&mut self, _: u8, _: u8) {}
    fn send_note_off(&mut self, _: u8) {}
    fn notify(&mut self, _: &str) {}
    fn set_pad_lit(&mut self, _: PadIndex, _: PadColor) {}
}

// ─── TestOutput ─────────────────────────────────────────────────────

/// A recorded output operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputOp {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    Notify(String),
    PadLit { pad: PadIndex, color: PadColor },
}

/// Records every operation for assertions and keeps track of which notes are
/// currently sounding.
#[derive(Debug, Default)]
pub struct TestOutput {
    ops: Vec<OutputOp>,
    sounding: BTreeSet<u8>,
}

impl TestOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return all recorded operations.
    pub fn operations(&self) -> &[OutputOp] {
        &self.ops
    }

    /// Forget recorded operations; sounding notes are kept.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Notes that received a note-on without a later note-off.
    pub fn sounding_notes(&self) -> Vec<u8> {
        self.sounding.iter().copied().collect()
    }

    pub fn is_sounding(&self, note: u8) -> bool {
        self.sounding.contains(&note)
    }

    pub fn notes_on(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                OutputOp::NoteOn { note, .. } => Some(*note),
                _ => None,
            })
            .collect()
    }

    pub fn notes_off(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                OutputOp::NoteOff { note } => Some(*note),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                OutputOp::Notify(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Most recent color requested for `pad`.
    pub fn pad_color(&self, pad: PadIndex) -> Option<PadColor> {
        self.ops.iter().rev().find_map(|op| match op {
            OutputOp::PadLit { pad: p, color } if *p == pad => Some(*color),
            _ => None,
        })
    }
}

impl ControllerOutput for TestOutput {
    fn send_note_on(&mut self, note: u8, velocity: u8) {
        self.sounding.insert(note);
        self.ops.push(OutputOp::NoteOn { note, velocity });
    }

    fn send_note_off(&mut self, note: u8) {
        self.sounding.remove(&note);
        self.ops.push(OutputOp::NoteOff { note });
    }

    fn notify(&mut self, text: &str) {
        self.ops.push(OutputOp::Notify(text.to_string()));
    }

    fn set_pad_lit(&mut self, pad: PadIndex, color: PadColor) {
        self.ops.push(OutputOp::PadLit { pad, color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_tracks_sounding_notes() {
        let mut out = TestOutput::new();
        out.send_note_on(60, 100);
        out.send_note_on(64, 90);
        out.send_note_off(60);
        assert_eq!(out.sounding_notes(), vec![64]);
        assert_eq!(out.notes_on(), vec![60, 64]);
        assert_eq!(out.notes_off(), vec![60]);
    }

    #[test]
    fn pad_color_reports_latest_request() {
        let mut out = TestOutput::new();
        out.set_pad_lit(2, PadColor::Recording);
        out.set_pad_lit(3, PadColor::Held);
        out.set_pad_lit(2, PadColor::Loaded);
        assert_eq!(out.pad_color(2), Some(PadColor::Loaded));
        assert_eq!(out.pad_color(3), Some(PadColor::Held));
        assert_eq!(out.pad_color(4), None);
    }
}

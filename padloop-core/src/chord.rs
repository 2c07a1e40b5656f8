//! Sixteen chord slots, one per pad.
//!
//! A slot is either empty or holds a short `LoopTrack` of kind `Chord`
//! (one-shot, retriggerable) or `ChordLoop`. Only one slot records at a time.
//! With external sync, pressing a slot only marks it pending; pending slots
//! start together when the transport is next seen running.

use padloop_types::{LoopKind, PadColor, PadIndex, Seconds, Settings, PAD_COUNT};

use crate::clock::TempoClock;
use crate::error::EngineResult;
use crate::looper::{DueEvents, LoopTrack, RecordOutcome, SyncState};
use crate::output::ControllerOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordOutcome {
    /// An empty slot started recording.
    Recording,
    /// An occupied slot was deleted.
    Removed,
    /// Another slot is already recording, or the pad is out of range.
    Rejected,
}

#[derive(Debug, Clone)]
pub struct ChordManager {
    slots: [Option<LoopTrack>; PAD_COUNT],
    pending: [bool; PAD_COUNT],
    recording_pad: Option<PadIndex>,
    global_playing: bool,
}

impl Default for ChordManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ChordManager {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            pending: [false; PAD_COUNT],
            recording_pad: None,
            global_playing: false,
        }
    }

    pub fn recording_pad(&self) -> Option<PadIndex> {
        self.recording_pad
    }

    pub fn global_playing(&self) -> bool {
        self.global_playing
    }

    pub fn slot(&self, pad: PadIndex) -> Option<&LoopTrack> {
        self.slots.get(pad as usize)?.as_ref()
    }

    pub fn is_occupied(&self, pad: PadIndex) -> bool {
        self.slot(pad).is_some()
    }

    pub fn is_pending(&self, pad: PadIndex) -> bool {
        self.pending.get(pad as usize).copied().unwrap_or(false)
    }

    /// Start recording into an empty slot, or delete an occupied one.
    pub fn toggle_record(
        &mut self,
        pad: PadIndex,
        kind: LoopKind,
        now: Seconds,
        out: &mut dyn ControllerOutput,
    ) -> ChordOutcome {
        let idx = pad as usize;
        if idx >= PAD_COUNT {
            return ChordOutcome::Rejected;
        }

        if let Some(mut track) = self.slots[idx].take() {
            track.clear(out);
            self.pending[idx] = false;
            if self.recording_pad == Some(pad) {
                self.recording_pad = None;
            }
            out.set_pad_lit(pad, PadColor::Off);
            log::debug!(target: "chord", "slot {} removed", pad);
            return ChordOutcome::Removed;
        }

        if let Some(active) = self.recording_pad {
            log::debug!(target: "chord", "slot {} not recorded: slot {} is recording", pad, active);
            return ChordOutcome::Rejected;
        }

        let mut track = LoopTrack::new(kind);
        track.toggle_record(Some(true), now, SyncState::default(), out);
        self.slots[idx] = Some(track);
        self.recording_pad = Some(pad);
        out.set_pad_lit(pad, PadColor::Recording);
        ChordOutcome::Recording
    }

    /// Finish the recording slot: trim, quantize and leave it loaded but
    /// stopped. Returns the pad that was recording.
    pub fn stop_recording(
        &mut self,
        now: Seconds,
        settings: &Settings,
        clock: &TempoClock,
        out: &mut dyn ControllerOutput,
    ) -> Option<PadIndex> {
        let pad = self.recording_pad.take()?;
        let track = self.slots[pad as usize].as_mut()?;
        let sync = SyncState {
            external: settings.external_sync,
            transport_running: clock.play_state(),
        };
        track.toggle_record(Some(false), now, sync, out);
        track.trim_silence(settings.trim_mode);
        track.quantize_notes(settings.quantize_grid, settings.quantize_strength, clock);
        track.quantize_loop(clock);
        track.stop(out);
        out.set_pad_lit(pad, PadColor::Loaded);
        log::debug!(
            target: "chord",
            "slot {} ready: {:.3}s, {} notes",
            pad,
            track.total_duration(),
            track.on_events().len()
        );
        Some(pad)
    }

    /// Record a note into the slot that is recording, if any.
    pub fn record_event(
        &mut self,
        note: u8,
        velocity: u8,
        pad: PadIndex,
        is_on: bool,
        now: Seconds,
        out: &mut dyn ControllerOutput,
    ) -> EngineResult<RecordOutcome> {
        let Some(slot) = self.recording_pad else {
            return Ok(RecordOutcome::Ignored);
        };
        let Some(track) = self.slots[slot as usize].as_mut() else {
            return Ok(RecordOutcome::Ignored);
        };
        let result = track.add_event(note, velocity, pad, is_on, now, out);
        if result.is_err() {
            // the track stopped itself at the note ceiling
            self.recording_pad = None;
            track.stop(out);
            out.set_pad_lit(slot, PadColor::Loaded);
        }
        result
    }

    /// A chord pad was pressed outside recording.
    pub fn on_pad_pressed(
        &mut self,
        pad: PadIndex,
        external_sync: bool,
        now: Seconds,
        out: &mut dyn ControllerOutput,
    ) {
        if !self.is_occupied(pad) || self.recording_pad == Some(pad) {
            log::debug!(target: "chord", "press on slot {} ignored", pad);
            return;
        }

        if external_sync {
            let idx = pad as usize;
            self.pending[idx] = !self.pending[idx];
            let color = if self.pending[idx] {
                PadColor::Pending
            } else if self.slot(pad).is_some_and(|t| t.is_playing()) {
                PadColor::Playing
            } else {
                PadColor::Loaded
            };
            out.set_pad_lit(pad, color);
        } else {
            self.trigger_playback(pad, now, out);
        }
    }

    /// Toggle a looping chord, or restart a one-shot.
    pub fn trigger_playback(&mut self, pad: PadIndex, now: Seconds, out: &mut dyn ControllerOutput) {
        let Some(track) = self.slots.get_mut(pad as usize).and_then(Option::as_mut) else {
            return;
        };
        let playing = match track.kind() {
            LoopKind::Chord => true,
            LoopKind::ChordLoop | LoopKind::Loop => !track.is_playing(),
        };
        track.set_playing(playing, now, out);
        out.set_pad_lit(pad, if playing { PadColor::Playing } else { PadColor::Loaded });
    }

    /// Flip a slot between one-shot and looping playback.
    pub fn toggle_kind(&mut self, pad: PadIndex, now: Seconds, out: &mut dyn ControllerOutput) {
        if self.recording_pad == Some(pad) {
            return;
        }
        if let Some(track) = self.slots.get_mut(pad as usize).and_then(Option::as_mut) {
            track.toggle_kind(now, out);
            let name = track.kind().name();
            out.notify(name);
        }
    }

    /// Start every pending slot the first time the transport is seen running.
    pub fn on_transport_tick(&mut self, transport_running: bool, now: Seconds, out: &mut dyn ControllerOutput) {
        if !transport_running || self.global_playing {
            return;
        }
        self.global_playing = true;
        for pad in 0..PAD_COUNT {
            if self.pending[pad] {
                self.trigger_playback(pad as PadIndex, now, out);
            }
        }
    }

    /// Stop every slot once the transport is seen stopped. Slots that were
    /// pending and playing stay pending for the next start.
    pub fn on_transport_stopped(&mut self, transport_running: bool, out: &mut dyn ControllerOutput) {
        if transport_running || !self.global_playing {
            return;
        }
        self.global_playing = false;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let Some(track) = slot.as_mut() else {
                continue;
            };
            self.pending[idx] = self.pending[idx] && track.is_playing();
            track.stop(out);
            let color = if self.pending[idx] {
                PadColor::Pending
            } else {
                PadColor::Loaded
            };
            out.set_pad_lit(idx as PadIndex, color);
        }
    }

    /// Due events from every playing slot.
    pub fn poll(&mut self, now: Seconds, out: &mut dyn ControllerOutput) -> Vec<DueEvents> {
        let mut due = Vec::new();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let Some(track) = slot.as_mut() else {
                continue;
            };
            if !track.is_playing() {
                continue;
            }
            if let Some(events) = track.get_due_events(now, out) {
                due.push(events);
            }
            if !track.is_playing() {
                // a one-shot just ended
                let color = if self.pending[idx] {
                    PadColor::Pending
                } else {
                    PadColor::Loaded
                };
                out.set_pad_lit(idx as PadIndex, color);
            }
        }
        due
    }

    /// Stop every slot without deleting it; pending flags are dropped.
    pub fn stop_all(&mut self, out: &mut dyn ControllerOutput) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(track) = slot.as_mut() {
                track.stop(out);
                out.set_pad_lit(idx as PadIndex, PadColor::Loaded);
            }
        }
        self.pending = [false; PAD_COUNT];
    }

    /// Delete every slot and silence everything they recorded.
    pub fn clear_all(&mut self, out: &mut dyn ControllerOutput) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(mut track) = slot.take() {
                track.clear(out);
                out.set_pad_lit(idx as PadIndex, PadColor::Off);
            }
        }
        self.pending = [false; PAD_COUNT];
        self.recording_pad = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TestOutput;

    /// Record a single held note into `pad` between `start` and `start + 1.0`.
    fn record_chord(mgr: &mut ChordManager, pad: PadIndex, kind: LoopKind, start: Seconds, out: &mut TestOutput) {
        let settings = Settings {
            trim_mode: padloop_types::TrimMode::None,
            ..Settings::default()
        };
        let clock = TempoClock::new(120);
        assert_eq!(mgr.toggle_record(pad, kind, start, out), ChordOutcome::Recording);
        mgr.record_event(60, 100, 0, true, start + 0.0, out).unwrap();
        mgr.record_event(64, 100, 4, true, start + 0.0, out).unwrap();
        mgr.record_event(60, 0, 0, false, start + 0.4, out).unwrap();
        mgr.record_event(64, 0, 4, false, start + 0.4, out).unwrap();
        assert_eq!(mgr.stop_recording(start + 1.0, &settings, &clock, out), Some(pad));
    }

    fn poll_notes_on(mgr: &mut ChordManager, now: Seconds, out: &mut TestOutput) -> Vec<u8> {
        mgr.poll(now, out)
            .iter()
            .flat_map(|d| d.on.iter().map(|e| e.note))
            .collect()
    }

    #[test]
    fn toggle_record_adds_then_removes() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        record_chord(&mut mgr, 3, LoopKind::ChordLoop, 0.0, &mut out);
        assert!(mgr.is_occupied(3));
        assert_eq!(mgr.recording_pad(), None);
        let track = mgr.slot(3).unwrap();
        assert!(!track.is_playing());
        assert!((track.total_duration() - 1.0).abs() < 1e-9);
        assert_eq!(out.pad_color(3), Some(PadColor::Loaded));

        assert_eq!(mgr.toggle_record(3, LoopKind::ChordLoop, 2.0, &mut out), ChordOutcome::Removed);
        assert!(!mgr.is_occupied(3));
        assert_eq!(out.pad_color(3), Some(PadColor::Off));
    }

    #[test]
    fn only_one_slot_records_at_a_time() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        assert_eq!(mgr.toggle_record(1, LoopKind::Chord, 0.0, &mut out), ChordOutcome::Recording);
        assert_eq!(mgr.toggle_record(2, LoopKind::Chord, 0.1, &mut out), ChordOutcome::Rejected);
        assert!(!mgr.is_occupied(2));
        assert_eq!(mgr.recording_pad(), Some(1));
        assert_eq!(mgr.toggle_record(40, LoopKind::Chord, 0.1, &mut out), ChordOutcome::Rejected);
    }

    #[test]
    fn record_event_without_recording_slot_is_ignored() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        assert_eq!(mgr.record_event(60, 100, 0, true, 0.0, &mut out).unwrap(), RecordOutcome::Ignored);
    }

    #[test]
    fn presses_on_empty_or_recording_slot_are_ignored() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        mgr.on_pad_pressed(5, false, 0.0, &mut out);
        assert!(out.operations().is_empty());

        mgr.toggle_record(5, LoopKind::ChordLoop, 0.0, &mut out);
        out.clear();
        mgr.on_pad_pressed(5, false, 0.5, &mut out);
        assert!(out.operations().is_empty());
        assert!(mgr.slot(5).unwrap().is_recording());
    }

    #[test]
    fn chord_loop_press_toggles_playback() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        record_chord(&mut mgr, 0, LoopKind::ChordLoop, 0.0, &mut out);

        mgr.on_pad_pressed(0, false, 5.0, &mut out);
        assert!(mgr.slot(0).unwrap().is_playing());
        assert_eq!(out.pad_color(0), Some(PadColor::Playing));
        assert_eq!(poll_notes_on(&mut mgr, 5.01, &mut out), vec![60, 64]);

        mgr.on_pad_pressed(0, false, 5.5, &mut out);
        assert!(!mgr.slot(0).unwrap().is_playing());
        assert!(mgr.poll(5.6, &mut out).is_empty());
    }

    #[test]
    fn one_shot_chord_retriggers_and_ends() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        record_chord(&mut mgr, 2, LoopKind::Chord, 0.0, &mut out);

        mgr.on_pad_pressed(2, false, 5.0, &mut out);
        assert_eq!(poll_notes_on(&mut mgr, 5.01, &mut out), vec![60, 64]);
        // pressing again restarts rather than stopping
        mgr.on_pad_pressed(2, false, 5.2, &mut out);
        assert!(mgr.slot(2).unwrap().is_playing());
        assert_eq!(poll_notes_on(&mut mgr, 5.21, &mut out), vec![60, 64]);

        // past the end the one-shot stops and nothing is left sounding
        assert!(mgr.poll(6.5, &mut out).is_empty());
        assert!(!mgr.slot(2).unwrap().is_playing());
        assert_eq!(out.pad_color(2), Some(PadColor::Loaded));
        assert!(out.notes_off().contains(&60));
    }

    #[test]
    fn external_sync_defers_until_transport_starts() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        record_chord(&mut mgr, 7, LoopKind::ChordLoop, 0.0, &mut out);
        out.clear();

        mgr.on_pad_pressed(7, true, 2.0, &mut out);
        assert!(mgr.is_pending(7));
        assert_eq!(out.pad_color(7), Some(PadColor::Pending));
        assert!(poll_notes_on(&mut mgr, 2.1, &mut out).is_empty());

        // a tick while the transport is stopped changes nothing
        mgr.on_transport_tick(false, 2.2, &mut out);
        assert!(poll_notes_on(&mut mgr, 2.3, &mut out).is_empty());
        assert!(out.notes_on().is_empty());

        mgr.on_transport_tick(true, 3.0, &mut out);
        assert!(mgr.global_playing());
        assert_eq!(poll_notes_on(&mut mgr, 3.01, &mut out), vec![60, 64]);
    }

    #[test]
    fn transport_stop_rearms_playing_pending_slots() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        record_chord(&mut mgr, 1, LoopKind::ChordLoop, 0.0, &mut out);
        record_chord(&mut mgr, 2, LoopKind::ChordLoop, 1.5, &mut out);

        mgr.on_pad_pressed(1, true, 3.0, &mut out);
        mgr.on_transport_tick(true, 4.0, &mut out);
        assert!(mgr.slot(1).unwrap().is_playing());
        assert!(!mgr.slot(2).unwrap().is_playing());

        mgr.on_transport_stopped(false, &mut out);
        assert!(!mgr.global_playing());
        assert!(mgr.is_pending(1));
        assert!(!mgr.is_pending(2));
        assert!(!mgr.slot(1).unwrap().is_playing());
        assert!(out.sounding_notes().is_empty());
        assert_eq!(out.pad_color(1), Some(PadColor::Pending));
        assert_eq!(out.pad_color(2), Some(PadColor::Loaded));

        // next start resumes without another press
        mgr.on_transport_tick(true, 10.0, &mut out);
        assert!(mgr.slot(1).unwrap().is_playing());
    }

    #[test]
    fn toggle_kind_switches_slot() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        record_chord(&mut mgr, 4, LoopKind::ChordLoop, 0.0, &mut out);
        mgr.toggle_kind(4, 2.0, &mut out);
        assert_eq!(mgr.slot(4).unwrap().kind(), LoopKind::Chord);
        assert_eq!(out.notices().last().map(String::as_str), Some(LoopKind::Chord.name()));
    }

    #[test]
    fn clear_all_silences_every_slot() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        record_chord(&mut mgr, 0, LoopKind::ChordLoop, 0.0, &mut out);
        mgr.on_pad_pressed(0, false, 2.0, &mut out);
        for events in mgr.poll(2.01, &mut out) {
            for ev in events.on {
                out.send_note_on(ev.note, ev.velocity);
            }
        }
        assert!(!out.sounding_notes().is_empty());

        mgr.clear_all(&mut out);
        assert!(out.sounding_notes().is_empty());
        assert!(!mgr.is_occupied(0));
        assert!(mgr.poll(2.5, &mut out).is_empty());
    }

    #[test]
    fn stop_all_keeps_slots() {
        let mut out = TestOutput::new();
        let mut mgr = ChordManager::new();
        record_chord(&mut mgr, 0, LoopKind::ChordLoop, 0.0, &mut out);
        record_chord(&mut mgr, 1, LoopKind::ChordLoop, 1.5, &mut out);
        mgr.on_pad_pressed(0, false, 3.0, &mut out);
        mgr.on_pad_pressed(1, true, 3.0, &mut out);

        mgr.stop_all(&mut out);
        assert!(mgr.is_occupied(0));
        assert!(!mgr.slot(0).unwrap().is_playing());
        assert!(!mgr.is_pending(1));
        assert!(mgr.poll(3.1, &mut out).is_empty());
    }
}

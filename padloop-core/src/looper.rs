//! Single-track loop recorder and player.
//!
//! A `LoopTrack` records note-on and note-off events as offsets from the
//! instant recording started, then replays them cycle after cycle. Each cycle
//! works on copies of the recorded events (the queues) which are drained as
//! events fall due, so every event fires exactly once per cycle and nothing
//! can fire after the queues are cleared.

use std::collections::BTreeSet;

use padloop_types::{LoopKind, NoteEvent, NoteLength, PadColor, PadIndex, Seconds, TrimMode};

use crate::clock::TempoClock;
use crate::error::{EngineError, EngineResult};
use crate::output::ControllerOutput;

/// Ceiling on recorded note-ons per track. Event storage is allocated up
/// front for this many events.
pub const MAX_NOTES: usize = 256;

/// Added after the last note-off when trimming the end.
const TRIM_END_PADDING: Seconds = 0.01;

/// How long before the loop end a synthesized note-off lands.
const SYNTHESIZED_OFF_LEAD: Seconds = 0.05;

/// Transport conditions a track needs when recording stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Playback follows the external MIDI transport.
    pub external: bool,
    pub transport_running: bool,
}

impl SyncState {
    pub fn waiting_for_transport(&self) -> bool {
        self.external && !self.transport_running
    }
}

/// Result of offering an event to a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// The track was not recording; nothing changed.
    Ignored,
}

/// Events that fell due during one poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DueEvents {
    pub on: Vec<NoteEvent>,
    pub off: Vec<NoteEvent>,
}

#[derive(Debug, Clone)]
pub struct LoopTrack {
    kind: LoopKind,
    /// Instant the current cycle (or recording) started; `None` when not running.
    start_instant: Option<Seconds>,
    /// Loop length; 0.0 until the first recording is finished.
    total_duration: Seconds,
    on_events: Vec<NoteEvent>,
    off_events: Vec<NoteEvent>,
    on_queue: Vec<NoteEvent>,
    off_queue: Vec<NoteEvent>,
    play_state: bool,
    record_state: bool,
    has_content: bool,
}

impl LoopTrack {
    pub fn new(kind: LoopKind) -> Self {
        Self {
            kind,
            start_instant: None,
            total_duration: 0.0,
            on_events: Vec::with_capacity(MAX_NOTES),
            off_events: Vec::with_capacity(MAX_NOTES),
            on_queue: Vec::with_capacity(MAX_NOTES),
            off_queue: Vec::with_capacity(MAX_NOTES),
            play_state: false,
            record_state: false,
            has_content: false,
        }
    }

    pub fn kind(&self) -> LoopKind {
        self.kind
    }

    pub fn is_playing(&self) -> bool {
        self.play_state
    }

    pub fn is_recording(&self) -> bool {
        self.record_state
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }

    pub fn total_duration(&self) -> Seconds {
        self.total_duration
    }

    pub fn start_instant(&self) -> Option<Seconds> {
        self.start_instant
    }

    pub fn on_events(&self) -> &[NoteEvent] {
        &self.on_events
    }

    pub fn off_events(&self) -> &[NoteEvent] {
        &self.off_events
    }

    /// Toggle recording, or force it with `Some(state)`.
    ///
    /// Recording can only start on an empty track; it starts playback and
    /// stamps the start instant. Stopping the first recording freezes the loop
    /// length.
    pub fn toggle_record(
        &mut self,
        on: Option<bool>,
        now: Seconds,
        sync: SyncState,
        out: &mut dyn ControllerOutput,
    ) {
        let enable = on.unwrap_or(!self.record_state);
        if enable == self.record_state {
            return;
        }

        if enable {
            if self.has_content {
                log::debug!(target: "looper", "record ignored: {} track already has content", self.kind.name());
                return;
            }
            self.record_state = true;
            self.play_state = true;
            self.reset(now, out);
            log::debug!(target: "looper", "{} recording at {:.3}", self.kind.name(), now);
        } else {
            self.record_state = false;
            if self.has_content {
                return;
            }
            self.finish_recording(now);
            if sync.waiting_for_transport() {
                self.play_state = false;
                self.release_notes(out);
            }
        }
    }

    fn finish_recording(&mut self, now: Seconds) {
        self.record_state = false;
        let start = self.start_instant.unwrap_or(now);
        self.total_duration = (now - start).max(0.0);
        self.has_content = true;
        log::debug!(
            target: "looper",
            "{} recorded {:.3}s, {} notes",
            self.kind.name(),
            self.total_duration,
            self.on_events.len()
        );
    }

    /// Record a note-on (`is_on`) or note-off at `now`.
    pub fn add_event(
        &mut self,
        note: u8,
        velocity: u8,
        pad_index: PadIndex,
        is_on: bool,
        now: Seconds,
        out: &mut dyn ControllerOutput,
    ) -> EngineResult<RecordOutcome> {
        let start = match self.start_instant {
            Some(start) if self.record_state => start,
            _ => {
                log::debug!(target: "looper", "event for note {} ignored: not recording", note);
                out.notify("Not recording");
                return Ok(RecordOutcome::Ignored);
            }
        };

        let events = if is_on {
            &mut self.on_events
        } else {
            &mut self.off_events
        };
        if events.len() >= MAX_NOTES {
            if !is_on {
                // the matching note-on never made it in
                return Ok(RecordOutcome::Ignored);
            }
            self.finish_recording(now);
            out.notify("Max notes");
            log::warn!(target: "looper", "note ceiling of {} reached, recording stopped", MAX_NOTES);
            return Err(EngineError::Capacity { limit: MAX_NOTES });
        }

        events.push(NoteEvent::new(note, velocity, now - start, pad_index));
        Ok(RecordOutcome::Recorded)
    }

    /// Start a new cycle at `now`: refill the queues from the recorded events
    /// and silence every note the track knows about.
    pub fn reset(&mut self, now: Seconds, out: &mut dyn ControllerOutput) {
        self.start_instant = Some(now);
        self.on_queue.clear();
        self.on_queue.extend_from_slice(&self.on_events);
        self.off_queue.clear();
        self.off_queue.extend_from_slice(&self.off_events);
        self.release_notes(out);
    }

    fn release_notes(&self, out: &mut dyn ControllerOutput) {
        let notes: BTreeSet<u8> = self.on_events.iter().map(|e| e.note).collect();
        let pads: BTreeSet<PadIndex> = self.on_events.iter().map(|e| e.pad_index).collect();
        for note in notes {
            out.send_note_off(note);
        }
        for pad in pads {
            out.set_pad_lit(pad, PadColor::Off);
        }
    }

    /// Forget everything and silence every recorded note.
    pub fn clear(&mut self, out: &mut dyn ControllerOutput) {
        self.release_notes(out);
        self.on_events.clear();
        self.off_events.clear();
        self.on_queue.clear();
        self.off_queue.clear();
        self.total_duration = 0.0;
        self.start_instant = None;
        self.play_state = false;
        self.record_state = false;
        self.has_content = false;
    }

    /// Start playing recorded content from the top.
    pub fn play(&mut self, now: Seconds, out: &mut dyn ControllerOutput) -> RecordOutcome {
        if !self.has_content || self.total_duration <= 0.0 {
            log::debug!(target: "looper", "play ignored: {} track is empty", self.kind.name());
            return RecordOutcome::Ignored;
        }
        self.play_state = true;
        self.reset(now, out);
        RecordOutcome::Recorded
    }

    /// Stop playback and silence the track.
    pub fn stop(&mut self, out: &mut dyn ControllerOutput) {
        self.play_state = false;
        self.start_instant = None;
        self.on_queue.clear();
        self.off_queue.clear();
        self.release_notes(out);
    }

    /// Set the play flag and restart the cycle.
    pub fn set_playing(&mut self, playing: bool, now: Seconds, out: &mut dyn ControllerOutput) {
        self.play_state = playing;
        self.reset(now, out);
    }

    pub fn trim_silence(&mut self, mode: TrimMode) {
        if !self.has_content || self.on_events.is_empty() {
            return;
        }

        if mode.trims_start() {
            let first = self.on_events[0].time_offset;
            if first > 0.0 {
                for ev in self.on_events.iter_mut().chain(self.off_events.iter_mut()) {
                    *ev = ev.with_offset((ev.time_offset - first).max(0.0));
                }
                self.total_duration = (self.total_duration - first).max(0.0);
            }
        }

        if mode.trims_end() {
            let first_on = self.on_events[0].time_offset;
            let missing_off = self.on_events.len() > self.off_events.len();
            // a note still held when recording stopped sounds until the end
            let end = match self.off_events.last() {
                Some(off) if !missing_off => off.time_offset,
                Some(off) => off.time_offset.max(self.total_duration),
                None => self.total_duration,
            };
            self.total_duration = (end - first_on).max(0.0) + TRIM_END_PADDING;

            if missing_off {
                if let Some(last_on) = self.on_events.last().copied() {
                    let at = (self.total_duration - SYNTHESIZED_OFF_LEAD).max(last_on.time_offset);
                    let closing = NoteEvent::new(last_on.note, 0, at, last_on.pad_index);
                    if self.off_events.len() < MAX_NOTES {
                        self.off_events.push(closing);
                    }
                    log::debug!(target: "looper", "synthesized note-off for {} at {:.3}", last_on.note, at);
                }
            }
        }
    }

    /// Round the loop length up to a whole number of quarter notes.
    pub fn quantize_loop(&mut self, clock: &TempoClock) {
        let quarter = clock.quarter_duration();
        if self.total_duration <= 0.0 || quarter <= 0.0 {
            return;
        }
        // tolerance keeps exact multiples from being pushed up a beat
        let beats = (self.total_duration / quarter - 1e-9).ceil().max(1.0);
        self.total_duration = beats * quarter;
    }

    /// Pull note-ons towards the nearest `grid` line by `strength_percent`.
    ///
    /// Note-offs are left where they were recorded.
    pub fn quantize_notes(&mut self, grid: NoteLength, strength_percent: u8, clock: &TempoClock) {
        let cell = clock.note_duration(grid);
        let strength = strength_percent.min(100) as f64 / 100.0;
        if cell <= 0.0 || strength == 0.0 {
            return;
        }

        for ev in self.on_events.iter_mut() {
            let offset = ev.time_offset;
            let line = (offset / cell).floor() * cell;
            let target = if offset - line > cell / 2.0 { line + cell } else { line };
            let moved = if strength >= 1.0 {
                target
            } else {
                offset + (target - offset) * strength
            };
            *ev = ev.with_offset(moved);
        }
    }

    /// Flip between one-shot and looping chord playback.
    pub fn toggle_kind(&mut self, now: Seconds, out: &mut dyn ControllerOutput) {
        self.kind = match self.kind {
            LoopKind::Chord => LoopKind::ChordLoop,
            LoopKind::ChordLoop => LoopKind::Chord,
            LoopKind::Loop => {
                log::debug!(target: "looper", "toggle_kind ignored on the main loop");
                return;
            }
        };
        self.reset(now, out);
    }

    /// Collect the events due at `now`.
    ///
    /// Crossing the loop end restarts a repeating track or stops a one-shot;
    /// that poll returns `None`.
    pub fn get_due_events(&mut self, now: Seconds, out: &mut dyn ControllerOutput) -> Option<DueEvents> {
        let start = self.start_instant?;
        if self.total_duration <= 0.0 || !self.play_state {
            return None;
        }

        let elapsed = now - start;
        if elapsed > self.total_duration {
            if self.kind.repeats() {
                self.reset(now, out);
            } else {
                self.stop(out);
            }
            return None;
        }

        let on = drain_due(&mut self.on_queue, elapsed);
        let off = drain_due(&mut self.off_queue, elapsed);
        if on.is_empty() && off.is_empty() {
            None
        } else {
            Some(DueEvents { on, off })
        }
    }
}

fn drain_due(queue: &mut Vec<NoteEvent>, elapsed: Seconds) -> Vec<NoteEvent> {
    let mut due = Vec::new();
    queue.retain(|ev| {
        if ev.time_offset <= elapsed {
            due.push(*ev);
            false
        } else {
            true
        }
    });
    due
}

//! The device context: one tempo clock, the main loop, the arpeggiator and the
//! chord slots, driven by input events, inbound MIDI and a fast poll.

use std::path::Path;

use padloop_types::{ArpType, LoopKind, NoteEvent, PadColor, PadIndex, Seconds, Settings, PAD_COUNT};

use crate::arpeggiator::Arpeggiator;
use crate::chord::{ChordManager, ChordOutcome};
use crate::clock::TempoClock;
use crate::error::EngineResult;
use crate::looper::{DueEvents, LoopTrack, RecordOutcome, SyncState};
use crate::midi::MidiMessage;
use crate::output::ControllerOutput;
use crate::settings_store;

/// What the pads do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// Pads sound notes and record into the main loop.
    #[default]
    Play,
    /// Pads build the arpeggiator pool; the encoder steps through it.
    Arp,
    /// Pads trigger chord slots.
    Chord,
}

impl PlayMode {
    pub fn name(&self) -> &'static str {
        match self {
            PlayMode::Play => "Play",
            PlayMode::Arp => "Arp",
            PlayMode::Chord => "Chord",
        }
    }
}

/// Discrete events from the input driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    PadDown { pad: PadIndex, velocity: u8 },
    PadUp { pad: PadIndex },
    /// Signed encoder detents.
    Encoder(i32),
    ToggleLoopRecord,
    ToggleLoopPlay,
    ClearLoop,
    /// Record into an empty chord slot, or delete an occupied one.
    ChordRecord(PadIndex),
    StopChordRecording,
    ToggleChordKind(PadIndex),
    SetMode(PlayMode),
    SetArpType(ArpType),
}

pub struct DeviceContext {
    settings: Settings,
    clock: TempoClock,
    main_loop: LoopTrack,
    arp: Arpeggiator,
    chords: ChordManager,
    mode: PlayMode,
    /// Note sounding for each physically held pad.
    held: [Option<u8>; PAD_COUNT],
}

impl DeviceContext {
    pub fn new(settings: Settings) -> Self {
        let settings = settings.sanitized();
        Self {
            clock: TempoClock::new(settings.bpm as u32),
            main_loop: LoopTrack::new(LoopKind::Loop),
            arp: Arpeggiator::new(&settings),
            chords: ChordManager::new(),
            mode: PlayMode::default(),
            held: [None; PAD_COUNT],
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &TempoClock {
        &self.clock
    }

    pub fn main_loop(&self) -> &LoopTrack {
        &self.main_loop
    }

    pub fn arp(&self) -> &Arpeggiator {
        &self.arp
    }

    pub fn chords(&self) -> &ChordManager {
        &self.chords
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    fn sync_state(&self) -> SyncState {
        SyncState {
            external: self.settings.external_sync,
            transport_running: self.clock.play_state(),
        }
    }

    fn pad_note(&self, pad: PadIndex) -> Option<u8> {
        let note = self.settings.base_note as u16 + pad as u16;
        (note <= 127).then_some(note as u8)
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Seconds, out: &mut dyn ControllerOutput) {
        match event {
            InputEvent::PadDown { pad, velocity } => self.pad_down(pad, velocity, now, out),
            InputEvent::PadUp { pad } => self.pad_up(pad, now, out),
            InputEvent::Encoder(delta) => self.encoder(delta, now, out),
            InputEvent::ToggleLoopRecord => {
                if self.main_loop.is_recording() {
                    self.stop_loop_recording(now, out);
                } else if self.main_loop.has_content() {
                    out.notify("Clear loop first");
                } else {
                    let sync = self.sync_state();
                    self.main_loop.toggle_record(Some(true), now, sync, out);
                    out.notify("Recording");
                }
            }
            InputEvent::ToggleLoopPlay => {
                if self.main_loop.is_recording() {
                    return;
                }
                if self.main_loop.is_playing() {
                    self.main_loop.stop(out);
                    out.notify("Loop stopped");
                } else if self.main_loop.play(now, out) == RecordOutcome::Ignored {
                    out.notify("Loop empty");
                }
            }
            InputEvent::ClearLoop => {
                self.main_loop.clear(out);
                out.notify("Loop cleared");
            }
            InputEvent::ChordRecord(pad) => {
                let kind = self.settings.chord_kind;
                if self.chords.toggle_record(pad, kind, now, out) == ChordOutcome::Rejected {
                    out.notify("Chord busy");
                }
            }
            InputEvent::StopChordRecording => {
                self.chords.stop_recording(now, &self.settings, &self.clock, out);
            }
            InputEvent::ToggleChordKind(pad) => self.chords.toggle_kind(pad, now, out),
            InputEvent::SetMode(mode) => self.set_mode(mode, now, out),
            InputEvent::SetArpType(arp_type) => {
                self.settings.arp_type = arp_type;
                self.arp.set_arp_type(arp_type);
                out.notify(arp_type.name());
            }
        }
    }

    fn pad_down(&mut self, pad: PadIndex, velocity: u8, now: Seconds, out: &mut dyn ControllerOutput) {
        if pad as usize >= PAD_COUNT {
            return;
        }
        let Some(note) = self.pad_note(pad) else {
            return;
        };
        let velocity = if velocity == 0 {
            self.settings.default_velocity
        } else {
            velocity
        };

        match self.mode {
            PlayMode::Play => self.sound_pad(pad, note, velocity, now, out),
            PlayMode::Arp => {
                self.arp.add_note(NoteEvent::new(note, velocity, 0.0, pad));
                self.held[pad as usize] = Some(note);
                out.set_pad_lit(pad, PadColor::Held);
            }
            PlayMode::Chord => {
                if self.chords.recording_pad().is_some() {
                    self.sound_pad(pad, note, velocity, now, out);
                } else {
                    self.chords
                        .on_pad_pressed(pad, self.settings.external_sync, now, out);
                }
            }
        }
    }

    fn pad_up(&mut self, pad: PadIndex, now: Seconds, out: &mut dyn ControllerOutput) {
        let Some(note) = self.held.get_mut(pad as usize).and_then(Option::take) else {
            return;
        };
        out.set_pad_lit(pad, PadColor::Off);
        if self.mode == PlayMode::Arp {
            self.arp.remove_note(note);
        } else {
            out.send_note_off(note);
            self.record_note(note, 0, pad, false, now, out);
        }
    }

    fn sound_pad(&mut self, pad: PadIndex, note: u8, velocity: u8, now: Seconds, out: &mut dyn ControllerOutput) {
        out.send_note_on(note, velocity);
        out.set_pad_lit(pad, PadColor::Held);
        self.held[pad as usize] = Some(note);
        self.record_note(note, velocity, pad, true, now, out);
    }

    /// Route a note into whichever track is recording.
    fn record_note(
        &mut self,
        note: u8,
        velocity: u8,
        pad: PadIndex,
        is_on: bool,
        now: Seconds,
        out: &mut dyn ControllerOutput,
    ) {
        if self.main_loop.is_recording() {
            if let Err(e) = self.main_loop.add_event(note, velocity, pad, is_on, now, out) {
                log::warn!(target: "device", "main loop: {}", e);
                self.finish_loop(now, out);
            }
        } else if self.chords.recording_pad().is_some() {
            if let Err(e) = self.chords.record_event(note, velocity, pad, is_on, now, out) {
                log::warn!(target: "device", "chord slot: {}", e);
            }
        }
    }

    fn encoder(&mut self, delta: i32, now: Seconds, out: &mut dyn ControllerOutput) {
        match self.mode {
            PlayMode::Arp => {
                for _ in 0..delta.unsigned_abs() {
                    if !self.arp.skip_this_turn() {
                        self.step_arp(now, out);
                    }
                }
            }
            PlayMode::Play => {
                if self.settings.external_sync {
                    return;
                }
                let bpm = (self.clock.bpm() as i64 + delta as i64).clamp(20, 300) as u32;
                self.clock.set_bpm(bpm);
                self.settings.bpm = bpm as u16;
                out.notify(&format!("BPM {}", bpm));
            }
            PlayMode::Chord => {}
        }
    }

    fn step_arp(&mut self, now: Seconds, out: &mut dyn ControllerOutput) {
        let Some(event) = self.arp.next_note(now, &self.clock) else {
            return;
        };
        if let Some(prev) = self.arp.take_mono_release() {
            out.send_note_off(prev.note);
            self.record_note(prev.note, 0, prev.pad_index, false, now, out);
        }
        out.send_note_on(event.note, event.velocity);
        self.record_note(event.note, event.velocity, event.pad_index, true, now, out);
    }

    fn stop_loop_recording(&mut self, now: Seconds, out: &mut dyn ControllerOutput) {
        let sync = self.sync_state();
        self.main_loop.toggle_record(Some(false), now, sync, out);
        self.finish_loop(now, out);
    }

    /// Trim and quantize a freshly recorded main loop, then restart it.
    fn finish_loop(&mut self, now: Seconds, out: &mut dyn ControllerOutput) {
        self.main_loop.trim_silence(self.settings.trim_mode);
        self.main_loop.quantize_notes(
            self.settings.quantize_grid,
            self.settings.quantize_strength,
            &self.clock,
        );
        if self.settings.quantize_loop {
            self.main_loop.quantize_loop(&self.clock);
        }
        if self.main_loop.is_playing() {
            self.main_loop.reset(now, out);
        }
        out.notify(&format!("Loop {:.2}s", self.main_loop.total_duration()));
    }

    pub fn set_mode(&mut self, mode: PlayMode, now: Seconds, out: &mut dyn ControllerOutput) {
        if mode == self.mode {
            return;
        }
        for note in self.arp.release_all() {
            out.send_note_off(note);
        }
        self.arp.clear_pool();
        let previous = self.mode;
        for pad in 0..PAD_COUNT {
            if let Some(note) = self.held[pad].take() {
                out.set_pad_lit(pad as PadIndex, PadColor::Off);
                if previous != PlayMode::Arp {
                    out.send_note_off(note);
                    self.record_note(note, 0, pad as PadIndex, false, now, out);
                }
            }
        }
        self.mode = mode;
        log::debug!(target: "device", "mode {} -> {}", previous.name(), mode.name());
        out.notify(mode.name());
    }

    /// Silence everything: stop the main loop and every chord slot, release
    /// arp notes and held pads. Recorded content is kept.
    pub fn stop_all(&mut self, now: Seconds, out: &mut dyn ControllerOutput) {
        if self.main_loop.is_recording() {
            self.stop_loop_recording(now, out);
        }
        self.main_loop.stop(out);
        self.chords.stop_all(out);
        for note in self.arp.release_all() {
            out.send_note_off(note);
        }
        for pad in 0..PAD_COUNT {
            if let Some(note) = self.held[pad].take() {
                out.send_note_off(note);
                out.set_pad_lit(pad as PadIndex, PadColor::Off);
            }
        }
    }

    pub fn handle_midi(&mut self, msg: MidiMessage, now: Seconds, out: &mut dyn ControllerOutput) {
        match msg {
            MidiMessage::Clock => {
                if self.clock.on_tick(now) {
                    out.notify(&format!("BPM {}", self.clock.bpm()));
                }
            }
            MidiMessage::Start => {
                self.clock.set_play_state(true);
                if self.settings.external_sync && self.main_loop.has_content() && !self.main_loop.is_recording() {
                    self.main_loop.play(now, out);
                }
            }
            MidiMessage::Continue => self.clock.set_play_state(true),
            MidiMessage::Stop => {
                self.clock.set_play_state(false);
                if self.settings.external_sync && !self.main_loop.is_recording() {
                    self.main_loop.stop(out);
                }
            }
            MidiMessage::NoteOn { note, velocity, .. } => {
                if let Some(pad) = self.note_pad(note) {
                    self.handle_input(InputEvent::PadDown { pad, velocity }, now, out);
                }
            }
            MidiMessage::NoteOff { note, .. } => {
                if let Some(pad) = self.note_pad(note) {
                    self.handle_input(InputEvent::PadUp { pad }, now, out);
                }
            }
        }
    }

    fn note_pad(&self, note: u8) -> Option<PadIndex> {
        let pad = note.checked_sub(self.settings.base_note)?;
        ((pad as usize) < PAD_COUNT).then_some(pad)
    }

    /// Fast cadence: transport bookkeeping, then every due note.
    pub fn poll(&mut self, now: Seconds, out: &mut dyn ControllerOutput) {
        let running = self.clock.play_state();
        self.chords.on_transport_tick(running, now, out);
        self.chords.on_transport_stopped(running, out);

        if let Some(due) = self.main_loop.get_due_events(now, out) {
            forward(&due, out);
        }
        for due in self.chords.poll(now, out) {
            forward(&due, out);
        }
        for event in self.arp.due_off_notes(now) {
            out.send_note_off(event.note);
            self.record_note(event.note, 0, event.pad_index, false, now, out);
        }
    }

    /// Persist the current settings; failures become a display notice.
    pub fn save_settings(&self, path: &Path, out: &mut dyn ControllerOutput) -> EngineResult {
        let result = settings_store::save_settings(path, &self.settings);
        if let Err(e) = &result {
            log::error!(target: "device", "saving settings failed: {}", e);
            out.notify("Save failed");
        }
        result
    }
}

fn forward(due: &DueEvents, out: &mut dyn ControllerOutput) {
    for ev in &due.on {
        out.send_note_on(ev.note, ev.velocity);
        out.set_pad_lit(ev.pad_index, PadColor::Playing);
    }
    for ev in &due.off {
        out.send_note_off(ev.note);
        out.set_pad_lit(ev.pad_index, PadColor::Off);
    }
}

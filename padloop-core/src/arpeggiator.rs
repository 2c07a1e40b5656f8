//! Arpeggiator: walks the held-note pool one step per encoder advance and
//! schedules each note's release from the configured arp length.

use padloop_types::{ArpType, NoteEvent, NoteLength, Seconds, Settings};

use crate::clock::TempoClock;

const DEFAULT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Steps through the held-note pool one note per encoder advance.
#[derive(Debug, Clone)]
pub struct Arpeggiator {
    /// Held notes, sorted by note number, no duplicates.
    pool: Vec<NoteEvent>,
    /// Note numbers of the pool as of the last advance.
    seen_pool: Vec<u8>,
    play_index: Option<usize>,
    previous_play_index: Option<usize>,
    previous: Option<NoteEvent>,
    mono_release: Option<NoteEvent>,
    scheduled_offs: Vec<(NoteEvent, Seconds)>,
    arp_type: ArpType,
    arp_length: NoteLength,
    octave: i8,
    mono: bool,
    steps_per_note: u8,
    step_counter: u8,
    rng_state: u64,
}

impl Arpeggiator {
    pub fn new(settings: &Settings) -> Self {
        Self::with_seed(settings, DEFAULT_SEED)
    }

    pub fn with_seed(settings: &Settings, seed: u64) -> Self {
        let mut arp = Self {
            pool: Vec::new(),
            seen_pool: Vec::new(),
            play_index: None,
            previous_play_index: None,
            previous: None,
            mono_release: None,
            scheduled_offs: Vec::new(),
            arp_type: ArpType::default(),
            arp_length: NoteLength::default(),
            octave: 0,
            mono: true,
            steps_per_note: 1,
            step_counter: 0,
            rng_state: seed,
        };
        arp.configure(settings);
        arp
    }

    /// Pick up traversal, length, octave and throttle settings.
    pub fn configure(&mut self, settings: &Settings) {
        self.arp_type = settings.arp_type;
        self.arp_length = settings.arp_length;
        self.octave = settings.arp_octave;
        self.mono = settings.arp_mono;
        self.steps_per_note = settings.encoder_steps_per_note.max(1);
    }

    pub fn arp_type(&self) -> ArpType {
        self.arp_type
    }

    pub fn set_arp_type(&mut self, arp_type: ArpType) {
        self.arp_type = arp_type;
    }

    pub fn pool(&self) -> &[NoteEvent] {
        &self.pool
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn play_index(&self) -> Option<usize> {
        self.play_index
    }

    pub fn previous_play_index(&self) -> Option<usize> {
        self.previous_play_index
    }

    pub fn previous_note(&self) -> Option<u8> {
        self.previous.map(|e| e.note)
    }

    pub fn add_note(&mut self, event: NoteEvent) {
        match self.pool.binary_search_by_key(&event.note, |e| e.note) {
            Ok(_) => {}
            Err(pos) => self.pool.insert(pos, event),
        }
    }

    pub fn remove_note(&mut self, note: u8) {
        match self.pool.binary_search_by_key(&note, |e| e.note) {
            Ok(pos) => {
                self.pool.remove(pos);
            }
            Err(_) => log::debug!(target: "arp", "remove_note({}) ignored: not in pool", note),
        }
    }

    pub fn clear_pool(&mut self) {
        self.pool.clear();
    }

    /// Reset traversal when the pool changed since the last advance. The
    /// throttle is re-armed so the next advance fires right away.
    fn sync_pool(&mut self) {
        if self.pool.iter().map(|e| e.note).eq(self.seen_pool.iter().copied()) {
            return;
        }
        self.seen_pool.clear();
        self.seen_pool.extend(self.pool.iter().map(|e| e.note));
        self.play_index = None;
        self.previous_play_index = None;
        self.step_counter = self.steps_per_note.saturating_sub(1);
    }

    /// True when this encoder step should be swallowed.
    pub fn skip_this_turn(&mut self) -> bool {
        self.sync_pool();
        if self.steps_per_note <= 1 {
            return false;
        }
        self.step_counter += 1;
        if self.step_counter >= self.steps_per_note {
            self.step_counter = 0;
            false
        } else {
            true
        }
    }

    /// Emit the next note and schedule its release.
    ///
    /// Returns `None` without touching any state when the pool is empty.
    pub fn next_note(&mut self, now: Seconds, clock: &TempoClock) -> Option<NoteEvent> {
        self.sync_pool();
        let len = self.pool.len();
        if len == 0 {
            return None;
        }

        let index = match self.arp_type {
            ArpType::Up | ArpType::RandOctUp => self.advance_up(len).0,
            ArpType::Down | ArpType::RandOctDown => self.advance_down(len).0,
            ArpType::Random => self.random_index(len),
            ArpType::RandStartUp => match self.advance_up(len) {
                (_, true) => self.random_index(len),
                (i, false) => i,
            },
            ArpType::RandStartDown => match self.advance_down(len) {
                (_, true) => self.random_index(len),
                (i, false) => i,
            },
        };
        self.previous_play_index = self.play_index;
        self.play_index = Some(index);

        let source = self.pool[index];
        let shift = self.octave as i16 * 12;
        let mut event = source.transposed(shift).unwrap_or(NoteEvent {
            note: (source.note as i16 + shift).clamp(0, 127) as u8,
            ..source
        });
        let octave_jump = match self.arp_type {
            ArpType::RandOctUp => 12,
            ArpType::RandOctDown => -12,
            _ => 0,
        };
        if octave_jump != 0 && self.next_random() & 1 == 1 {
            if let Some(jumped) = event.transposed(octave_jump) {
                event = jumped;
            }
        }
        let note = event.note;

        if self.mono {
            if let Some(prev) = self.previous {
                self.scheduled_offs.retain(|(e, _)| e.note != prev.note);
                self.mono_release = Some(prev);
            }
        }
        // a retriggered note must not be cut by the earlier instance's release
        self.scheduled_offs.retain(|(e, _)| e.note != note);
        let off_at = now + clock.note_duration(self.arp_length);
        self.scheduled_offs.push((event, off_at));
        self.previous = Some(event);

        log::trace!(target: "arp", "{} step {} -> note {}", self.arp_type.name(), index, note);
        Some(event)
    }

    /// Index after an ascending step, and whether it wrapped to the start.
    fn advance_up(&self, len: usize) -> (usize, bool) {
        match self.play_index {
            None => (0, false),
            Some(i) if i + 1 >= len => (0, true),
            Some(i) => (i + 1, false),
        }
    }

    fn advance_down(&self, len: usize) -> (usize, bool) {
        match self.play_index {
            None => (len - 1, false),
            Some(0) => (len - 1, true),
            Some(i) => (i.min(len) - 1, false),
        }
    }

    fn next_random(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.rng_state >> 33
    }

    fn random_index(&mut self, len: usize) -> usize {
        (self.next_random() as usize) % len
    }

    /// Note to silence before the next note sounds in monophonic mode,
    /// carrying the pad it was played from.
    pub fn take_mono_release(&mut self) -> Option<NoteEvent> {
        self.mono_release.take()
    }

    /// Pop every note whose release time has passed.
    pub fn due_off_notes(&mut self, now: Seconds) -> Vec<NoteEvent> {
        let mut due = Vec::new();
        self.scheduled_offs.retain(|(event, at)| {
            if *at <= now {
                due.push(*event);
                false
            } else {
                true
            }
        });
        due
    }

    /// Every note still waiting for release, returned immediately.
    pub fn release_all(&mut self) -> Vec<u8> {
        let mut notes: Vec<u8> = self.scheduled_offs.drain(..).map(|(e, _)| e.note).collect();
        if let Some(released) = self.mono_release.take() {
            notes.push(released.note);
        }
        notes.sort_unstable();
        notes.dedup();
        self.previous = None;
        notes
    }
}

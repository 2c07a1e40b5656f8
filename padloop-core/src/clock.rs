//! Tempo tracking from an external MIDI clock.
//!
//! Incoming Timing Clock ticks are grouped into quarter notes (24 ticks each).
//! Every quarter note yields a BPM sample; the tempo only moves once a sample is
//! corroborated by the recent history, so a single late or early tick never
//! changes the durations the loopers and the arpeggiator rely on.

use std::collections::VecDeque;

use padloop_types::{NoteLength, Seconds};

/// MIDI convention.
pub const TICKS_PER_QUARTER: u32 = 24;

/// A tick whose spacing differs from the previous one by more than this is a
/// discontinuity (restart, dropped bytes) rather than tempo drift.
const JITTER_TOLERANCE: Seconds = 0.020;

const HISTORY_LEN: usize = 4;
const MIN_AGREEING_SAMPLES: usize = 3;
const MAX_DEVIATION_BPM: f64 = 3.0;

const MIN_BPM: u32 = 20;
const MAX_BPM: u32 = 300;

#[derive(Debug, Clone)]
pub struct TempoClock {
    current_bpm: u32,
    previous_bpm: u32,
    history: VecDeque<u32>,
    /// Seconds per note length, indexed by `NoteLength::index()`.
    durations: [Seconds; NoteLength::ALL.len()],
    tick_count: u32,
    last_tick: Option<Seconds>,
    last_tick_duration: Seconds,
    quarter_reference: Seconds,
    play_state: bool,
}

impl TempoClock {
    pub fn new(bpm: u32) -> Self {
        let bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        Self {
            current_bpm: bpm,
            previous_bpm: bpm,
            history: VecDeque::with_capacity(HISTORY_LEN + 1),
            durations: durations_for(bpm),
            tick_count: 0,
            last_tick: None,
            last_tick_duration: 0.0,
            quarter_reference: 0.0,
            play_state: false,
        }
    }

    /// Feed one Timing Clock tick received at `now`.
    ///
    /// Returns `true` when the tick completed a quarter note whose BPM sample
    /// was accepted and changed the current tempo.
    pub fn on_tick(&mut self, now: Seconds) -> bool {
        let Some(last_tick) = self.last_tick.replace(now) else {
            // First tick only primes the references
            self.tick_count = 0;
            self.quarter_reference = now;
            return false;
        };

        let tick_duration = now - last_tick;
        if (tick_duration - self.last_tick_duration).abs() > JITTER_TOLERANCE {
            log::debug!(
                target: "clock",
                "tick discontinuity: {:.4}s after {:.4}s, restarting quarter",
                tick_duration,
                self.last_tick_duration
            );
            self.tick_count = 0;
            self.quarter_reference = now;
            self.last_tick_duration = tick_duration;
            return false;
        }
        self.last_tick_duration = tick_duration;

        self.tick_count += 1;
        if self.tick_count < TICKS_PER_QUARTER {
            return false;
        }
        self.tick_count = 0;

        let quarter_note_time = now - self.quarter_reference;
        self.quarter_reference = now;
        if quarter_note_time <= 0.0 {
            return false;
        }
        let sampled_bpm = (60.0 / quarter_note_time).round().min(u32::MAX as f64) as u32;
        self.accept_sample(sampled_bpm)
    }

    fn accept_sample(&mut self, sampled_bpm: u32) -> bool {
        self.history.push_back(sampled_bpm);
        while self.history.len() > HISTORY_LEN {
            self.history.pop_front();
        }
        if self.history.len() < HISTORY_LEN {
            return false;
        }

        let agreeing = self.history.iter().filter(|&&b| b == sampled_bpm).count();
        let mean = self.history.iter().map(|&b| b as f64).sum::<f64>() / HISTORY_LEN as f64;
        let max_deviation = self
            .history
            .iter()
            .map(|&b| (b as f64 - mean).abs())
            .fold(0.0, f64::max);

        if agreeing < MIN_AGREEING_SAMPLES || max_deviation > MAX_DEVIATION_BPM {
            return false;
        }

        let bpm = (mean.round() as u32).clamp(MIN_BPM, MAX_BPM);
        if bpm == self.current_bpm {
            return false;
        }
        log::info!(target: "clock", "tempo {} -> {} bpm", self.current_bpm, bpm);
        self.apply_bpm(bpm);
        true
    }

    fn apply_bpm(&mut self, bpm: u32) {
        self.previous_bpm = self.current_bpm;
        self.current_bpm = bpm;
        self.durations = durations_for(bpm);
    }

    /// Set the tempo directly, for running without an external clock.
    pub fn set_bpm(&mut self, bpm: u32) {
        let bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        if bpm != self.current_bpm {
            self.apply_bpm(bpm);
        }
    }

    pub fn bpm(&self) -> u32 {
        self.current_bpm
    }

    pub fn previous_bpm(&self) -> u32 {
        self.previous_bpm
    }

    /// Ticks counted since the last quarter-note boundary (0..23).
    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub fn note_duration(&self, length: NoteLength) -> Seconds {
        self.durations[length.index()]
    }

    /// Duration for a textual token such as `"1/16"`; unknown tokens mean a
    /// quarter note.
    pub fn duration_for_token(&self, token: &str) -> Seconds {
        let length = NoteLength::from_token(token).unwrap_or(NoteLength::Quarter);
        self.note_duration(length)
    }

    pub fn quarter_duration(&self) -> Seconds {
        self.note_duration(NoteLength::Quarter)
    }

    pub fn set_play_state(&mut self, playing: bool) {
        if playing != self.play_state {
            log::debug!(target: "clock", "transport {}", if playing { "running" } else { "stopped" });
        }
        self.play_state = playing;
    }

    pub fn play_state(&self) -> bool {
        self.play_state
    }
}

impl Default for TempoClock {
    fn default() -> Self {
        Self::new(120)
    }
}

fn durations_for(bpm: u32) -> [Seconds; NoteLength::ALL.len()] {
    let quarter = 60.0 / bpm as f64;
    NoteLength::ALL.map(|len| quarter * len.beats())
}

//! # padloop-core
//!
//! Timing engine for a pad and encoder MIDI controller: tempo tracking from an
//! external clock, the main loop recorder, the arpeggiator and sixteen chord
//! slots. Independent of MIDI ports, displays and the wall clock; every call
//! takes the current monotonic time in seconds.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use padloop_core::config::Config;
//! use padloop_core::device::{DeviceContext, InputEvent};
//! use padloop_core::midi::parse_midi_message;
//! use padloop_core::output::NullOutput;
//!
//! // 1. Build the device from configured defaults
//! let mut device = DeviceContext::new(Config::load().settings());
//! let mut out = NullOutput;
//!
//! // 2. Feed input events and inbound MIDI as they arrive
//! device.handle_input(InputEvent::ToggleLoopRecord, now, &mut out);
//! if let Some(msg) = parse_midi_message(&bytes) {
//!     device.handle_midi(msg, now, &mut out);
//! }
//!
//! // 3. Poll every loop iteration to play whatever fell due
//! device.poll(now, &mut out);
//! ```
//!
//! ## Modules
//!
//! - [`clock`]: tempo from MIDI Timing Clock, note-length durations
//! - [`looper`]: record, trim, quantize and replay one loop
//! - [`arpeggiator`]: note pool traversal with scheduled releases
//! - [`chord`]: chord slots with transport-synchronized starts
//! - [`device`]: the context that owns all of the above
//! - [`output`]: the outward seam (notes, notices, pad LEDs)
//! - [`config`] / [`settings_store`]: startup defaults and saved settings

pub mod arpeggiator;
pub mod chord;
pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod looper;
pub mod midi;
pub mod output;
pub mod settings_store;

pub use error::{EngineError, EngineResult};

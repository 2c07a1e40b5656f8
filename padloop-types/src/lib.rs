//! # padloop-types
//!
//! Plain data shared by the padloop engine and its host: recorded note events,
//! loop and arpeggiator enums, pad colors and the persisted [`Settings`].
//! Nothing in this crate knows about time sources or MIDI ports.

mod note;
pub mod state;

pub use note::{NoteEvent, PadIndex, Seconds, PAD_COUNT};

// Re-export all state types at crate root for convenience
pub use state::*;

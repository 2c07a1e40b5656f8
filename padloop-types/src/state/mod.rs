mod arpeggiator;
mod looping;
mod pad;
mod settings;
mod timing;

pub use arpeggiator::ArpType;
pub use looping::{LoopKind, TrimMode};
pub use pad::PadColor;
pub use settings::Settings;
pub use timing::NoteLength;

/// Abstract pad colors requested from the LED renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadColor {
    #[default]
    Off,
    /// Pad is physically held or its note is sounding.
    Held,
    Recording,
    Playing,
    /// Chord slot holds content but is not playing.
    Loaded,
    /// Chord slot waits for the next transport start.
    Pending,
}

use serde::{Deserialize, Serialize};

/// What a recorded track does when it reaches its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    /// The main performance loop.
    Loop,
    /// One-shot chord; stops at the end and can be retriggered.
    Chord,
    /// Chord that repeats like a loop.
    ChordLoop,
}

impl LoopKind {
    pub fn name(&self) -> &'static str {
        match self {
            LoopKind::Loop => "Loop",
            LoopKind::Chord => "Chord",
            LoopKind::ChordLoop => "Chord Loop",
        }
    }

    /// Whether playback wraps around instead of stopping.
    pub fn repeats(&self) -> bool {
        matches!(self, LoopKind::Loop | LoopKind::ChordLoop)
    }

    pub fn from_token(s: &str) -> Option<LoopKind> {
        match s.trim().to_lowercase().as_str() {
            "loop" => Some(LoopKind::Loop),
            "chord" => Some(LoopKind::Chord),
            "chord_loop" | "chordloop" | "chord-loop" => Some(LoopKind::ChordLoop),
            _ => None,
        }
    }
}

/// Which ends of a recording get their leading/trailing silence removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimMode {
    None,
    Start,
    End,
    #[default]
    Both,
}

impl TrimMode {
    pub fn trims_start(self) -> bool {
        matches!(self, TrimMode::Start | TrimMode::Both)
    }

    pub fn trims_end(self) -> bool {
        matches!(self, TrimMode::End | TrimMode::Both)
    }

    pub fn from_token(s: &str) -> Option<TrimMode> {
        match s.trim().to_lowercase().as_str() {
            "none" => Some(TrimMode::None),
            "start" => Some(TrimMode::Start),
            "end" => Some(TrimMode::End),
            "both" => Some(TrimMode::Both),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_chord_is_one_shot() {
        assert!(LoopKind::Loop.repeats());
        assert!(LoopKind::ChordLoop.repeats());
        assert!(!LoopKind::Chord.repeats());
    }

    #[test]
    fn trim_mode_flags() {
        assert!(TrimMode::Both.trims_start() && TrimMode::Both.trims_end());
        assert!(TrimMode::Start.trims_start() && !TrimMode::Start.trims_end());
        assert!(!TrimMode::None.trims_start() && !TrimMode::None.trims_end());
    }

    #[test]
    fn parse_tokens() {
        assert_eq!(LoopKind::from_token("chord_loop"), Some(LoopKind::ChordLoop));
        assert_eq!(LoopKind::from_token("Chord"), Some(LoopKind::Chord));
        assert_eq!(TrimMode::from_token("END"), Some(TrimMode::End));
        assert_eq!(TrimMode::from_token("middle"), None);
    }
}

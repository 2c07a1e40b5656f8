use serde::{Deserialize, Serialize};

/// Musical note lengths the clock can convert into seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoteLength {
    #[serde(rename = "whole")]
    Whole,
    #[serde(rename = "1/2")]
    Half,
    #[default]
    #[serde(rename = "1/4")]
    Quarter,
    #[serde(rename = "1/8")]
    Eighth,
    #[serde(rename = "1/16")]
    Sixteenth,
    #[serde(rename = "1/32")]
    ThirtySecond,
    #[serde(rename = "1/64")]
    SixtyFourth,
}

impl NoteLength {
    pub const ALL: [NoteLength; 7] = [
        NoteLength::Whole,
        NoteLength::Half,
        NoteLength::Quarter,
        NoteLength::Eighth,
        NoteLength::Sixteenth,
        NoteLength::ThirtySecond,
        NoteLength::SixtyFourth,
    ];

    /// Length expressed in quarter notes (beats).
    pub fn beats(self) -> f64 {
        match self {
            NoteLength::Whole => 4.0,
            NoteLength::Half => 2.0,
            NoteLength::Quarter => 1.0,
            NoteLength::Eighth => 0.5,
            NoteLength::Sixteenth => 0.25,
            NoteLength::ThirtySecond => 0.125,
            NoteLength::SixtyFourth => 0.0625,
        }
    }

    /// Position in [`NoteLength::ALL`], used to index per-length tables.
    pub fn index(self) -> usize {
        match self {
            NoteLength::Whole => 0,
            NoteLength::Half => 1,
            NoteLength::Quarter => 2,
            NoteLength::Eighth => 3,
            NoteLength::Sixteenth => 4,
            NoteLength::ThirtySecond => 5,
            NoteLength::SixtyFourth => 6,
        }
    }

    pub fn from_token(s: &str) -> Option<NoteLength> {
        match s.trim() {
            "whole" | "1/1" | "1" => Some(NoteLength::Whole),
            "1/2" => Some(NoteLength::Half),
            "1/4" => Some(NoteLength::Quarter),
            "1/8" => Some(NoteLength::Eighth),
            "1/16" => Some(NoteLength::Sixteenth),
            "1/32" => Some(NoteLength::ThirtySecond),
            "1/64" => Some(NoteLength::SixtyFourth),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grid_tokens() {
        assert_eq!(NoteLength::from_token("1/16"), Some(NoteLength::Sixteenth));
        assert_eq!(NoteLength::from_token(" 1/4 "), Some(NoteLength::Quarter));
        assert_eq!(NoteLength::from_token("1"), Some(NoteLength::Whole));
        assert_eq!(NoteLength::from_token("1/3"), None);
    }

    #[test]
    fn index_matches_all_table() {
        for (i, len) in NoteLength::ALL.iter().enumerate() {
            assert_eq!(len.index(), i);
        }
    }
}

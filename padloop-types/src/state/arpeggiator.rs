use serde::{Deserialize, Serialize};

/// How the arpeggiator walks its note pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArpType {
    #[default]
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "random")]
    Random,
    /// Walk up, randomly jumping an octave higher.
    #[serde(rename = "rand-oct-up")]
    RandOctUp,
    /// Walk down, randomly dropping an octave lower.
    #[serde(rename = "rand-oct-dn")]
    RandOctDown,
    /// Walk up, restarting from a random note at each wrap.
    #[serde(rename = "randstartup")]
    RandStartUp,
    /// Walk down, restarting from a random note at each wrap.
    #[serde(rename = "randstartdown")]
    RandStartDown,
}

impl ArpType {
    pub const ALL: [ArpType; 7] = [
        ArpType::Up,
        ArpType::Down,
        ArpType::Random,
        ArpType::RandOctUp,
        ArpType::RandOctDown,
        ArpType::RandStartUp,
        ArpType::RandStartDown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArpType::Up => "up",
            ArpType::Down => "down",
            ArpType::Random => "random",
            ArpType::RandOctUp => "rand-oct-up",
            ArpType::RandOctDown => "rand-oct-dn",
            ArpType::RandStartUp => "randstartup",
            ArpType::RandStartDown => "randstartdown",
        }
    }

    pub fn from_token(s: &str) -> Option<ArpType> {
        let s = s.trim().to_lowercase();
        ArpType::ALL.into_iter().find(|t| t.name() == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!(ArpType::from_token("rand-oct-up"), Some(ArpType::RandOctUp));
        assert_eq!(ArpType::from_token("RANDSTARTDOWN"), Some(ArpType::RandStartDown));
        assert_eq!(ArpType::from_token("updown"), None);
    }
}

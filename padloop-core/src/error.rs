use std::fmt;

/// Errors the engine reports to its caller.
///
/// Invalid state transitions are not errors: they are ignored and logged at
/// debug level, see [`crate::looper::RecordOutcome`].
#[derive(Debug)]
pub enum EngineError {
    /// The note ceiling was hit; recording has been stopped.
    Capacity { limit: usize },
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Serialize(e)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capacity { limit } => write!(f, "max notes ({}) reached", limit),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Parse(e) => write!(f, "settings parse error: {}", e),
            Self::Serialize(e) => write!(f, "settings write error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Capacity { .. } => None,
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Serialize(e) => Some(e),
        }
    }
}

pub type EngineResult<T = ()> = Result<T, EngineError>;

//! Settings saved at shutdown and restored at startup (`settings.toml` in the
//! padloop config directory).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use padloop_types::Settings;

use crate::config;
use crate::error::EngineResult;

/// Default location of the saved settings.
pub fn settings_path() -> Option<PathBuf> {
    config::config_dir().map(|d| d.join("settings.toml"))
}

pub fn save_settings(path: &Path, settings: &Settings) -> EngineResult {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(settings)?;
    fs::write(path, text)?;
    log::debug!(target: "settings", "saved settings to {}", path.display());
    Ok(())
}

pub fn load_settings(path: &Path) -> EngineResult<Settings> {
    let text = fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&text)?;
    Ok(settings.sanitized())
}

/// Saved settings if there are any, else `fallback`. Unreadable files are
/// logged and skipped.
pub fn load_settings_or(path: &Path, fallback: Settings) -> Settings {
    match load_settings(path) {
        Ok(settings) => settings,
        Err(crate::error::EngineError::Io(e)) if e.kind() == io::ErrorKind::NotFound => fallback,
        Err(e) => {
            log::warn!(target: "settings", "ignoring saved settings {}: {}", path.display(), e);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use padloop_types::{ArpType, LoopKind, NoteLength, TrimMode};

    #[test]
    fn save_then_load_keeps_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let settings = Settings {
            bpm: 97,
            external_sync: true,
            trim_mode: TrimMode::Start,
            quantize_grid: NoteLength::ThirtySecond,
            quantize_strength: 60,
            arp_type: ArpType::RandStartDown,
            arp_octave: -1,
            chord_kind: LoopKind::Chord,
            ..Settings::default()
        };
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "bpm = \"fast\"").unwrap();
        assert!(matches!(load_settings(&path).unwrap_err(), EngineError::Parse(_)));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "bpm = 140\narp_type = \"down\"\n").unwrap();
        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.bpm, 140);
        assert_eq!(settings.arp_type, ArpType::Down);
        assert_eq!(settings.base_note, Settings::default().base_note);
    }

    #[test]
    fn load_or_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = Settings {
            bpm: 111,
            ..Settings::default()
        };
        let absent = dir.path().join("absent.toml");
        assert_eq!(load_settings_or(&absent, fallback.clone()), fallback);

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[[[").unwrap();
        assert_eq!(load_settings_or(&broken, fallback.clone()), fallback);
    }
}

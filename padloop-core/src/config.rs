use std::path::{Path, PathBuf};

use serde::Deserialize;

use padloop_types::{ArpType, LoopKind, NoteLength, Settings, TrimMode};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    quantize: QuantizeConfig,
    #[serde(default)]
    arp: ArpConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    bpm: Option<u16>,
    base_note: Option<u8>,
    default_velocity: Option<u8>,
    external_sync: Option<bool>,
    chord_kind: Option<String>,
}

#[derive(Deserialize, Default)]
struct QuantizeConfig {
    trim: Option<String>,
    grid: Option<String>,
    strength: Option<u8>,
    #[serde(rename = "loop")]
    quantize_loop: Option<bool>,
}

#[derive(Deserialize, Default)]
struct ArpConfig {
    #[serde(rename = "type")]
    arp_type: Option<String>,
    length: Option<String>,
    octave: Option<i8>,
    mono: Option<bool>,
    encoder_steps: Option<u8>,
}

/// Startup defaults: the embedded `config.toml` overlaid by the user's file.
pub struct Config {
    defaults: DefaultsConfig,
    quantize: QuantizeConfig,
    arp: ArpConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(user_config_path().as_deref())
    }

    /// Load with an explicit user file in place of the platform one.
    pub fn load_from(user_path: Option<&Path>) -> Self {
        let mut base: ConfigFile = match toml::from_str(DEFAULT_CONFIG) {
            Ok(base) => base,
            Err(e) => {
                log::warn!(target: "config", "embedded config.toml is malformed: {}", e);
                ConfigFile::default()
            }
        };

        if let Some(path) = user_path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_quantize(&mut base.quantize, user.quantize);
                            merge_arp(&mut base.arp, user.arp);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            quantize: base.quantize,
            arp: base.arp,
        }
    }

    pub fn settings(&self) -> Settings {
        let fallback = Settings::default();
        Settings {
            bpm: self.defaults.bpm.unwrap_or(fallback.bpm),
            base_note: self.defaults.base_note.unwrap_or(fallback.base_note),
            default_velocity: self
                .defaults
                .default_velocity
                .unwrap_or(fallback.default_velocity),
            external_sync: self.defaults.external_sync.unwrap_or(fallback.external_sync),
            chord_kind: self
                .defaults
                .chord_kind
                .as_deref()
                .and_then(LoopKind::from_token)
                .unwrap_or(fallback.chord_kind),
            trim_mode: self
                .quantize
                .trim
                .as_deref()
                .and_then(TrimMode::from_token)
                .unwrap_or(fallback.trim_mode),
            quantize_grid: self
                .quantize
                .grid
                .as_deref()
                .and_then(NoteLength::from_token)
                .unwrap_or(fallback.quantize_grid),
            quantize_strength: self.quantize.strength.unwrap_or(fallback.quantize_strength),
            quantize_loop: self.quantize.quantize_loop.unwrap_or(fallback.quantize_loop),
            arp_type: self
                .arp
                .arp_type
                .as_deref()
                .and_then(ArpType::from_token)
                .unwrap_or(fallback.arp_type),
            arp_length: self
                .arp
                .length
                .as_deref()
                .and_then(NoteLength::from_token)
                .unwrap_or(fallback.arp_length),
            arp_octave: self.arp.octave.unwrap_or(fallback.arp_octave),
            arp_mono: self.arp.mono.unwrap_or(fallback.arp_mono),
            encoder_steps_per_note: self
                .arp
                .encoder_steps
                .unwrap_or(fallback.encoder_steps_per_note),
        }
        .sanitized()
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("padloop"))
}

fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.base_note.is_some() {
        base.base_note = user.base_note;
    }
    if user.default_velocity.is_some() {
        base.default_velocity = user.default_velocity;
    }
    if user.external_sync.is_some() {
        base.external_sync = user.external_sync;
    }
    if user.chord_kind.is_some() {
        base.chord_kind = user.chord_kind;
    }
}

fn merge_quantize(base: &mut QuantizeConfig, user: QuantizeConfig) {
    if user.trim.is_some() {
        base.trim = user.trim;
    }
    if user.grid.is_some() {
        base.grid = user.grid;
    }
    if user.strength.is_some() {
        base.strength = user.strength;
    }
    if user.quantize_loop.is_some() {
        base.quantize_loop = user.quantize_loop;
    }
}

fn merge_arp(base: &mut ArpConfig, user: ArpConfig) {
    if user.arp_type.is_some() {
        base.arp_type = user.arp_type;
    }
    if user.length.is_some() {
        base.length = user.length;
    }
    if user.octave.is_some() {
        base.octave = user.octave;
    }
    if user.mono.is_some() {
        base.mono = user.mono;
    }
    if user.encoder_steps.is_some() {
        base.encoder_steps = user.encoder_steps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_embedded_config() {
        let settings = Config::load_from(None).settings();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_user_file_overrides_some_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[defaults]\nbpm = 90\nchord_kind = \"chord\"\n\n[arp]\ntype = \"rand-oct-dn\"\nlength = \"1/16\"\n",
        )
        .unwrap();

        let settings = Config::load_from(Some(&path)).settings();
        assert_eq!(settings.bpm, 90);
        assert_eq!(settings.chord_kind, LoopKind::Chord);
        assert_eq!(settings.arp_type, ArpType::RandOctDown);
        assert_eq!(settings.arp_length, NoteLength::Sixteenth);
        // untouched keys keep the embedded values
        assert_eq!(settings.trim_mode, TrimMode::Both);
        assert_eq!(settings.quantize_grid, NoteLength::Sixteenth);
    }

    #[test]
    fn test_unknown_tokens_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[quantize]\ntrim = \"sideways\"\ngrid = \"1/7\"\n[arp]\ntype = \"UP\"\n").unwrap();

        let settings = Config::load_from(Some(&path)).settings();
        assert_eq!(settings.trim_mode, TrimMode::Both);
        assert_eq!(settings.quantize_grid, NoteLength::Sixteenth);
        assert_eq!(settings.arp_type, ArpType::Up);
    }

    #[test]
    fn test_malformed_user_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[defaults\nbpm = ").unwrap();
        assert_eq!(Config::load_from(Some(&path)).settings(), Settings::default());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[defaults]\nbpm = 900\n[arp]\noctave = 9\nencoder_steps = 0\n").unwrap();

        let settings = Config::load_from(Some(&path)).settings();
        assert_eq!(settings.bpm, 300);
        assert_eq!(settings.arp_octave, 3);
        assert_eq!(settings.encoder_steps_per_note, 1);
    }
}

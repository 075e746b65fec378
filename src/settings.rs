//! Game settings and preferences
//!
//! The only persisted preference is the difficulty, stored by name.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Standard,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Standard => "Standard",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "standard" | "normal" => Some(Difficulty::Standard),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Lives at game start (more on easier settings)
    pub fn starting_lives(&self) -> u8 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Standard => 2,
            Difficulty::Hard => 1,
        }
    }

    /// Enemy count scaling, in percent of a level's base count
    pub fn enemy_percent(&self) -> u32 {
        match self {
            Difficulty::Easy => 75,
            Difficulty::Standard => 100,
            Difficulty::Hard => 150,
        }
    }

    /// Random-wandering saucers added to every level
    pub fn saucers(&self) -> u32 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Standard => 1,
            Difficulty::Hard => 2,
        }
    }

    /// Whether fuel tanks use the level's fixed lane instead of a random one
    pub fn fixed_fuel_lane(&self) -> bool {
        *self == Difficulty::Easy
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Settings {
    /// Default settings file name, relative to the working directory
    pub const DEFAULT_PATH: &'static str = "skyraid_settings.json";

    /// Load settings, falling back to defaults if the file is missing or bad
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings in {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_names() {
        for d in [Difficulty::Easy, Difficulty::Standard, Difficulty::Hard] {
            assert_eq!(Difficulty::from_str(d.as_str()), Some(d));
        }
        assert_eq!(Difficulty::from_str(" EASY "), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_easier_means_more_lives() {
        assert!(Difficulty::Easy.starting_lives() > Difficulty::Standard.starting_lives());
        assert!(Difficulty::Standard.starting_lives() > Difficulty::Hard.starting_lives());
        assert_eq!(Difficulty::Easy.starting_lives(), 3);
    }

    #[test]
    fn test_persisted_as_name_string() {
        let settings = Settings {
            difficulty: Difficulty::Hard,
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"difficulty":"Hard"}"#);
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);

        // Missing field falls back to the default difficulty
        let empty: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.difficulty, Difficulty::Standard);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("skyraid_settings_{}.json", std::process::id()));
        let settings = Settings {
            difficulty: Difficulty::Easy,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);

        fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        let _ = fs::remove_file(&path);

        assert_eq!(Settings::load_from(&path), Settings::default());
    }
}

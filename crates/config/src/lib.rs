//! Storybook configuration
//!
//! The config file is TOML with one table per `ConfigSection`:
//!
//! ```toml
//! version = 1
//!
//! [app]
//! log_level = "warn"
//!
//! [generation]
//! voice = "Kore"
//! page_count = 5
//!
//! [audio]
//! sample_rate = 24000
//! channels = 1
//! ```
//!
//! Missing tables and fields fall back to defaults. Files are written
//! atomically, so a crash mid-save never leaves a truncated config behind.
//!
//! ```rust,no_run
//! use storybook_config::ConfigManager;
//!
//! let manager = ConfigManager::new().expect("config directory");
//! let config = manager.load_or_default();
//! println!("Narrating with voice {}", config.generation.voice);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

pub mod app_config;
mod audio_config;
mod generation_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{apply_overrides, ConfigManager};
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use audio_config::AudioConfig;
pub use generation_config::GenerationConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    pub app: AppConfig,

    /// Generation service settings
    pub generation: GenerationConfig,

    /// Narration output settings
    pub audio: AudioConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every section, returning all problems found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.generation.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.audio.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.generation.merge(other.generation);
        self.audio.merge(other.audio);
    }

    /// Renders the config as it would be written to disk
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            generation: GenerationConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.version, CONFIG_VERSION);
    }

    #[test]
    fn test_errors_collected_across_sections() {
        let mut config = Config::default();
        config.generation.page_count = 0;
        config.audio.channels = 9;

        assert_eq!(config.validate().unwrap_err().len(), 2);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        let mut other = Config::default();
        other.generation.voice = "Puck".to_string();
        other.audio.sample_rate = 44_100;

        base.merge(other);
        assert_eq!(base.generation.voice, "Puck");
        assert_eq!(base.audio.sample_rate, 44_100);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[generation]\nvoice = \"Charon\"\n").unwrap();
        assert_eq!(config.generation.voice, "Charon");
        assert_eq!(config.generation.page_count, 5);
        assert_eq!(config.audio, AudioConfig::default());
    }

    #[test]
    fn test_to_toml_omits_unset_optionals() {
        let rendered = Config::default().to_toml().unwrap();
        assert!(rendered.contains("[generation]"));
        assert!(rendered.contains("sample_rate = 24000"));
        assert!(!rendered.contains("api_key"));
        assert!(!rendered.contains("output_device"));
    }
}

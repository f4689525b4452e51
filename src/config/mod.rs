//! Configuration management for ShuttleMidi
//!
//! Handles loading, parsing, and hot-reloading of the YAML configuration file.

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::dispatcher::DispatcherConfig;

pub use watcher::ConfigWatcher;

/// File name under the user's `.config` directory
pub const CONFIG_FILE_NAME: &str = "shuttle-midi.yaml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub media_keys: MediaKeysConfig,
    #[serde(default)]
    pub volume: VolumeConfig,
    #[serde(default)]
    pub wheel: WheelConfig,
}

/// MIDI port configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MidiConfig {
    /// Output port for control changes (substring match)
    pub control_device: String,
    /// Output port of the Mackie Control display (substring match)
    pub display_device: String,
    /// MIDI channel for control changes (0-15)
    pub channel: u8,
    pub repeat_interval_ms: u64,
    pub max_repeat: u32,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            control_device: "IAC monitorControl".to_string(),
            display_device: "X-Touch INT".to_string(),
            channel: 0,
            repeat_interval_ms: 300,
            max_repeat: 50,
        }
    }
}

impl MidiConfig {
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            channel: self.channel,
            repeat_interval: Duration::from_millis(self.repeat_interval_ms),
            max_repeat: self.max_repeat,
        }
    }
}

/// LCD output configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    /// Minimum gap between two row writes
    pub row_delay_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            row_delay_ms: 400,
        }
    }
}

impl DisplayConfig {
    pub fn row_delay(&self) -> Duration {
        Duration::from_millis(self.row_delay_ms)
    }
}

/// Transport buttons drive Music.app instead of sending control changes
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MediaKeysConfig {
    pub enabled: bool,
}

impl Default for MediaKeysConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct VolumeConfig {
    pub main: VolumeChannelConfig,
    pub headphone: VolumeChannelConfig,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            main: VolumeChannelConfig {
                initial: 40.0,
                step: 1.3,
                controller: 7,
            },
            headphone: VolumeChannelConfig {
                initial: 60.0,
                step: 1.4,
                controller: 102,
            },
        }
    }
}

/// One dial-controlled volume
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VolumeChannelConfig {
    /// Start value (0-127)
    pub initial: f32,
    /// Change per dial detent
    pub step: f32,
    pub controller: u8,
}

/// Jog wheel mapping
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WheelConfig {
    /// Outermost wheel position; anything beyond counts as rest
    pub max_position: i8,
    /// CC value per wheel detent
    pub step: u8,
    pub forward_controller: u8,
    pub reverse_controller: u8,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            max_position: 7,
            step: 18,
            forward_controller: 0,
            reverse_controller: 1,
        }
    }
}

/// What a reload changed among the settings applied at runtime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    pub control_device: bool,
    pub display_device: bool,
    pub display_enabled: Option<bool>,
    pub media_keys_enabled: Option<bool>,
}

impl ConfigChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file, writing the defaults there first if it does not exist
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            info!("No config at {}, writing defaults", path.display());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            Self::default().save(path).await?;
        }
        Self::load(path).await
    }

    /// Save configuration to file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// `$HOME/.config/shuttle-midi.yaml`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot determine home directory")?;
        Ok(home.join(".config").join(CONFIG_FILE_NAME))
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.midi.control_device.is_empty() {
            anyhow::bail!("midi.control_device cannot be empty");
        }
        if self.midi.display_device.is_empty() {
            anyhow::bail!("midi.display_device cannot be empty");
        }
        if self.midi.channel > 15 {
            anyhow::bail!(
                "midi.channel {} is invalid (must be 0-15)",
                self.midi.channel
            );
        }
        if self.midi.max_repeat == 0 {
            anyhow::bail!("midi.max_repeat must be at least 1");
        }
        if self.midi.repeat_interval_ms == 0 {
            anyhow::bail!("midi.repeat_interval_ms must be positive");
        }

        for (name, volume) in [("main", &self.volume.main), ("headphone", &self.volume.headphone)] {
            if !(0.0..=127.0).contains(&volume.initial) {
                anyhow::bail!(
                    "volume.{}.initial {} is invalid (must be 0-127)",
                    name,
                    volume.initial
                );
            }
            if volume.step.is_nan() || volume.step <= 0.0 {
                anyhow::bail!("volume.{}.step must be positive", name);
            }
            check_controller(&format!("volume.{}.controller", name), volume.controller)?;
        }

        let wheel = &self.wheel;
        if !(1..=7).contains(&wheel.max_position) {
            anyhow::bail!(
                "wheel.max_position {} is invalid (must be 1-7)",
                wheel.max_position
            );
        }
        if wheel.step == 0 {
            anyhow::bail!("wheel.step must be positive");
        }
        let largest = u16::from(wheel.step) * wheel.max_position as u16;
        if largest > 127 {
            anyhow::bail!(
                "wheel.step {} x max_position {} exceeds 127",
                wheel.step,
                wheel.max_position
            );
        }
        check_controller("wheel.forward_controller", wheel.forward_controller)?;
        check_controller("wheel.reverse_controller", wheel.reverse_controller)?;
        if wheel.forward_controller == wheel.reverse_controller {
            anyhow::bail!("wheel forward and reverse controllers must differ");
        }

        Ok(())
    }

    /// Settings that a reload from `self` to `new` changes at runtime
    pub fn changes(&self, new: &AppConfig) -> ConfigChanges {
        ConfigChanges {
            control_device: self.midi.control_device != new.midi.control_device,
            display_device: self.midi.display_device != new.midi.display_device,
            display_enabled: (self.display.enabled != new.display.enabled)
                .then_some(new.display.enabled),
            media_keys_enabled: (self.media_keys.enabled != new.media_keys.enabled)
                .then_some(new.media_keys.enabled),
        }
    }
}

fn check_controller(field: &str, controller: u8) -> Result<()> {
    if controller > 127 {
        anyhow::bail!("{} {} is invalid (must be 0-127)", field, controller);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.midi.control_device, "IAC monitorControl");
        assert_eq!(config.volume.headphone.controller, 102);
        assert_eq!(config.wheel.step, 18);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
midi:
  control_device: "Loopback"
display:
  enabled: false
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.midi.control_device, "Loopback");
        assert_eq!(config.midi.display_device, "X-Touch INT");
        assert_eq!(config.midi.max_repeat, 50);
        assert!(!config.display.enabled);
        assert_eq!(config.display.row_delay_ms, 400);
        assert_eq!(config.volume, VolumeConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.midi.channel = 16;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.midi.control_device.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.volume.main.initial = 130.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.volume.headphone.step = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.wheel.reverse_controller = config.wheel.forward_controller;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.wheel.step = 19;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.wheel.max_position = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.midi.max_repeat = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_changes() {
        let old = AppConfig::default();
        let mut new = old.clone();
        assert!(old.changes(&new).is_empty());

        new.midi.display_device = "MCU Pro".to_string();
        new.media_keys.enabled = false;
        new.midi.max_repeat = 10;

        let changes = old.changes(&new);
        assert!(!changes.control_device);
        assert!(changes.display_device);
        assert_eq!(changes.display_enabled, None);
        assert_eq!(changes.media_keys_enabled, Some(false));
    }

    #[tokio::test]
    async fn test_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.yaml");

        let mut config = AppConfig::default();
        config.midi.channel = 3;
        config.volume.main.initial = 64.0;
        config.save(&path).await?;

        let loaded = AppConfig::load(&path).await?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "wheel:\n  max_position: 9\n")?;

        let err = AppConfig::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("max_position"));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_or_create_writes_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = AppConfig::load_or_create(&path).await?;
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let reloaded = AppConfig::load_or_create(&path).await?;
        assert_eq!(reloaded, config);
        Ok(())
    }
}

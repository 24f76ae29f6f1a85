//! Configuration file management for voicenote.
//!
//! Configuration lives in `~/.config/voicenote/voicenote.toml`. A missing file
//! is created with defaults on first load.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which playback backend plays audio messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackBackendKind {
    /// mpv or ffplay if installed, rodio otherwise
    #[default]
    Auto,
    /// In-process playback through rodio
    Rodio,
    /// External mpv or ffplay process
    System,
}

impl std::fmt::Display for PlaybackBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Rodio => write!(f, "rodio"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Audio capture and attachment configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `voicenote list-devices`
    /// - device name from `voicenote list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested sample rate in Hz; the device's native rate is used if it differs
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Milliseconds between data-available fragments while recording (0 = only on pause/stop)
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Attachment format string: "codec [ffmpeg_options]" (e.g., "libopus -b:a 24k")
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// Directory attached takes are saved to (system temp dir if unset)
    #[serde(default)]
    pub attachment_dir: Option<PathBuf>,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_flush_interval_ms() -> u64 {
    1000
}

fn default_output_format() -> String {
    "wav".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            flush_interval_ms: default_flush_interval_ms(),
            output_format: default_output_format(),
            attachment_dir: None,
        }
    }
}

impl AudioConfig {
    /// Fragment interval for the capture device; `None` when flushing on demand only.
    pub fn flush_interval(&self) -> Option<Duration> {
        (self.flush_interval_ms > 0).then(|| Duration::from_millis(self.flush_interval_ms))
    }

    pub fn attachment_dir(&self) -> PathBuf {
        self.attachment_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("voicenote"))
    }
}

/// Message playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub backend: PlaybackBackendKind,
    /// Shared playback rate at startup
    #[serde(default = "default_rate")]
    pub default_rate: f32,
}

fn default_rate() -> f32 {
    1.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            backend: PlaybackBackendKind::default(),
            default_rate: default_rate(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VoicenoteConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl VoicenoteConfig {
    /// Loads configuration from the user's config directory, writing defaults
    /// if the file does not exist yet.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read or written
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        Self::load_or_init(&config_path()?)
    }

    /// Loads configuration from `path`, writing defaults there if it is missing.
    ///
    /// # Errors
    /// - If the file cannot be read or written
    /// - If the TOML is malformed
    pub fn load_or_init(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Default configuration written to {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: VoicenoteConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::debug!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Path of the config file.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(home.join(".config").join("voicenote").join("voicenote.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_initialized_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("voicenote.toml");

        let config = VoicenoteConfig::load_or_init(&path).unwrap();
        assert_eq!(config, VoicenoteConfig::default());
        assert!(path.exists());

        let reloaded = VoicenoteConfig::load_or_init(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicenote.toml");
        fs::write(
            &path,
            "[audio]\ndevice = \"2\"\nflush_interval_ms = 0\n\n[playback]\nbackend = \"system\"\n",
        )
        .unwrap();

        let config = VoicenoteConfig::load_or_init(&path).unwrap();
        assert_eq!(config.audio.device, "2");
        assert_eq!(config.audio.flush_interval(), None);
        assert_eq!(config.audio.output_format, "wav");
        assert_eq!(config.playback.backend, PlaybackBackendKind::System);
        assert_eq!(config.playback.default_rate, 1.0);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicenote.toml");
        fs::write(&path, "[playback]\nbackend = \"cassette\"\n").unwrap();
        assert!(VoicenoteConfig::load_or_init(&path).is_err());
    }

    #[test]
    fn test_flush_interval_and_attachment_dir() {
        let audio = AudioConfig::default();
        assert_eq!(audio.flush_interval(), Some(Duration::from_secs(1)));
        assert!(audio.attachment_dir().ends_with("voicenote"));

        let custom = AudioConfig {
            attachment_dir: Some(PathBuf::from("/srv/notes")),
            ..AudioConfig::default()
        };
        assert_eq!(custom.attachment_dir(), PathBuf::from("/srv/notes"));
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(PlaybackBackendKind::Auto.to_string(), "auto");
        assert_eq!(PlaybackBackendKind::Rodio.to_string(), "rodio");
    }
}

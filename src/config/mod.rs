//! Configuration management for voicenote.
//!
//! Settings are loaded from a TOML file in the user's config directory.

pub mod file;

pub use file::{config_path, AudioConfig, PlaybackBackendKind, PlaybackConfig, VoicenoteConfig};

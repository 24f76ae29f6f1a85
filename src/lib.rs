//! Terminal voice-message recorder and player.
//!
//! The recorder captures a take in fragments through a [`recording::CaptureSource`],
//! the [`recording::AudioHandler`] keeps it and the list of playable messages, and
//! the [`panel::AudioControlPanel`] maps control clicks onto the handler.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod locate;
pub mod logging;
pub mod panel;
pub mod playback;
pub mod recording;
pub mod ui;

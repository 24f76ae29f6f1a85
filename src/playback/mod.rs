//! Audio message playback.
//!
//! Two interchangeable backends sit behind [`AudioPlayer`]: rodio playing in
//! process, and an external player process (mpv or ffplay). The backend is
//! chosen once at startup by [`select_player`].

pub mod message;
pub mod player;
pub mod sink;
pub mod system;

pub use message::AudioMessage;
pub use player::{AudioPlayer, PlaybackBackend, PlaybackHandle, PlayerCache, SharedPlayer};
pub use sink::RodioBackend;
pub use system::{PlayerKind, SystemBackend};

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::config::PlaybackBackendKind;
use crate::error::PlaybackError;

/// Rejects rates that are not strictly positive and finite.
pub fn validate_rate(rate: f32) -> Result<(), PlaybackError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(PlaybackError::InvalidRate(rate))
    }
}

/// Resolves a source string to a filesystem path, accepting `file://` URLs.
pub fn local_path(src: &str) -> PathBuf {
    PathBuf::from(src.strip_prefix("file://").unwrap_or(src))
}

/// Backends `Auto` tries, in order. The system players decode the WebM and
/// Ogg takes a browser or cpal session produces; rodio's decoders do not read
/// Matroska containers.
const AUTO_ORDER: [PlaybackBackendKind; 2] = [PlaybackBackendKind::System, PlaybackBackendKind::Rodio];

/// Builds the shared player for the configured backend.
///
/// `Auto` prefers a system player and falls back to rodio.
///
/// # Errors
/// - If the requested backend (or, for `Auto`, every backend) is unavailable
pub fn select_player(kind: PlaybackBackendKind) -> Result<SharedPlayer, PlaybackError> {
    let player = open_player(kind)?;
    tracing::info!("Playback backend: {}", player.borrow().backend_name());
    Ok(player)
}

fn open_player(kind: PlaybackBackendKind) -> Result<SharedPlayer, PlaybackError> {
    let player: SharedPlayer = match kind {
        PlaybackBackendKind::Rodio => Rc::new(RefCell::new(PlayerCache::new(RodioBackend::new()?))),
        PlaybackBackendKind::System => {
            Rc::new(RefCell::new(PlayerCache::new(SystemBackend::detect()?)))
        }
        PlaybackBackendKind::Auto => first_available(&AUTO_ORDER, open_player)?,
    };
    Ok(player)
}

/// Opens the first backend in `order` that succeeds, or returns the last error.
fn first_available<T>(
    order: &[PlaybackBackendKind],
    mut open: impl FnMut(PlaybackBackendKind) -> Result<T, PlaybackError>,
) -> Result<T, PlaybackError> {
    let mut last_error = PlaybackError::Unavailable("no playback backend to try".to_string());
    for &kind in order {
        match open(kind) {
            Ok(player) => return Ok(player),
            Err(e) => {
                tracing::warn!("{} playback unavailable: {}", kind, e);
                last_error = e;
            }
        }
    }
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate(1.0).is_ok());
        assert!(validate_rate(0.5).is_ok());
        assert_eq!(validate_rate(-1.0), Err(PlaybackError::InvalidRate(-1.0)));
        assert!(validate_rate(0.0).is_err());
        assert!(validate_rate(f32::NAN).is_err());
        assert!(validate_rate(f32::INFINITY).is_err());
    }

    #[test]
    fn test_local_path_strips_file_scheme() {
        assert_eq!(local_path("file:///tmp/a.wav"), PathBuf::from("/tmp/a.wav"));
        assert_eq!(local_path("msgs/b.webm"), PathBuf::from("msgs/b.webm"));
    }

    fn opener(
        available: &'static [PlaybackBackendKind],
    ) -> impl FnMut(PlaybackBackendKind) -> Result<PlaybackBackendKind, PlaybackError> {
        move |kind| {
            if available.contains(&kind) {
                Ok(kind)
            } else {
                Err(PlaybackError::Unavailable(format!("{kind} missing")))
            }
        }
    }

    #[test]
    fn test_auto_prefers_system_player() {
        let both = opener(&[PlaybackBackendKind::Rodio, PlaybackBackendKind::System]);
        assert_eq!(
            first_available(&AUTO_ORDER, both),
            Ok(PlaybackBackendKind::System)
        );
    }

    #[test]
    fn test_auto_falls_back_to_rodio() {
        assert_eq!(
            first_available(&AUTO_ORDER, opener(&[PlaybackBackendKind::Rodio])),
            Ok(PlaybackBackendKind::Rodio)
        );
        assert_eq!(
            first_available(&AUTO_ORDER, opener(&[])),
            Err(PlaybackError::Unavailable("rodio missing".to_string()))
        );
    }
}

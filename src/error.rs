//! Error types for the recorder, the players and the control panel.

use thiserror::Error;

/// Errors raised by capture devices and the recording handler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecorderError {
    /// The handler has no live device session to operate on
    #[error("No capture device session available")]
    NoDeviceSession,

    /// A stopped device handle was asked to start again
    #[error("Capture device session has already been stopped")]
    SessionStopped,

    /// The platform capture device failed
    #[error("Capture device error: {0}")]
    Device(String),
}

/// Errors raised by playback backends.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Playback rates must be positive and finite
    #[error("Invalid playback rate: {0}")]
    InvalidRate(f32),

    /// No playback backend could be initialized
    #[error("No playback backend available: {0}")]
    Unavailable(String),

    /// The backend failed to open or control a source
    #[error("Playback error for '{src}': {message}")]
    Backend { src: String, message: String },
}

impl PlaybackError {
    pub fn backend(src: &str, message: impl ToString) -> Self {
        PlaybackError::Backend {
            src: src.to_string(),
            message: message.to_string(),
        }
    }
}

/// Errors raised by the control panel.
///
/// Missing controls and malformed element data are wiring defects and are
/// never recovered from at runtime.
#[derive(Error, Debug)]
pub enum PanelError {
    /// A required control is not present on the surface
    #[error("Required control '{0}' not found")]
    MissingControl(&'static str),

    /// A message element lacks a required data attribute
    #[error("Element for '{control}' is missing the \"{attribute}\" attribute")]
    MissingAttribute {
        control: &'static str,
        attribute: &'static str,
    },

    /// A `data-rate` attribute could not be parsed
    #[error("Invalid or missing \"data-rate\" attribute: '{0}'")]
    InvalidRateAttribute(String),

    /// No action is registered for the clicked control
    #[error("No action bound to control '{0}'")]
    Unbound(&'static str),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Materializing or writing an artifact failed
    #[error(transparent)]
    Artifact(#[from] anyhow::Error),
}

impl PanelError {
    /// Configuration errors indicate a wiring defect rather than a runtime condition.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PanelError::MissingControl(_)
                | PanelError::MissingAttribute { .. }
                | PanelError::InvalidRateAttribute(_)
                | PanelError::Unbound(_)
                | PanelError::Recorder(RecorderError::NoDeviceSession)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_classified() {
        assert!(PanelError::MissingControl(".beginRecording").is_configuration_error());
        assert!(PanelError::from(RecorderError::NoDeviceSession).is_configuration_error());
        assert!(!PanelError::from(PlaybackError::InvalidRate(-1.0)).is_configuration_error());
    }

    #[test]
    fn test_error_messages() {
        let err = PanelError::MissingAttribute {
            control: ".playAudio",
            attribute: "data-src",
        };
        assert_eq!(
            err.to_string(),
            "Element for '.playAudio' is missing the \"data-src\" attribute"
        );
        assert_eq!(
            PlaybackError::backend("a.webm", "boom").to_string(),
            "Playback error for 'a.webm': boom"
        );
    }
}

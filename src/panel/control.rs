//! Control identifiers and the surface the panel renders onto.

use std::fmt;

/// Every control the panel knows about, identified by its selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    BeginRecording,
    PauseRecording,
    StopRecording,
    DeleteRecording,
    PlayAudio,
    PauseAudio,
    StopAudio,
    AdjustAudioRate,
    PreviewContainer,
    RecordingPreview,
    MessageMedia,
}

impl Control {
    pub const ALL: [Control; 11] = [
        Control::BeginRecording,
        Control::PauseRecording,
        Control::StopRecording,
        Control::DeleteRecording,
        Control::PlayAudio,
        Control::PauseAudio,
        Control::StopAudio,
        Control::AdjustAudioRate,
        Control::PreviewContainer,
        Control::RecordingPreview,
        Control::MessageMedia,
    ];

    /// Controls shown only while a take is in progress.
    pub const RECORDING_CONTROLS: [Control; 3] = [
        Control::PauseRecording,
        Control::StopRecording,
        Control::DeleteRecording,
    ];

    /// Transport buttons sharing the exclusive highlight.
    pub const TRANSPORT: [Control; 2] = [Control::BeginRecording, Control::PauseRecording];

    pub fn selector(&self) -> &'static str {
        match self {
            Self::BeginRecording => ".beginRecording",
            Self::PauseRecording => ".pauseRecording",
            Self::StopRecording => ".stopRecording",
            Self::DeleteRecording => ".deleteRecording",
            Self::PlayAudio => ".playAudio",
            Self::PauseAudio => ".pauseAudio",
            Self::StopAudio => ".stopAudio",
            Self::AdjustAudioRate => ".adjustAudioRate",
            Self::PreviewContainer => ".audioPreviewContainer",
            Self::RecordingPreview => ".audioRecordingPreview",
            Self::MessageMedia => "#messageMedia",
        }
    }

    pub fn from_selector(selector: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.selector() == selector)
    }

    /// Short label for rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BeginRecording => "Record",
            Self::PauseRecording => "Pause",
            Self::StopRecording => "Stop",
            Self::DeleteRecording => "Delete",
            Self::PlayAudio => "Play",
            Self::PauseAudio => "Pause",
            Self::StopAudio => "Stop",
            Self::AdjustAudioRate => "Rate",
            Self::PreviewContainer => "Preview",
            Self::RecordingPreview => "Preview",
            Self::MessageMedia => "Attachment",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Data attributes carried by a clicked element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementData {
    /// `data-src`
    pub src: Option<String>,
    /// `data-rate`
    pub rate: Option<String>,
}

impl ElementData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_src(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            rate: None,
        }
    }

    pub fn rate(mut self, rate: impl Into<String>) -> Self {
        self.rate = Some(rate.into());
        self
    }
}

/// Presentation target of the panel.
///
/// Implementations hold visibility and highlight per control plus the
/// preview element's source.
pub trait ControlSurface {
    fn has_control(&self, control: Control) -> bool;

    fn show(&mut self, control: Control);

    fn hide(&mut self, control: Control);

    fn highlight(&mut self, control: Control);

    fn remove_highlight(&mut self, control: Control);

    fn set_preview_source(&mut self, src: Option<&str>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_round_trip() {
        for control in Control::ALL {
            assert_eq!(Control::from_selector(control.selector()), Some(control));
        }
        assert_eq!(Control::from_selector(".nope"), None);
    }

    #[test]
    fn test_element_data_builder() {
        let el = ElementData::with_src("a.webm").rate("1.5");
        assert_eq!(el.src.as_deref(), Some("a.webm"));
        assert_eq!(el.rate.as_deref(), Some("1.5"));
    }
}

//! Binds controls to the recording handler and mirrors its state on the surface.

use super::bindings::{Action, Bindings};
use super::control::{Control, ControlSurface, ElementData};
use super::form::FormInput;
use super::object_url::ObjectUrls;
use crate::error::PanelError;
use crate::playback::validate_rate;
use crate::recording::{AudioBlob, AudioHandler, CaptureSource, DeviceState};

/// Controls the panel cannot work without.
const REQUIRED_CONTROLS: [Control; 5] = [
    Control::BeginRecording,
    Control::PauseRecording,
    Control::StopRecording,
    Control::PreviewContainer,
    Control::RecordingPreview,
];

pub struct AudioControlPanel<S: CaptureSource, V: ControlSurface> {
    handler: AudioHandler<S>,
    surface: V,
    bindings: Bindings<Self>,
    urls: ObjectUrls,
    form: FormInput,
    /// Object URL currently shown in the preview element
    preview_url: Option<String>,
}

impl<S: CaptureSource, V: ControlSurface> AudioControlPanel<S, V> {
    /// Wires a panel onto `surface`.
    ///
    /// # Errors
    /// - [`PanelError::MissingControl`] if the surface lacks a required control
    pub fn new(
        handler: AudioHandler<S>,
        surface: V,
        urls: ObjectUrls,
        form: FormInput,
    ) -> Result<Self, PanelError> {
        if let Some(missing) = REQUIRED_CONTROLS
            .iter()
            .find(|&&control| !surface.has_control(control))
        {
            return Err(PanelError::MissingControl(missing.selector()));
        }

        let mut panel = Self {
            handler,
            surface,
            bindings: Bindings::new(),
            urls,
            form,
            preview_url: None,
        };
        panel.bind_controls();
        Ok(panel)
    }

    fn bind_controls(&mut self) {
        let table: [(Control, Action<Self>); 8] = [
            (Control::PlayAudio, Self::handle_play_audio),
            (Control::PauseAudio, Self::handle_pause_audio),
            (Control::StopAudio, Self::handle_stop_audio),
            (Control::AdjustAudioRate, Self::handle_adjust_audio_rate),
            (Control::BeginRecording, |panel, _| panel.handle_start_or_resume_recording()),
            (Control::PauseRecording, |panel, _| panel.handle_pause_recording()),
            (Control::StopRecording, |panel, _| panel.handle_stop_recording()),
            (Control::DeleteRecording, |panel, _| panel.handle_delete_recording()),
        ];
        for (control, action) in table {
            self.bindings.bind(control, action);
        }
    }

    /// Dispatches a click on `control` to its bound action.
    ///
    /// # Errors
    /// - [`PanelError::Unbound`] if nothing is bound to `control`
    /// - Whatever the bound action returns
    pub fn click(&mut self, control: Control, element: &ElementData) -> Result<(), PanelError> {
        let action = self
            .bindings
            .get(control)
            .ok_or(PanelError::Unbound(control.selector()))?;
        tracing::debug!("Click on {}", control);
        action(self, element)
    }

    /// Registers every message element found on the page, returning their indices.
    ///
    /// # Errors
    /// - [`PanelError::MissingAttribute`] if an element has no `data-src`
    pub fn scan_audio_elements(&mut self, elements: &[ElementData]) -> Result<Vec<usize>, PanelError> {
        elements
            .iter()
            .map(|element| {
                let src = required_src(Control::PlayAudio, element)?;
                Ok(self.handler.register_message(src))
            })
            .collect()
    }

    /// Delivers pending device fragments into the take. Called every event-loop tick.
    pub fn tick(&mut self) -> usize {
        self.handler.pump()
    }

    pub fn handle_play_audio(&mut self, element: &ElementData) -> Result<(), PanelError> {
        if let Some(index) = self.message_for(Control::PlayAudio, element)? {
            self.handler.play_message(index)?;
        }
        Ok(())
    }

    pub fn handle_pause_audio(&mut self, element: &ElementData) -> Result<(), PanelError> {
        if let Some(index) = self.message_for(Control::PauseAudio, element)? {
            self.handler.pause_message(index)?;
        }
        Ok(())
    }

    pub fn handle_stop_audio(&mut self, element: &ElementData) -> Result<(), PanelError> {
        if let Some(index) = self.message_for(Control::StopAudio, element)? {
            self.handler.stop_message(index)?;
        }
        Ok(())
    }

    /// Applies `data-rate` (default 1.0) as the shared rate.
    ///
    /// The rate is checked before the message is looked up, so a rejected
    /// click leaves both the rate and the message list untouched.
    ///
    /// # Errors
    /// - [`PanelError::InvalidRateAttribute`] if `data-rate` does not parse
    /// - [`crate::error::PlaybackError::InvalidRate`] if the rate is not positive
    pub fn handle_adjust_audio_rate(&mut self, element: &ElementData) -> Result<(), PanelError> {
        let raw = element.rate.as_deref().unwrap_or("1.0");
        let rate: f32 = raw
            .trim()
            .parse()
            .map_err(|_| PanelError::InvalidRateAttribute(raw.to_string()))?;
        validate_rate(rate)?;

        if let Some(index) = self.message_for(Control::AdjustAudioRate, element)? {
            self.handler.adjust_rate(index, rate)?;
        }
        Ok(())
    }

    /// The begin button resumes a paused take and starts a new one otherwise.
    pub fn handle_start_or_resume_recording(&mut self) -> Result<(), PanelError> {
        match self.handler.state() {
            DeviceState::Paused => self.handle_resume_recording(),
            DeviceState::Inactive => self.handle_begin_recording(),
            DeviceState::Recording => {
                tracing::warn!("Begin clicked while already recording; ignoring");
                Ok(())
            }
        }
    }

    pub fn handle_begin_recording(&mut self) -> Result<(), PanelError> {
        self.handler.begin()?;
        if self.handler.state() == DeviceState::Recording {
            self.toggle_recording_controls(true);
            self.apply_highlight(Some(Control::BeginRecording));
        }
        Ok(())
    }

    pub fn handle_pause_recording(&mut self) -> Result<(), PanelError> {
        let mut preview: Option<AudioBlob> = None;
        self.handler.pause(|blob| preview = Some(blob))?;

        // Nothing to show when the handler ignored the pause
        let Some(blob) = preview else {
            return Ok(());
        };

        self.release_preview();
        let url = self.urls.create(&blob)?;
        self.surface.set_preview_source(Some(&url));
        self.preview_url = Some(url);

        self.surface.show(Control::PreviewContainer);
        self.apply_highlight(Some(Control::PauseRecording));
        Ok(())
    }

    pub fn handle_resume_recording(&mut self) -> Result<(), PanelError> {
        self.handler.resume()?;
        if self.handler.state() == DeviceState::Recording {
            self.surface.hide(Control::PreviewContainer);
            self.apply_highlight(Some(Control::BeginRecording));
        }
        Ok(())
    }

    /// Attaches the final take to the form input and resets the controls.
    pub fn handle_stop_recording(&mut self) -> Result<(), PanelError> {
        let form = &mut self.form;
        let result = self.handler.stop(|file| {
            form.set_files(vec![file]);
            form.dispatch_change();
        });

        self.reset_controls();
        result?;
        Ok(())
    }

    /// Discards the take and resets the controls. The form input is left alone.
    pub fn handle_delete_recording(&mut self) -> Result<(), PanelError> {
        let result = self.handler.delete();
        self.reset_controls();
        result?;
        Ok(())
    }

    /// Plays the paused take from its preview URL. Returns `false` if there is none.
    pub fn play_preview(&mut self) -> Result<bool, PanelError> {
        let Some(url) = self.preview_url.clone() else {
            return Ok(false);
        };
        Ok(self.handler.play_preview(&url)?)
    }

    pub fn handler(&self) -> &AudioHandler<S> {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut AudioHandler<S> {
        &mut self.handler
    }

    pub fn surface(&self) -> &V {
        &self.surface
    }

    pub fn form(&self) -> &FormInput {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormInput {
        &mut self.form
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    pub fn object_urls(&self) -> &ObjectUrls {
        &self.urls
    }

    /// Index of the scanned message `element` points at. Unknown sources are
    /// ignored with a warning; only [`Self::scan_audio_elements`] registers.
    fn message_for(
        &self,
        control: Control,
        element: &ElementData,
    ) -> Result<Option<usize>, PanelError> {
        let src = required_src(control, element)?;
        let index = self.handler.message_index(src);
        if index.is_none() {
            tracing::warn!("Ignoring {} on unknown audio message {}", control, src);
        }
        Ok(index)
    }

    fn reset_controls(&mut self) {
        self.release_preview();
        self.surface.hide(Control::PreviewContainer);
        self.toggle_recording_controls(false);
        self.apply_highlight(None);
    }

    fn release_preview(&mut self) {
        if let Some(url) = self.preview_url.take() {
            if let Err(e) = self.handler.stop_preview(&url) {
                tracing::debug!("Failed to stop preview playback: {}", e);
            }
            self.urls.revoke(&url);
        }
        self.surface.set_preview_source(None);
    }

    fn toggle_recording_controls(&mut self, show: bool) {
        for control in Control::RECORDING_CONTROLS {
            if show {
                self.surface.show(control);
            } else {
                self.surface.hide(control);
            }
        }
    }

    /// Highlights `active` and clears every other transport button.
    fn apply_highlight(&mut self, active: Option<Control>) {
        for control in Control::TRANSPORT {
            if Some(control) == active {
                self.surface.highlight(control);
            } else {
                self.surface.remove_highlight(control);
            }
        }
    }
}

fn required_src(control: Control, element: &ElementData) -> Result<&str, PanelError> {
    element
        .src
        .as_deref()
        .filter(|src| !src.is_empty())
        .ok_or(PanelError::MissingAttribute {
            control: control.selector(),
            attribute: "data-src",
        })
}

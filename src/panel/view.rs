//! In-memory control surface.
//!
//! Holds what a rendered panel would show. The terminal UI draws from it and
//! tests assert against it.

use std::collections::HashMap;

use super::control::{Control, ControlSurface};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub visible: bool,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PanelView {
    controls: HashMap<Control, ControlState>,
    preview_src: Option<String>,
}

impl PanelView {
    /// A view holding every known control. Recording controls and the preview
    /// container start hidden.
    pub fn new() -> Self {
        Self::with_controls(&Control::ALL)
    }

    /// A view holding only `controls`.
    pub fn with_controls(controls: &[Control]) -> Self {
        let controls = controls
            .iter()
            .map(|&control| {
                let hidden = Control::RECORDING_CONTROLS.contains(&control)
                    || control == Control::PreviewContainer;
                (
                    control,
                    ControlState {
                        visible: !hidden,
                        highlighted: false,
                    },
                )
            })
            .collect();
        Self {
            controls,
            preview_src: None,
        }
    }

    pub fn state(&self, control: Control) -> ControlState {
        self.controls.get(&control).copied().unwrap_or_default()
    }

    pub fn is_visible(&self, control: Control) -> bool {
        self.state(control).visible
    }

    pub fn is_highlighted(&self, control: Control) -> bool {
        self.state(control).highlighted
    }

    /// Controls currently highlighted.
    pub fn highlighted(&self) -> Vec<Control> {
        Control::ALL
            .into_iter()
            .filter(|&c| self.is_highlighted(c))
            .collect()
    }

    pub fn preview_src(&self) -> Option<&str> {
        self.preview_src.as_deref()
    }

    fn update(&mut self, control: Control, f: impl FnOnce(&mut ControlState)) {
        match self.controls.get_mut(&control) {
            Some(state) => f(state),
            None => tracing::debug!("Control {} not on this surface", control),
        }
    }
}

impl ControlSurface for PanelView {
    fn has_control(&self, control: Control) -> bool {
        self.controls.contains_key(&control)
    }

    fn show(&mut self, control: Control) {
        self.update(control, |s| s.visible = true);
    }

    fn hide(&mut self, control: Control) {
        self.update(control, |s| s.visible = false);
    }

    fn highlight(&mut self, control: Control) {
        self.update(control, |s| s.highlighted = true);
    }

    fn remove_highlight(&mut self, control: Control) {
        self.update(control, |s| s.highlighted = false);
    }

    fn set_preview_source(&mut self, src: Option<&str>) {
        self.preview_src = src.map(str::to_string);
    }
}

//! Audio control panel.
//!
//! [`AudioControlPanel`] binds the recording and message controls to an
//! [`crate::recording::AudioHandler`] and mirrors its state onto a
//! [`ControlSurface`]. [`PanelView`] is the in-memory surface the terminal UI
//! in [`tui`] draws from.

pub mod bindings;
pub mod control;
pub mod control_panel;
pub mod form;
pub mod object_url;
pub mod tui;
pub mod view;

pub use bindings::{Action, Bindings};
pub use control::{Control, ControlSurface, ElementData};
pub use control_panel::AudioControlPanel;
pub use form::FormInput;
pub use object_url::ObjectUrls;
pub use tui::{PanelCommand, PanelFrame, PanelTui};
pub use view::{ControlState, PanelView};

//! Interactive recorder/player panel.
//!
//! Acquires the input device and playback backend once, then runs the event
//! loop: deliver pending fragments, draw, and dispatch one key per tick.
//! Stopping a take attaches it to the form input, which saves it to the
//! attachment directory.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::VoicenoteConfig;
use crate::error::PanelError;
use crate::panel::tui::{step_rate, PanelCommand, PanelFrame, PanelTui};
use crate::panel::{AudioControlPanel, ElementData, FormInput, ObjectUrls, PanelView};
use crate::playback::select_player;
use crate::recording::{export_attachment, AudioHandler, CaptureSource, CpalSource, DeviceState};
use crate::ui::report_fatal;

const TICK: Duration = Duration::from_millis(50);

/// Options from the command line.
#[derive(Debug, Clone, Default)]
pub struct PanelOptions {
    /// Message sources listed in the panel
    pub messages: Vec<String>,
    /// Overrides `audio.attachment_dir`
    pub output: Option<PathBuf>,
}

/// Runs the panel until the user quits.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If no capture device or playback backend is available
/// - If the terminal fails
pub async fn handle_panel(options: PanelOptions) -> anyhow::Result<()> {
    tracing::info!("=== voicenote panel started ===");

    let config = VoicenoteConfig::load().map_err(|err| {
        tracing::error!("Failed to load configuration: {err:#}");
        report_fatal(
            "Configuration Error",
            &format!("{err:#}"),
            "Please check your ~/.config/voicenote/voicenote.toml file and try again.",
        );
        err
    })?;

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, flush_interval={}ms, backend={}",
        config.audio.device,
        config.audio.sample_rate,
        config.audio.flush_interval_ms,
        config.playback.backend
    );

    // The device is acquired once; a failure leaves the recorder unusable
    let source = CpalSource::acquire(&config.audio.device, config.audio.sample_rate).map_err(
        |err| {
            tracing::error!("Failed to acquire capture device: {err:#}");
            report_fatal(
                "Recording Error",
                &err,
                "Please check your audio configuration and try again.",
            );
            err
        },
    )?;

    let player = select_player(config.playback.backend).map_err(|err| {
        tracing::error!("Failed to initialize playback: {err}");
        report_fatal(
            "Playback Error",
            &err,
            "Install mpv or ffplay, or check your audio output device.",
        );
        err
    })?;

    let handler = AudioHandler::new(source, player, config.audio.flush_interval())?
        .with_playback_rate(config.playback.default_rate)?;

    let attachment_dir = options
        .output
        .clone()
        .unwrap_or_else(|| config.audio.attachment_dir());
    let scratch_dir = std::env::temp_dir().join("voicenote").join("previews");

    let saved: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let mut form = FormInput::new("messageMedia");
    {
        let saved = Rc::clone(&saved);
        let output_format = config.audio.output_format.clone();
        form.subscribe(move |_, files| {
            for file in files {
                match export_attachment(file, &attachment_dir, &output_format) {
                    Ok(path) => *saved.borrow_mut() = Some(path.display().to_string()),
                    Err(e) => tracing::error!("Failed to save attachment {}: {e:#}", file.name()),
                }
            }
        });
    }

    let mut panel =
        AudioControlPanel::new(handler, PanelView::new(), ObjectUrls::new(scratch_dir), form)?;
    let elements: Vec<ElementData> = options
        .messages
        .iter()
        .map(|src| ElementData::with_src(src.as_str()))
        .collect();
    panel.scan_audio_elements(&elements)?;

    let mut tui = PanelTui::new()?;
    let mut session = PanelSession::new(!options.messages.is_empty());

    loop {
        panel.tick();
        session.clock.observe(panel.handler().state());

        let attachment = saved.borrow().clone();
        let messages: Vec<&str> = panel.handler().messages().iter().map(|m| m.src()).collect();
        let frame = PanelFrame {
            state: panel.handler().state(),
            elapsed: session.clock.elapsed(),
            take_bytes: panel.handler().recording().byte_len(),
            messages,
            selected: session.selected,
            rate: panel.handler().playback_rate(),
            attachment: attachment.as_deref(),
            status: session.status.as_deref(),
        };
        tui.render(panel.surface(), &frame)?;

        let command = tui.handle_input(TICK)?;
        if command == PanelCommand::Quit {
            break;
        }
        if let Err(e) = session.apply(&mut panel, command) {
            if e.is_configuration_error() {
                return Err(e.into());
            }
            tracing::warn!("{}", e);
            session.status = Some(e.to_string());
        }
    }

    tui.cleanup()?;
    tracing::info!("=== voicenote panel closed ===");
    Ok(())
}

/// UI state that lives outside the panel itself.
struct PanelSession {
    selected: Option<usize>,
    status: Option<String>,
    clock: TakeClock,
}

impl PanelSession {
    fn new(has_messages: bool) -> Self {
        Self {
            selected: has_messages.then_some(0),
            status: None,
            clock: TakeClock::default(),
        }
    }

    fn apply<S: CaptureSource>(
        &mut self,
        panel: &mut AudioControlPanel<S, PanelView>,
        command: PanelCommand,
    ) -> Result<(), PanelError> {
        if command != PanelCommand::Continue {
            self.status = None;
        }

        match command {
            PanelCommand::Continue | PanelCommand::Quit => Ok(()),
            PanelCommand::Click(control) => panel.click(control, &ElementData::new()),
            PanelCommand::Select(index) => {
                if index < panel.handler().messages().len() {
                    self.selected = Some(index);
                }
                Ok(())
            }
            PanelCommand::PlaySelected => self.click_selected(panel, |p, el| p.handle_play_audio(el)),
            PanelCommand::PauseSelected => {
                self.click_selected(panel, |p, el| p.handle_pause_audio(el))
            }
            PanelCommand::StopSelected => self.click_selected(panel, |p, el| p.handle_stop_audio(el)),
            PanelCommand::StepRate(steps) => {
                let rate = step_rate(panel.handler().playback_rate(), steps);
                self.click_selected(panel, |p, el| {
                    p.handle_adjust_audio_rate(&el.clone().rate(rate.to_string()))
                })
            }
            PanelCommand::PlayPreview => {
                if !panel.play_preview()? {
                    self.status = Some("Nothing to preview".to_string());
                }
                Ok(())
            }
        }
    }

    /// Runs `action` with the element data of the selected message.
    fn click_selected<S, F>(
        &mut self,
        panel: &mut AudioControlPanel<S, PanelView>,
        action: F,
    ) -> Result<(), PanelError>
    where
        S: CaptureSource,
        F: FnOnce(&mut AudioControlPanel<S, PanelView>, &ElementData) -> Result<(), PanelError>,
    {
        let Some(src) = self
            .selected
            .and_then(|i| panel.handler().messages().get(i))
            .map(|m| m.src().to_string())
        else {
            self.status = Some("No message selected".to_string());
            return Ok(());
        };
        action(panel, &ElementData::with_src(src))
    }
}

/// Elapsed recording time of the current take, excluding pauses.
#[derive(Debug, Default)]
struct TakeClock {
    started: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl TakeClock {
    /// Follows the recorder state once per tick.
    fn observe(&mut self, state: DeviceState) {
        let now = Instant::now();
        match state {
            DeviceState::Inactive => *self = Self::default(),
            DeviceState::Recording => {
                if self.started.is_none() {
                    self.started = Some(now);
                }
                if let Some(paused_at) = self.paused_at.take() {
                    self.paused_total += now.duration_since(paused_at);
                }
            }
            DeviceState::Paused => {
                if self.started.is_some() && self.paused_at.is_none() {
                    self.paused_at = Some(now);
                }
            }
        }
    }

    fn elapsed(&self) -> Duration {
        let Some(started) = self.started else {
            return Duration::ZERO;
        };
        let end = self.paused_at.unwrap_or_else(Instant::now);
        end.duration_since(started).saturating_sub(self.paused_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::Control;
    use crate::playback::player::testing::{counting_player, Call, SharedLog};
    use crate::recording::device::testing::ScriptedSource;

    type ScriptedPanel = AudioControlPanel<ScriptedSource, PanelView>;

    fn panel() -> (ScriptedPanel, SharedLog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (source, _) = ScriptedSource::new();
        let (player, log) = counting_player();
        let mut handler = AudioHandler::new(source, player, None).unwrap();
        handler.register_message("a.webm");
        handler.register_message("b.webm");
        let panel = AudioControlPanel::new(
            handler,
            PanelView::new(),
            ObjectUrls::new(dir.path()),
            FormInput::new("messageMedia"),
        )
        .unwrap();
        (panel, log, dir)
    }

    #[test]
    fn test_selection_drives_message_commands() {
        let (mut panel, log, _dir) = panel();
        let mut session = PanelSession::new(true);

        session.apply(&mut panel, PanelCommand::Select(1)).unwrap();
        session.apply(&mut panel, PanelCommand::PlaySelected).unwrap();
        session.apply(&mut panel, PanelCommand::StopSelected).unwrap();

        let log = log.borrow();
        assert_eq!(log.count(&Call::Play("b.webm".into())), 1);
        assert_eq!(log.count(&Call::Stop("b.webm".into())), 1);
        assert_eq!(log.count(&Call::Play("a.webm".into())), 0);
    }

    #[test]
    fn test_out_of_range_selection_is_ignored() {
        let (mut panel, _, _dir) = panel();
        let mut session = PanelSession::new(true);
        session.apply(&mut panel, PanelCommand::Select(5)).unwrap();
        assert_eq!(session.selected, Some(0));
    }

    #[test]
    fn test_rate_steps_update_shared_rate() {
        let (mut panel, _, _dir) = panel();
        let mut session = PanelSession::new(true);
        session.apply(&mut panel, PanelCommand::StepRate(2)).unwrap();
        assert_eq!(panel.handler().playback_rate(), 1.5);
        session.apply(&mut panel, PanelCommand::StepRate(-1)).unwrap();
        assert_eq!(panel.handler().playback_rate(), 1.25);
    }

    #[test]
    fn test_no_selection_sets_status() {
        let (mut panel, log, _dir) = panel();
        let mut session = PanelSession::new(false);
        session.apply(&mut panel, PanelCommand::PlaySelected).unwrap();
        assert_eq!(session.status.as_deref(), Some("No message selected"));
        assert!(log.borrow().calls.is_empty());
    }

    #[test]
    fn test_recording_keys_click_controls() {
        let (mut panel, _, _dir) = panel();
        let mut session = PanelSession::new(true);
        session
            .apply(&mut panel, PanelCommand::Click(Control::BeginRecording))
            .unwrap();
        assert_eq!(panel.handler().state(), DeviceState::Recording);

        session.apply(&mut panel, PanelCommand::PlayPreview).unwrap();
        assert_eq!(session.status.as_deref(), Some("Nothing to preview"));

        session
            .apply(&mut panel, PanelCommand::Click(Control::DeleteRecording))
            .unwrap();
        assert_eq!(panel.handler().state(), DeviceState::Inactive);
    }

    #[test]
    fn test_take_clock_resets_when_inactive() {
        let mut clock = TakeClock::default();
        assert_eq!(clock.elapsed(), Duration::ZERO);

        clock.observe(DeviceState::Recording);
        clock.observe(DeviceState::Paused);
        let frozen = clock.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.elapsed(), frozen);

        clock.observe(DeviceState::Inactive);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}

//! Terminal rendering of the control panel.
//!
//! Draws the recording controls, the preview container and the message list
//! from a [`PanelView`], and maps key presses onto panel commands.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use super::control::Control;
use super::view::PanelView;
use crate::recording::DeviceState;

/// Smallest and largest rate reachable with the rate keys.
pub const MIN_RATE: f32 = 0.25;
pub const MAX_RATE: f32 = 3.0;
const RATE_STEP: f32 = 0.25;

/// User input mapped onto the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelCommand {
    /// No key pressed
    Continue,
    /// Click on a recording control
    Click(Control),
    /// Select the message at this index (0-based)
    Select(usize),
    PlaySelected,
    PauseSelected,
    StopSelected,
    /// Change the shared rate by this many steps
    StepRate(i8),
    PlayPreview,
    Quit,
}

/// Maps a key press to a panel command.
pub fn command_for_key(key: KeyEvent) -> PanelCommand {
    if key.kind != KeyEventKind::Press {
        return PanelCommand::Continue;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => PanelCommand::Quit,
        KeyCode::Char('q') | KeyCode::Esc => PanelCommand::Quit,
        KeyCode::Char('r') => PanelCommand::Click(Control::BeginRecording),
        KeyCode::Char('p') => PanelCommand::Click(Control::PauseRecording),
        KeyCode::Char('s') => PanelCommand::Click(Control::StopRecording),
        KeyCode::Char('d') => PanelCommand::Click(Control::DeleteRecording),
        KeyCode::Char(' ') => PanelCommand::PlaySelected,
        KeyCode::Char('x') => PanelCommand::PauseSelected,
        KeyCode::Char('z') => PanelCommand::StopSelected,
        KeyCode::Char('+') | KeyCode::Char('=') => PanelCommand::StepRate(1),
        KeyCode::Char('-') => PanelCommand::StepRate(-1),
        KeyCode::Char('v') => PanelCommand::PlayPreview,
        KeyCode::Char(c @ '1'..='9') => PanelCommand::Select(c as usize - '1' as usize),
        _ => PanelCommand::Continue,
    }
}

/// Moves `rate` by `steps` rate increments, clamped to the reachable range.
pub fn step_rate(rate: f32, steps: i8) -> f32 {
    let stepped = rate + RATE_STEP * steps as f32;
    // Snap to the step grid so repeated presses don't drift
    ((stepped / RATE_STEP).round() * RATE_STEP).clamp(MIN_RATE, MAX_RATE)
}

/// Everything one frame shows besides the control states.
#[derive(Debug, Clone, Default)]
pub struct PanelFrame<'a> {
    pub state: DeviceState,
    pub elapsed: Duration,
    pub take_bytes: usize,
    pub messages: Vec<&'a str>,
    pub selected: Option<usize>,
    pub rate: f32,
    /// Name of the file attached by the last stop
    pub attachment: Option<&'a str>,
    /// One-line status or error message
    pub status: Option<&'a str>,
}

/// Draws the panel into `area`.
pub fn draw_panel(frame: &mut Frame, area: Rect, view: &PanelView, panel: &PanelFrame) {
    let [controls_area, preview_area, messages_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    frame.render_widget(controls_line(view, panel), controls_area);

    if view.is_visible(Control::PreviewContainer) {
        let preview = Paragraph::new(Line::from(vec![
            Span::styled("▶ ", Style::default().fg(Color::Yellow)),
            Span::raw(view.preview_src().unwrap_or("(empty take)")),
            Span::styled("  [v] play", Style::default().fg(Color::DarkGray)),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Preview"));
        frame.render_widget(preview, preview_area);
    }

    let items: Vec<ListItem> = panel
        .messages
        .iter()
        .enumerate()
        .map(|(i, src)| ListItem::new(format!("{}. {}", i + 1, src)))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Messages"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(panel.selected);
    frame.render_stateful_widget(list, messages_area, &mut list_state);

    frame.render_widget(footer_line(panel), footer_area);
}

fn controls_line<'a>(view: &PanelView, panel: &PanelFrame) -> Paragraph<'a> {
    let mut spans = Vec::new();
    for control in [
        Control::BeginRecording,
        Control::PauseRecording,
        Control::StopRecording,
        Control::DeleteRecording,
    ] {
        if !view.is_visible(control) {
            continue;
        }
        let style = if view.is_highlighted(control) {
            Style::default().fg(Color::Black).bg(Color::Rgb(185, 207, 212))
        } else {
            Style::default().fg(Color::Rgb(185, 207, 212))
        };
        spans.push(Span::styled(format!(" {} ", control.label()), style));
        spans.push(Span::raw(" "));
    }

    let indicator = match panel.state {
        DeviceState::Recording => Span::styled("● ", Style::default().fg(Color::Red)),
        DeviceState::Paused => Span::styled("⏸ ", Style::default().fg(Color::Yellow)),
        DeviceState::Inactive => Span::raw("  "),
    };
    let secs = panel.elapsed.as_secs();
    spans.push(indicator);
    spans.push(Span::raw(format!(
        "{}:{:02} / {}",
        secs / 60,
        secs % 60,
        format_bytes(panel.take_bytes)
    )));

    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Recorder"))
}

fn footer_line<'a>(panel: &'a PanelFrame) -> Paragraph<'a> {
    let mut spans = vec![Span::raw(format!("{:.2}x", panel.rate))];
    if let Some(name) = panel.attachment {
        spans.push(Span::raw(" / attached: "));
        spans.push(Span::styled(name, Style::default().fg(Color::Green)));
    }
    if let Some(status) = panel.status {
        spans.push(Span::raw(" / "));
        spans.push(Span::styled(status, Style::default().fg(Color::Red)));
    }
    Paragraph::new(Line::from(spans)).style(
        Style::default()
            .fg(Color::Rgb(185, 207, 212))
            .bg(Color::Rgb(0, 0, 0)),
    )
}

fn format_bytes(bytes: usize) -> String {
    match bytes {
        b if b >= 1024 * 1024 => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
        b if b >= 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{b} B"),
    }
}

/// Full-screen terminal the panel is drawn on.
pub struct PanelTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl PanelTui {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    pub fn render(&mut self, view: &PanelView, panel: &PanelFrame) -> anyhow::Result<()> {
        self.terminal.draw(|frame| {
            let area = frame.area();
            draw_panel(frame, area, view, panel);
        })?;
        Ok(())
    }

    /// Waits up to `timeout` for a key press.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<PanelCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let command = command_for_key(key);
                if command != PanelCommand::Continue {
                    tracing::debug!("Key {:?}: {:?}", key.code, command);
                }
                return Ok(command);
            }
        }
        Ok(PanelCommand::Continue)
    }

    /// Leaves the alternate screen and restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for PanelTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::control::ControlSurface;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn render(view: &PanelView, panel: &PanelFrame) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 14)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                draw_panel(frame, area, view, panel);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(
            command_for_key(key(KeyCode::Char('r'))),
            PanelCommand::Click(Control::BeginRecording)
        );
        assert_eq!(
            command_for_key(key(KeyCode::Char('d'))),
            PanelCommand::Click(Control::DeleteRecording)
        );
        assert_eq!(command_for_key(key(KeyCode::Char('3'))), PanelCommand::Select(2));
        assert_eq!(command_for_key(key(KeyCode::Char('-'))), PanelCommand::StepRate(-1));
        assert_eq!(command_for_key(key(KeyCode::Esc)), PanelCommand::Quit);
        assert_eq!(
            command_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            PanelCommand::Quit
        );
        assert_eq!(command_for_key(key(KeyCode::Char('k'))), PanelCommand::Continue);
    }

    #[test]
    fn test_step_rate_clamps_to_range() {
        assert_eq!(step_rate(1.0, 1), 1.25);
        assert_eq!(step_rate(1.0, -1), 0.75);
        assert_eq!(step_rate(MIN_RATE, -1), MIN_RATE);
        assert_eq!(step_rate(MAX_RATE, 1), MAX_RATE);
        // Off-grid rates snap back onto it
        assert_eq!(step_rate(1.1, 1), 1.25);
    }

    #[test]
    fn test_idle_panel_hides_recording_controls() {
        let view = PanelView::new();
        let panel = PanelFrame {
            rate: 1.0,
            ..Default::default()
        };
        let screen = render(&view, &panel);
        assert!(screen.contains("Record"));
        assert!(!screen.contains("Delete"));
        assert!(!screen.contains("Preview"));
        assert!(screen.contains("1.00x"));
    }

    #[test]
    fn test_paused_panel_shows_preview_and_messages() {
        let mut view = PanelView::new();
        for control in Control::RECORDING_CONTROLS {
            view.show(control);
        }
        view.show(Control::PreviewContainer);
        view.set_preview_source(Some("file:///tmp/take.webm"));
        view.highlight(Control::PauseRecording);

        let panel = PanelFrame {
            state: DeviceState::Paused,
            elapsed: Duration::from_secs(75),
            take_bytes: 2048,
            messages: vec!["a.webm", "b.webm"],
            selected: Some(1),
            rate: 1.5,
            attachment: None,
            status: None,
        };
        let screen = render(&view, &panel);
        assert!(screen.contains("Delete"));
        assert!(screen.contains("file:///tmp/take.webm"));
        assert!(screen.contains("1:15 / 2.0 KB"));
        assert!(screen.contains("1. a.webm"));
        assert!(screen.contains("> 2. b.webm"));
        assert!(screen.contains("1.50x"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(10), "10 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}

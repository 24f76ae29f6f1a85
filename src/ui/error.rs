//! Full-screen error display for failures that end the session.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ERROR_BG: Color = Color::Rgb(255, 0, 0);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);

/// Red error screen dismissed by any key.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen { terminal })
    }

    /// Shows `error_message` until a key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                draw_error(frame, area, error_message);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
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

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Shows a titled error with a hint and waits for a key press.
///
/// Falls back to stderr when no terminal screen can be opened.
pub fn report_fatal(title: &str, error: &dyn std::fmt::Display, hint: &str) {
    let message = format!("{title}:\n\n{error}\n\n{hint}");
    let shown = ErrorScreen::new().and_then(|mut screen| {
        screen.show_error(&message)?;
        screen.cleanup()
    });
    if let Err(e) = shown {
        tracing::debug!("Error screen unavailable: {}", e);
        eprintln!("{message}");
    }
}

/// Paints `area` red and centers the wrapped message at 80% width.
pub fn draw_error(frame: &mut Frame, area: Rect, error_message: &str) {
    frame
        .buffer_mut()
        .set_style(area, Style::default().bg(ERROR_BG));

    let padding_x = area.width / 10;
    let text_width = (area.width * 80) / 100;

    let paragraph = Paragraph::new(Text::styled(
        error_message,
        Style::default().fg(ERROR_FG).bg(ERROR_BG),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    let centered_area = Rect {
        x: area.x + padding_x,
        y: area.y + area.height / 3,
        width: text_width,
        height: area.height - area.height / 3,
    };

    frame.render_widget(paragraph, centered_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_error_is_centered_on_red() {
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                draw_error(frame, area, "No input device");
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(0u16, 0u16)].bg, ERROR_BG);
        let row: String = (0..40u16).map(|x| buffer[(x, 3u16)].symbol()).collect();
        assert_eq!(row.trim(), "No input device");
    }
}

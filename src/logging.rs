//! File logging through `tracing`.
//!
//! Logs go to a daily-rotated file under the XDG state directory and never to
//! the terminal, which belongs to the panel UI. At startup only the seven most
//! recent log files are kept.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

/// Prefix of every log file name; the appender adds a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_PREFIX: &str = "voicenote.log";

const MAX_LOG_FILES: usize = 7;

/// Keeps the non-blocking writer alive for the program lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Installs the global subscriber.
///
/// The level comes from `RUST_LOG` and defaults to "info".
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    if let Err(e) = cleanup_old_logs(&log_dir) {
        eprintln!("Warning: Failed to cleanup old logs: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging initialized. Log dir: {}", log_dir.display());
    Ok(())
}

/// `$XDG_STATE_HOME/voicenote`, or `~/.local/state/voicenote`.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn log_dir() -> anyhow::Result<PathBuf> {
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        if !xdg_state.is_empty() {
            return Ok(PathBuf::from(xdg_state).join("voicenote"));
        }
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".local").join("state").join("voicenote"))
}

/// Rotated log files in `dir`, newest first.
pub fn rotated_logs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut log_files: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let file_name = path.file_name()?.to_string_lossy().to_string();
            if !file_name.starts_with(LOG_FILE_PREFIX) {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect();

    log_files.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(log_files.into_iter().map(|(path, _)| path).collect())
}

/// Removes all but the most recent log files.
fn cleanup_old_logs(dir: &Path) -> anyhow::Result<()> {
    for path in rotated_logs(dir)?.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
        }
    }
    Ok(())
}

//! Display recent log entries from the application.

use anyhow::anyhow;
use std::fs;

use crate::logging::{log_dir, rotated_logs};

const DEFAULT_LINES: usize = 50;

/// Prints the last lines of the most recent log file.
///
/// # Errors
/// - If the log directory cannot be determined
/// - If the log file cannot be read
pub fn handle_logs() -> anyhow::Result<()> {
    let log_dir = log_dir()?;

    if !log_dir.exists() {
        println!("Log directory does not exist yet: {}", log_dir.display());
        println!("Logs will be created when the application runs.");
        return Ok(());
    }

    let Some(log_file) = rotated_logs(&log_dir)?.into_iter().next() else {
        println!("No log files found in: {}", log_dir.display());
        println!("Run 'voicenote' to generate logs.");
        return Ok(());
    };

    let content =
        fs::read_to_string(&log_file).map_err(|e| anyhow!("Failed to read log file: {e}"))?;

    if content.is_empty() {
        println!("Log file is empty: {}", log_file.display());
        return Ok(());
    }

    let lines = tail(&content, DEFAULT_LINES);
    let total = content.lines().count();

    if lines.len() < total {
        println!("Showing last {} of {} lines:", lines.len(), total);
    } else {
        println!("Showing all {} lines:", total);
    }
    println!("Full log file at: {}", log_file.display());
    println!();

    for line in lines {
        println!("{line}");
    }

    Ok(())
}

/// The last `count` lines of `content`.
fn tail(content: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail() {
        let content = "a\nb\nc\nd";
        assert_eq!(tail(content, 2), vec!["c", "d"]);
        assert_eq!(tail(content, 10), vec!["a", "b", "c", "d"]);
        assert!(tail("", 5).is_empty());
    }
}

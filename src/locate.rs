//! Locates external binaries.
//!
//! ffmpeg is used to convert saved takes; mpv and ffplay back the system
//! playback backend; an editor opens the config file. Standard install locations are checked before falling
//! back to a PATH search, since launchers often run with a reduced PATH.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Locates the ffmpeg binary.
///
/// # Errors
/// - If ffmpeg is neither in a standard location nor on PATH
pub fn find_ffmpeg() -> Result<PathBuf> {
    find_binary("ffmpeg").map_err(|_| {
        anyhow!(
            "ffmpeg not found. Please install ffmpeg:\n\
             macOS: brew install ffmpeg\n\
             Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)"
        )
    })
}

/// Locates `name` in the platform's usual binary directories, then on PATH.
pub fn find_binary(name: &str) -> Result<PathBuf> {
    let dirs: &[&str] = if cfg!(target_os = "macos") {
        &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin", "/usr/local/bin", "/snap/bin"]
    } else {
        &[]
    };

    if let Some(path) = dirs
        .iter()
        .map(|dir| PathBuf::from(dir).join(name))
        .find(|path| path.exists())
    {
        tracing::debug!("Found {} at: {}", name, path.display());
        return Ok(path);
    }

    let path = find_in_path(name)?;
    tracing::debug!("Found {} in PATH at: {}", name, path.display());
    Ok(path)
}

/// Searches for a binary in the system PATH using `which` or `where`.
pub fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = std::process::Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {binary_name}: {e}"))?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        // `where` may print several matches
        if let Some(first) = path_str.lines().next() {
            let path = PathBuf::from(first.trim());
            if !path.as_os_str().is_empty() {
                return Ok(path);
            }
        }
    }

    Err(anyhow!("{binary_name} not found in PATH"))
}

/// Editors tried when `$EDITOR` is unset, in order.
const FALLBACK_EDITORS: [&str; 2] = ["nano", "vi"];

/// Picks the editor for the config file: `$EDITOR`, then nano, then vi.
///
/// # Errors
/// - If `$EDITOR` is unset and no fallback editor is installed
pub fn find_editor() -> Result<String> {
    let configured = std::env::var("EDITOR").ok();
    choose_editor(configured.as_deref(), |editor| find_in_path(editor).is_ok())
        .ok_or_else(|| anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

fn choose_editor(configured: Option<&str>, installed: impl Fn(&str) -> bool) -> Option<String> {
    configured
        .filter(|editor| !editor.is_empty())
        .or_else(|| FALLBACK_EDITORS.into_iter().find(|editor| installed(*editor)))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_an_error() {
        assert!(find_binary("voicenote-definitely-not-installed").is_err());
    }

    #[test]
    fn test_editor_choice() {
        assert_eq!(choose_editor(Some("hx"), |_| false), Some("hx".to_string()));
        assert_eq!(choose_editor(Some(""), |e| e == "vi"), Some("vi".to_string()));
        assert_eq!(choose_editor(None, |_| true), Some("nano".to_string()));
        assert_eq!(choose_editor(None, |_| false), None);
    }
}

//! Configuration file editor command.

use std::process::Command;

use anyhow::{bail, Context};

use crate::config::{config_path, VoicenoteConfig};
use crate::locate::find_editor;

/// Opens voicenote.toml in the user's editor, writing defaults first when the
/// file does not exist yet. The edited file is parsed again afterwards so a
/// typo is reported now instead of on the next panel start.
///
/// # Errors
/// - If the config file cannot be created
/// - If no editor can be found or it exits unsuccessfully
pub fn handle_config() -> anyhow::Result<()> {
    let path = config_path()?;
    VoicenoteConfig::load_or_init(&path)?;

    let editor = find_editor()?;
    tracing::info!("Editing {} with {}", path.display(), editor);

    let status = Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to launch editor '{editor}'"))?;
    if !status.success() {
        bail!("{editor} exited with {status}");
    }

    match VoicenoteConfig::load_or_init(&path) {
        Ok(_) => tracing::info!("Configuration saved"),
        Err(e) => {
            tracing::warn!("Edited configuration does not parse: {e:#}");
            eprintln!("Warning: {e:#}");
        }
    }
    Ok(())
}

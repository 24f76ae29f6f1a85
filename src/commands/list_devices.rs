//! List available audio input devices.

use crate::recording::{input_devices, InputDeviceInfo};

/// Prints every input device with the index and name accepted by `audio.device`.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> anyhow::Result<()> {
    let devices = input_devices()?;

    if devices.is_empty() {
        println!("No audio input devices found on this system.");
        return Ok(());
    }

    println!("Available audio input devices:");
    println!();
    for device in &devices {
        println!("{}", describe(device));
        println!();
    }

    Ok(())
}

fn describe(device: &InputDeviceInfo) -> String {
    let default_indicator = if device.is_default { " [DEFAULT]" } else { "" };
    let config_info = match device.config {
        Some((sample_rate, channels)) => format!(" ({sample_rate}Hz, {channels} channels)"),
        None => " (configuration unavailable)".to_string(),
    };
    format!(
        "  ID: {}\n    Name: {}{}\n    Config:{}",
        device.index, device.name, default_indicator, config_info
    )
}

//! Recording state machine and message registry.
//!
//! ```text
//! inactive --begin--> recording --pause--> paused --resume--> recording
//! recording | paused --stop--> inactive        any --delete--> inactive
//! ```
//!
//! Operations requested out of sequence are ignored with a warning so rapid
//! repeated clicks cannot break the recorder. After `stop` and `delete` the
//! device session is replaced with a fresh one from the source, since a
//! stopped session cannot be restarted.

use std::time::Duration;

use super::artifact::{AudioBlob, AudioFile};
use super::device::{CaptureDevice, CaptureSource, DeviceState};
use super::session::Recording;
use crate::error::{PlaybackError, RecorderError};
use crate::playback::{validate_rate, AudioMessage, SharedPlayer};

/// Default shared playback rate.
pub const DEFAULT_PLAYBACK_RATE: f32 = 1.0;

/// Drives a capture source and keeps the list of playable messages.
pub struct AudioHandler<S: CaptureSource> {
    source: S,
    device: Option<S::Device>,
    recording: Recording,
    /// Interval between data-available fragments while recording
    flush_interval: Option<Duration>,
    messages: Vec<AudioMessage>,
    player: SharedPlayer,
    playback_rate: f32,
}

impl<S: CaptureSource> AudioHandler<S> {
    /// Creates a handler with a first device session opened from `source`.
    ///
    /// # Errors
    /// - If the source cannot open a session
    pub fn new(
        mut source: S,
        player: SharedPlayer,
        flush_interval: Option<Duration>,
    ) -> Result<Self, RecorderError> {
        let device = source.open_session()?;
        let recording = Recording::new(source.format());
        Ok(Self {
            source,
            device: Some(device),
            recording,
            flush_interval,
            messages: Vec::new(),
            player,
            playback_rate: DEFAULT_PLAYBACK_RATE,
        })
    }

    /// Starts the shared playback rate at `rate` instead of 1.0.
    ///
    /// # Errors
    /// - [`PlaybackError::InvalidRate`] if `rate` is not positive and finite
    pub fn with_playback_rate(mut self, rate: f32) -> Result<Self, PlaybackError> {
        validate_rate(rate)?;
        self.playback_rate = rate;
        Ok(self)
    }

    /// Current device state; `Inactive` when no session is installed.
    pub fn state(&self) -> DeviceState {
        self.device
            .as_ref()
            .map(CaptureDevice::state)
            .unwrap_or(DeviceState::Inactive)
    }

    /// Starts capturing into an empty recording.
    pub fn begin(&mut self) -> Result<(), RecorderError> {
        let flush_interval = self.flush_interval;
        let Some(device) = self.live_device(DeviceState::Inactive, "begin") else {
            return Ok(());
        };
        device.start(flush_interval)?;
        tracing::info!("Recording started");
        Ok(())
    }

    /// Moves fragments the device has emitted into the recording, in order.
    ///
    /// Returns the number of fragments delivered.
    pub fn pump(&mut self) -> usize {
        let Some(device) = self.device.as_mut() else {
            return 0;
        };
        let chunks = device.take_chunks();
        let delivered = chunks.len();
        for chunk in chunks {
            self.recording.add_chunk(chunk);
        }
        delivered
    }

    /// Pauses capture, flushes, and hands a preview of the take to `on_preview`.
    pub fn pause<F>(&mut self, on_preview: F) -> Result<(), RecorderError>
    where
        F: FnOnce(AudioBlob),
    {
        let Some(device) = self.live_device(DeviceState::Recording, "pause") else {
            return Ok(());
        };
        device.pause()?;
        device.request_data();
        self.pump();

        let preview = self.recording.pause();
        tracing::info!("Recording paused ({} bytes so far)", preview.size());
        on_preview(preview);
        Ok(())
    }

    /// Resumes capture into the same recording.
    pub fn resume(&mut self) -> Result<(), RecorderError> {
        let Some(device) = self.live_device(DeviceState::Paused, "resume") else {
            return Ok(());
        };
        device.resume()?;
        tracing::info!("Recording resumed");
        Ok(())
    }

    /// Ends the take, hands the final file to `on_stop`, and installs a fresh session.
    ///
    /// # Errors
    /// - [`RecorderError::NoDeviceSession`] if no session is installed
    /// - If the device fails to stop or a new session cannot be opened
    pub fn stop<F>(&mut self, on_stop: F) -> Result<(), RecorderError>
    where
        F: FnOnce(AudioFile),
    {
        let device = self.device.as_mut().ok_or(RecorderError::NoDeviceSession)?;
        if device.state() == DeviceState::Inactive {
            tracing::warn!("Ignoring stop: recorder is inactive");
            return Ok(());
        }

        device.stop()?;
        self.pump();

        let file = self.recording.stop();
        tracing::info!(
            "Recording stopped: {} ({} bytes)",
            file.name(),
            file.blob().size()
        );
        on_stop(file);

        self.renew_session()
    }

    /// Discards the take and installs a fresh session. No artifact is produced.
    pub fn delete(&mut self) -> Result<(), RecorderError> {
        if let Some(device) = self.device.as_mut() {
            if device.state() != DeviceState::Inactive {
                device.stop()?;
                // Drain so nothing from the discarded take leaks into the next one
                let _ = device.take_chunks();
            }
        }
        self.recording.reset();
        tracing::info!("Recording deleted");
        self.renew_session()
    }

    /// Plays the current take from `src` at the shared rate.
    ///
    /// The caller makes `src` resolve to the preview blob. The preview is not
    /// added to the message list. Returns `false` when there is nothing to play.
    pub fn play_preview(&mut self, src: &str) -> Result<bool, PlaybackError> {
        if self.recording.is_empty() {
            return Ok(false);
        }
        let preview = AudioMessage::new(src, &self.player);
        preview.set_playback_rate(self.playback_rate)?;
        preview.play()?;
        Ok(true)
    }

    /// Stops preview playback from `src` and drops the player behind it.
    ///
    /// A preview that was never played has no player and nothing happens.
    pub fn stop_preview(&mut self, src: &str) -> Result<(), PlaybackError> {
        self.player.borrow_mut().release(src)
    }

    /// Current preview of the take without touching device state.
    pub fn preview_blob(&self) -> AudioBlob {
        self.recording.pause()
    }

    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Registers a playable source and returns its index. Already registered
    /// sources keep their index.
    pub fn register_message(&mut self, src: &str) -> usize {
        if let Some(index) = self.message_index(src) {
            return index;
        }
        self.messages.push(AudioMessage::new(src, &self.player));
        tracing::debug!("Registered audio message #{}: {}", self.messages.len() - 1, src);
        self.messages.len() - 1
    }

    pub fn message_index(&self, src: &str) -> Option<usize> {
        self.messages.iter().position(|m| m.src() == src)
    }

    pub fn messages(&self) -> &[AudioMessage] {
        &self.messages
    }

    /// Plays message `index` at the shared playback rate. Unknown indices are ignored.
    pub fn play_message(&mut self, index: usize) -> Result<(), PlaybackError> {
        let Some(message) = self.messages.get(index) else {
            tracing::warn!("No audio message at index {}", index);
            return Ok(());
        };
        message.set_playback_rate(self.playback_rate)?;
        message.play()
    }

    pub fn pause_message(&mut self, index: usize) -> Result<(), PlaybackError> {
        match self.messages.get(index) {
            Some(message) => message.pause(),
            None => Ok(()),
        }
    }

    pub fn stop_message(&mut self, index: usize) -> Result<(), PlaybackError> {
        match self.messages.get(index) {
            Some(message) => message.stop(),
            None => Ok(()),
        }
    }

    /// Sets the shared playback rate and applies it to message `index` immediately.
    ///
    /// # Errors
    /// - [`PlaybackError::InvalidRate`] if `rate` is not positive and finite;
    ///   the shared rate is left untouched
    pub fn adjust_rate(&mut self, index: usize, rate: f32) -> Result<(), PlaybackError> {
        validate_rate(rate)?;
        let Some(message) = self.messages.get(index) else {
            return Ok(());
        };
        self.playback_rate = rate;
        tracing::debug!("Playback rate set to {}", rate);
        message.set_playback_rate(rate)
    }

    pub fn playback_rate(&self) -> f32 {
        self.playback_rate
    }

    /// Returns the device if it is in `expected` state, warning otherwise.
    fn live_device(&mut self, expected: DeviceState, operation: &str) -> Option<&mut S::Device> {
        let Some(device) = self.device.as_mut() else {
            tracing::warn!("Ignoring {}: no capture device session", operation);
            return None;
        };
        let state = device.state();
        if state != expected {
            tracing::warn!("Ignoring {}: recorder is {}", operation, state);
            return None;
        }
        Some(device)
    }

    fn renew_session(&mut self) -> Result<(), RecorderError> {
        self.device = None;
        let device = self.source.open_session().map_err(|e| {
            tracing::error!("Failed to open a new capture session: {}", e);
            e
        })?;
        self.device = Some(device);
        Ok(())
    }
}

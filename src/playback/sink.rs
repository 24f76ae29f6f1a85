//! In-process playback through rodio.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use super::player::{PlaybackBackend, PlaybackHandle};
use super::{local_path, validate_rate};
use crate::error::PlaybackError;

/// Backend holding the default output stream; one sink per source.
pub struct RodioBackend {
    // Audio stops when the stream is dropped
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioBackend {
    /// Opens the default output device.
    ///
    /// # Errors
    /// - If no output device is available
    pub fn new() -> Result<Self, PlaybackError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| PlaybackError::Unavailable(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl PlaybackBackend for RodioBackend {
    type Handle = RodioHandle;

    fn name(&self) -> &'static str {
        "rodio"
    }

    fn create(&mut self, src: &str) -> Result<RodioHandle, PlaybackError> {
        Ok(RodioHandle {
            output: self.handle.clone(),
            src: src.to_string(),
            path: local_path(src),
            sink: None,
            rate: 1.0,
        })
    }
}

/// Sink state for one source. A stopped or finished source is reloaded from
/// the start on the next play.
pub struct RodioHandle {
    output: OutputStreamHandle,
    src: String,
    path: PathBuf,
    sink: Option<Sink>,
    rate: f32,
}

impl RodioHandle {
    fn load(&self) -> Result<Sink, PlaybackError> {
        let file = File::open(&self.path).map_err(|e| PlaybackError::backend(&self.src, e))?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::backend(&self.src, e))?;
        let sink = Sink::try_new(&self.output).map_err(|e| PlaybackError::backend(&self.src, e))?;
        sink.set_speed(self.rate);
        sink.append(source);
        Ok(sink)
    }
}

impl PlaybackHandle for RodioHandle {
    fn play(&mut self) -> Result<(), PlaybackError> {
        match self.sink.as_ref() {
            Some(sink) if !sink.empty() => sink.play(),
            _ => {
                let sink = self.load()?;
                sink.play();
                self.sink = Some(sink);
            }
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), PlaybackError> {
        validate_rate(rate)?;
        self.rate = rate;
        if let Some(sink) = self.sink.as_ref() {
            sink.set_speed(rate);
        }
        Ok(())
    }
}

//! cpal-backed capture source.
//!
//! The input device is acquired once at startup. Each session builds its own
//! input stream, downmixes to mono i16 and cuts the captured samples into
//! little-endian PCM fragments on every flush.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::artifact::{ArtifactFormat, Chunk};
use super::device::{CaptureDevice, CaptureSource, DeviceState};
use crate::error::RecorderError;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Acquired audio input device.
pub struct CpalSource {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    device_name: String,
}

impl CpalSource {
    /// Acquires the configured input device.
    ///
    /// # Arguments
    /// * `device_spec` - "default", a numeric index, or a device name
    /// * `requested_sample_rate` - Desired rate in Hz; the device's native rate wins
    ///
    /// # Errors
    /// - If the device is not available
    /// - If its default input configuration cannot be queried
    pub fn acquire(device_spec: &str, requested_sample_rate: u32) -> Result<Self> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if device_spec == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, device_spec)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        let config = device.default_input_config()?;

        if config.sample_rate().0 != requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                requested_sample_rate,
                config.sample_rate().0
            );
        }

        tracing::info!(
            "Recording device: {} ({}Hz, {} channels, {:?})",
            device_name,
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        );

        Ok(Self {
            device,
            config,
            device_name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }
}

impl CaptureSource for CpalSource {
    type Device = CpalDevice;

    fn open_session(&mut self) -> Result<CpalDevice, RecorderError> {
        Ok(CpalDevice {
            device: self.device.clone(),
            config: self.config.clone(),
            stream: None,
            pending: Arc::new(Mutex::new(Vec::new())),
            paused: Arc::new(AtomicBool::new(false)),
            state: DeviceState::Inactive,
            stopped: false,
            timeslice: None,
            last_flush: Instant::now(),
            emitted: Vec::new(),
        })
    }

    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::pcm16(self.sample_rate())
    }
}

/// A single recording session on the acquired input.
pub struct CpalDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    /// Active input stream (kept alive while recording or paused)
    stream: Option<cpal::Stream>,
    /// Mono samples captured since the last flush
    pending: Arc<Mutex<Vec<i16>>>,
    paused: Arc<AtomicBool>,
    state: DeviceState,
    stopped: bool,
    timeslice: Option<Duration>,
    last_flush: Instant,
    /// Fragments flushed but not yet drained
    emitted: Vec<Chunk>,
}

impl CpalDevice {
    fn build_stream(&self) -> Result<cpal::Stream, RecorderError> {
        let stream_config: cpal::StreamConfig = self.config.clone().into();
        let channels = self.config.channels() as usize;

        let stream = match self.config.sample_format() {
            cpal::SampleFormat::I16 => self.build_typed_stream::<i16>(&stream_config, channels),
            cpal::SampleFormat::U16 => self.build_typed_stream::<u16>(&stream_config, channels),
            cpal::SampleFormat::F32 => self.build_typed_stream::<f32>(&stream_config, channels),
            other => {
                return Err(RecorderError::Device(format!(
                    "Unsupported sample format: {other:?}"
                )))
            }
        }?;
        Ok(stream)
    }

    fn build_typed_stream<T>(
        &self,
        config: &cpal::StreamConfig,
        channels: usize,
    ) -> Result<cpal::Stream, RecorderError>
    where
        T: SizedSample,
        i16: FromSample<T>,
    {
        let pending = Arc::clone(&self.pending);
        let paused = Arc::clone(&self.paused);

        self.device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if paused.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Ok(mut samples) = pending.lock() {
                        downmix_into(data, channels, &mut samples);
                    }
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| RecorderError::Device(e.to_string()))
    }

    /// Cuts everything captured since the last flush into one fragment.
    fn flush(&mut self) {
        self.last_flush = Instant::now();
        let samples = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => {
                tracing::error!("Capture buffer lock poisoned; dropping pending samples");
                return;
            }
        };
        if samples.is_empty() {
            return;
        }
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        tracing::trace!("Flushed {} samples", samples.len());
        self.emitted.push(Chunk::new(bytes));
    }
}

impl CaptureDevice for CpalDevice {
    fn state(&self) -> DeviceState {
        self.state
    }

    fn start(&mut self, timeslice: Option<Duration>) -> Result<(), RecorderError> {
        if self.stopped {
            return Err(RecorderError::SessionStopped);
        }

        let stream = self.build_stream()?;
        stream
            .play()
            .map_err(|e| RecorderError::Device(e.to_string()))?;

        self.paused.store(false, Ordering::Relaxed);
        self.stream = Some(stream);
        self.timeslice = timeslice;
        self.last_flush = Instant::now();
        self.state = DeviceState::Recording;

        tracing::debug!("Audio stream started");
        Ok(())
    }

    fn pause(&mut self) -> Result<(), RecorderError> {
        self.paused.store(true, Ordering::Relaxed);
        self.state = DeviceState::Paused;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), RecorderError> {
        self.paused.store(false, Ordering::Relaxed);
        self.state = DeviceState::Recording;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        // Dropping the stream ends the callback before the last flush
        self.stream = None;
        self.flush();
        self.state = DeviceState::Inactive;
        self.stopped = true;
        tracing::debug!("Audio stream stopped");
        Ok(())
    }

    fn request_data(&mut self) {
        self.flush();
    }

    fn take_chunks(&mut self) -> Vec<Chunk> {
        if let (DeviceState::Recording, Some(timeslice)) = (self.state, self.timeslice) {
            if self.last_flush.elapsed() >= timeslice {
                self.flush();
            }
        }
        std::mem::take(&mut self.emitted)
    }
}

/// Converts interleaved frames to mono by averaging channels.
fn downmix_into<T>(data: &[T], channels: usize, out: &mut Vec<i16>)
where
    T: Sample,
    i16: FromSample<T>,
{
    if channels <= 1 {
        out.extend(data.iter().map(|&s| i16::from_sample(s)));
        return;
    }
    for frame in data.chunks_exact(channels) {
        let sum: i32 = frame.iter().map(|&s| i16::from_sample(s) as i32).sum();
        out.push((sum / channels as i32) as i16);
    }
}

/// Summary of one input device, for listing.
#[derive(Debug, Clone)]
pub struct InputDeviceInfo {
    pub index: usize,
    pub name: String,
    pub is_default: bool,
    /// (sample rate, channels), if the default configuration could be queried
    pub config: Option<(u32, u16)>,
}

/// Enumerates input devices on the default host.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn input_devices() -> Result<Vec<InputDeviceInfo>> {
    suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            // Devices that cannot report a name are unusable
            .filter_map(|d| d.name().ok().map(|name| (d, name)))
            .enumerate()
            .map(|(index, (device, name))| InputDeviceInfo {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                config: device
                    .default_input_config()
                    .ok()
                    .map(|c| (c.sample_rate().0, c.channels())),
                name,
            })
            .collect();

        Ok(devices)
    })
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let mut devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        let count = devices.len();
        if index < count {
            return Ok(devices.swap_remove(index));
        }
        return Err(anyhow!(
            "Device index {} is out of range (0-{})",
            index,
            count.saturating_sub(1)
        ));
    }

    devices
        .into_iter()
        .find(|d| d.name().map(|n| n == device_spec).unwrap_or(false))
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. Use 'voicenote list-devices' to see available devices."
            )
        })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

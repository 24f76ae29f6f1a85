//! Playback through an external player process.
//!
//! Each source gets its own child process. Pausing suspends the process with
//! SIGSTOP/SIGCONT on Linux; elsewhere a pause ends the process like a stop.
//! A rate change restarts a live process at its estimated media position,
//! since neither player takes a new speed on the command line mid-run.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use super::player::{PlaybackBackend, PlaybackHandle};
use super::{local_path, validate_rate};
use crate::error::PlaybackError;
use crate::locate::find_binary;

/// Supported command-line players, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    Mpv,
    Ffplay,
}

impl PlayerKind {
    const ALL: [PlayerKind; 2] = [PlayerKind::Mpv, PlayerKind::Ffplay];

    pub fn binary_name(&self) -> &'static str {
        match self {
            Self::Mpv => "mpv",
            Self::Ffplay => "ffplay",
        }
    }

    /// Arguments that play `path` once, headless and quiet, at `rate`,
    /// starting `start` into the media.
    pub fn args(&self, path: &str, rate: f32, start: Duration) -> Vec<String> {
        let mut args = match self {
            Self::Mpv => vec![
                "--no-video".to_string(),
                "--really-quiet".to_string(),
                format!("--speed={rate}"),
            ],
            Self::Ffplay => vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
                "-af".to_string(),
                format!("atempo={rate}"),
            ],
        };
        if !start.is_zero() {
            let seconds = format!("{:.3}", start.as_secs_f64());
            match self {
                Self::Mpv => args.push(format!("--start={seconds}")),
                Self::Ffplay => args.extend(["-ss".to_string(), seconds]),
            }
        }
        args.push(path.to_string());
        args
    }
}

/// Backend spawning one player process per source.
pub struct SystemBackend {
    binary: PathBuf,
    kind: PlayerKind,
}

impl SystemBackend {
    pub fn new(binary: PathBuf, kind: PlayerKind) -> Self {
        Self { binary, kind }
    }

    /// Finds the first installed player.
    ///
    /// # Errors
    /// - If neither mpv nor ffplay can be found
    pub fn detect() -> Result<Self, PlaybackError> {
        PlayerKind::ALL
            .iter()
            .find_map(|kind| {
                find_binary(kind.binary_name())
                    .ok()
                    .map(|binary| Self::new(binary, *kind))
            })
            .ok_or_else(|| {
                PlaybackError::Unavailable("no system audio player found; install mpv or ffplay".to_string())
            })
    }

    pub fn kind(&self) -> PlayerKind {
        self.kind
    }
}

impl PlaybackBackend for SystemBackend {
    type Handle = SystemHandle;

    fn name(&self) -> &'static str {
        self.kind.binary_name()
    }

    fn create(&mut self, src: &str) -> Result<SystemHandle, PlaybackError> {
        Ok(SystemHandle {
            binary: self.binary.clone(),
            kind: self.kind,
            src: src.to_string(),
            rate: 1.0,
            child: None,
            suspended: false,
            position: Duration::ZERO,
            running_since: None,
        })
    }
}

/// Player process state for one source.
pub struct SystemHandle {
    binary: PathBuf,
    kind: PlayerKind,
    src: String,
    rate: f32,
    child: Option<Child>,
    suspended: bool,
    /// Media position reached when the process last started or was suspended
    position: Duration,
    /// Set while the process is playing
    running_since: Option<Instant>,
}

impl SystemHandle {
    /// Drops the child if it already exited on its own.
    fn reap(&mut self) {
        let finished = match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(Some(_))),
            None => false,
        };
        if finished {
            self.child = None;
            self.suspended = false;
            self.position = Duration::ZERO;
            self.running_since = None;
        }
    }

    /// Estimated media position at `now`.
    fn media_position(&self, now: Instant) -> Duration {
        let played = self
            .running_since
            .map(|since| now.saturating_duration_since(since).mul_f32(self.rate))
            .unwrap_or(Duration::ZERO);
        self.position + played
    }

    fn spawn(&mut self, start: Duration) -> Result<(), PlaybackError> {
        let path = local_path(&self.src);
        let child = Command::new(&self.binary)
            .args(self.kind.args(&path.to_string_lossy(), self.rate, start))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PlaybackError::backend(&self.src, e))?;
        tracing::debug!("Spawned {} (pid {}) for {}", self.kind.binary_name(), child.id(), self.src);
        self.child = Some(child);
        self.suspended = false;
        self.position = start;
        self.running_since = Some(Instant::now());
        Ok(())
    }

    fn kill(&mut self) {
        // A suspended process must be able to receive the kill
        #[cfg(target_os = "linux")]
        {
            if self.suspended {
                if let Err(e) = self.signal(libc::SIGCONT) {
                    tracing::debug!("Failed to continue player for {}: {}", self.src, e);
                }
            }
        }
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!("Player for {} already gone: {}", self.src, e);
            }
            let _ = child.wait();
        }
        self.suspended = false;
        self.position = Duration::ZERO;
        self.running_since = None;
    }

    #[cfg(target_os = "linux")]
    fn signal(&self, signal: libc::c_int) -> Result<(), PlaybackError> {
        let Some(child) = self.child.as_ref() else {
            return Ok(());
        };
        let pid = child.id() as libc::pid_t;
        if unsafe { libc::kill(pid, signal) } == -1 {
            return Err(PlaybackError::backend(
                &self.src,
                std::io::Error::last_os_error(),
            ));
        }
        Ok(())
    }
}

impl PlaybackHandle for SystemHandle {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.reap();
        match (self.child.is_some(), self.suspended) {
            (false, _) => self.spawn(Duration::ZERO),
            (true, true) => {
                #[cfg(target_os = "linux")]
                self.signal(libc::SIGCONT)?;
                self.suspended = false;
                self.running_since = Some(Instant::now());
                Ok(())
            }
            (true, false) => Ok(()),
        }
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        self.reap();
        if self.child.is_none() || self.suspended {
            return Ok(());
        }

        #[cfg(target_os = "linux")]
        {
            self.signal(libc::SIGSTOP)?;
            self.position = self.media_position(Instant::now());
            self.running_since = None;
            self.suspended = true;
        }

        #[cfg(not(target_os = "linux"))]
        {
            tracing::warn!("Pause not supported by system player here; stopping {}", self.src);
            self.kill();
        }

        Ok(())
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        self.kill();
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), PlaybackError> {
        validate_rate(rate)?;
        self.reap();
        if self.child.is_none() || rate == self.rate {
            self.rate = rate;
            return Ok(());
        }

        let position = self.media_position(Instant::now());
        let was_suspended = self.suspended;
        self.kill();
        self.rate = rate;
        tracing::debug!("Restarting {} at {:?} with rate {}", self.src, position, rate);
        self.spawn(position)?;
        if was_suspended {
            self.pause()?;
        }
        Ok(())
    }
}

impl Drop for SystemHandle {
    fn drop(&mut self) {
        self.kill();
    }
}

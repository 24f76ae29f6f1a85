//! Capture device abstraction.
//!
//! A [`CaptureSource`] is the acquired platform input (the permission grant).
//! It hands out [`CaptureDevice`] sessions, each of which records at most once:
//! after `stop` a session is spent and the handler asks the source for a new one.

use std::fmt;
use std::time::Duration;

use super::artifact::{ArtifactFormat, Chunk};
use crate::error::RecorderError;

/// State of a capture device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Inactive,
    Recording,
    Paused,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Recording => "recording",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recording session on a capture device.
///
/// Fragments produced by the device are queued until [`CaptureDevice::take_chunks`]
/// drains them, in capture order.
pub trait CaptureDevice {
    fn state(&self) -> DeviceState;

    /// Starts capturing. With a `timeslice`, a fragment is emitted each time the
    /// interval elapses; without one, only on `request_data` or `stop`.
    fn start(&mut self, timeslice: Option<Duration>) -> Result<(), RecorderError>;

    fn pause(&mut self) -> Result<(), RecorderError>;

    fn resume(&mut self) -> Result<(), RecorderError>;

    /// Stops capturing and flushes the final fragment. The session cannot be restarted.
    fn stop(&mut self) -> Result<(), RecorderError>;

    /// Forces a flush of everything captured since the last fragment.
    fn request_data(&mut self);

    /// Drains the fragments emitted so far.
    fn take_chunks(&mut self) -> Vec<Chunk>;
}

/// Acquired capture input that can open fresh device sessions.
pub trait CaptureSource {
    type Device: CaptureDevice;

    /// Opens a new session without re-acquiring the input.
    fn open_session(&mut self) -> Result<Self::Device, RecorderError>;

    /// Container format of the fragments this source produces.
    fn format(&self) -> ArtifactFormat;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted capture source for exercising the handler without hardware.

    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Fragments the test pushes; the device emits them on its next flush.
    #[derive(Debug, Default)]
    pub struct Feed {
        pub captured: Vec<Chunk>,
        pub sessions_opened: usize,
        pub last_timeslice: Option<Duration>,
        pub fail_open: bool,
    }

    pub type SharedFeed = Rc<RefCell<Feed>>;

    pub struct ScriptedSource {
        pub feed: SharedFeed,
        pub format: ArtifactFormat,
    }

    impl ScriptedSource {
        pub fn new() -> (Self, SharedFeed) {
            let feed = SharedFeed::default();
            (
                Self {
                    feed: Rc::clone(&feed),
                    format: ArtifactFormat::webm(),
                },
                feed,
            )
        }
    }

    impl CaptureSource for ScriptedSource {
        type Device = ScriptedDevice;

        fn open_session(&mut self) -> Result<ScriptedDevice, RecorderError> {
            let mut feed = self.feed.borrow_mut();
            if feed.fail_open {
                return Err(RecorderError::Device("input unavailable".to_string()));
            }
            feed.sessions_opened += 1;
            Ok(ScriptedDevice {
                id: feed.sessions_opened,
                feed: Rc::clone(&self.feed),
                state: DeviceState::Inactive,
                stopped: false,
                emitted: Vec::new(),
            })
        }

        fn format(&self) -> ArtifactFormat {
            self.format.clone()
        }
    }

    pub struct ScriptedDevice {
        pub id: usize,
        feed: SharedFeed,
        state: DeviceState,
        stopped: bool,
        emitted: Vec<Chunk>,
    }

    impl ScriptedDevice {
        fn flush(&mut self) {
            let captured = std::mem::take(&mut self.feed.borrow_mut().captured);
            self.emitted.extend(captured);
        }
    }

    impl CaptureDevice for ScriptedDevice {
        fn state(&self) -> DeviceState {
            self.state
        }

        fn start(&mut self, timeslice: Option<Duration>) -> Result<(), RecorderError> {
            if self.stopped {
                return Err(RecorderError::SessionStopped);
            }
            self.feed.borrow_mut().last_timeslice = timeslice;
            self.state = DeviceState::Recording;
            Ok(())
        }

        fn pause(&mut self) -> Result<(), RecorderError> {
            self.state = DeviceState::Paused;
            Ok(())
        }

        fn resume(&mut self) -> Result<(), RecorderError> {
            self.state = DeviceState::Recording;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), RecorderError> {
            self.flush();
            self.state = DeviceState::Inactive;
            self.stopped = true;
            Ok(())
        }

        fn request_data(&mut self) {
            self.flush();
        }

        fn take_chunks(&mut self) -> Vec<Chunk> {
            std::mem::take(&mut self.emitted)
        }
    }
}

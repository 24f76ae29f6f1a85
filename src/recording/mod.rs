//! Audio recording for voicenote.
//!
//! Capture devices, the in-memory take, the recording state machine and
//! writing finished takes to disk.

pub mod artifact;
pub mod audio;
pub mod device;
pub mod export;
pub mod handler;
pub mod session;

pub use artifact::{ArtifactFormat, AudioBlob, AudioFile, Chunk};
pub use audio::{input_devices, CpalDevice, CpalSource, InputDeviceInfo};
pub use device::{CaptureDevice, CaptureSource, DeviceState};
pub use export::{export_attachment, playable_extension, write_playable};
pub use handler::{AudioHandler, DEFAULT_PLAYBACK_RATE};
pub use session::Recording;

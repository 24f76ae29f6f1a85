//! Playable message entries.

use std::fmt;
use std::rc::Rc;

use super::player::SharedPlayer;
use crate::error::PlaybackError;

/// A playable source bound to the shared player. Never mutated after creation.
#[derive(Clone)]
pub struct AudioMessage {
    src: String,
    player: SharedPlayer,
}

impl AudioMessage {
    pub fn new(src: impl Into<String>, player: &SharedPlayer) -> Self {
        Self {
            src: src.into(),
            player: Rc::clone(player),
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn play(&self) -> Result<(), PlaybackError> {
        self.player.borrow_mut().play(&self.src)
    }

    pub fn pause(&self) -> Result<(), PlaybackError> {
        self.player.borrow_mut().pause(&self.src)
    }

    pub fn stop(&self) -> Result<(), PlaybackError> {
        self.player.borrow_mut().stop(&self.src)
    }

    pub fn set_playback_rate(&self, rate: f32) -> Result<(), PlaybackError> {
        self.player.borrow_mut().set_playback_rate(&self.src, rate)
    }
}

impl fmt::Debug for AudioMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioMessage").field("src", &self.src).finish()
    }
}

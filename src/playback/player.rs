//! Player capability and per-source memoization.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::PlaybackError;

/// Plays audio sources addressed by their source string.
pub trait AudioPlayer {
    fn play(&mut self, src: &str) -> Result<(), PlaybackError>;

    fn pause(&mut self, src: &str) -> Result<(), PlaybackError>;

    /// Pauses and rewinds to the start.
    fn stop(&mut self, src: &str) -> Result<(), PlaybackError>;

    fn set_playback_rate(&mut self, src: &str, rate: f32) -> Result<(), PlaybackError>;

    /// Stops `src` and drops its player. Sources never played are left alone.
    fn release(&mut self, src: &str) -> Result<(), PlaybackError>;

    /// Name of the backend in use, for logging.
    fn backend_name(&self) -> &'static str;
}

/// Player shared by the handler and every registered message.
pub type SharedPlayer = Rc<RefCell<dyn AudioPlayer>>;

/// Creates the underlying playback object for a source.
pub trait PlaybackBackend {
    type Handle: PlaybackHandle;

    fn name(&self) -> &'static str;

    fn create(&mut self, src: &str) -> Result<Self::Handle, PlaybackError>;
}

/// One playback object bound to a single source.
pub trait PlaybackHandle {
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self) -> Result<(), PlaybackError>;

    fn stop(&mut self) -> Result<(), PlaybackError>;

    fn set_rate(&mut self, rate: f32) -> Result<(), PlaybackError>;
}

/// [`AudioPlayer`] that keeps exactly one backend handle per source.
pub struct PlayerCache<B: PlaybackBackend> {
    backend: B,
    handles: HashMap<String, B::Handle>,
}

impl<B: PlaybackBackend> PlayerCache<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            handles: HashMap::new(),
        }
    }

    fn handle(&mut self, src: &str) -> Result<&mut B::Handle, PlaybackError> {
        if !self.handles.contains_key(src) {
            let handle = self.backend.create(src)?;
            tracing::debug!("Created {} player for {}", self.backend.name(), src);
            self.handles.insert(src.to_string(), handle);
        }
        self.handles
            .get_mut(src)
            .ok_or_else(|| PlaybackError::backend(src, "player handle missing"))
    }

    /// Number of distinct sources with a live handle.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: PlaybackBackend> AudioPlayer for PlayerCache<B> {
    fn play(&mut self, src: &str) -> Result<(), PlaybackError> {
        self.handle(src)?.play()
    }

    fn pause(&mut self, src: &str) -> Result<(), PlaybackError> {
        self.handle(src)?.pause()
    }

    fn stop(&mut self, src: &str) -> Result<(), PlaybackError> {
        self.handle(src)?.stop()
    }

    fn set_playback_rate(&mut self, src: &str, rate: f32) -> Result<(), PlaybackError> {
        self.handle(src)?.set_rate(rate)
    }

    fn release(&mut self, src: &str) -> Result<(), PlaybackError> {
        let Some(mut handle) = self.handles.remove(src) else {
            return Ok(());
        };
        tracing::debug!("Released {} player for {}", self.backend.name(), src);
        handle.stop()
    }

    fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Counting backend that records every call.

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Play(String),
        Pause(String),
        Stop(String),
        Rate(String, f32),
    }

    #[derive(Debug, Default)]
    pub struct Log {
        pub created: Vec<String>,
        pub dropped: Vec<String>,
        pub calls: Vec<Call>,
    }

    impl Log {
        pub fn count(&self, call: &Call) -> usize {
            self.calls.iter().filter(|c| *c == call).count()
        }
    }

    pub type SharedLog = Rc<RefCell<Log>>;

    #[derive(Default)]
    pub struct CountingBackend {
        pub log: SharedLog,
    }

    impl PlaybackBackend for CountingBackend {
        type Handle = CountingHandle;

        fn name(&self) -> &'static str {
            "counting"
        }

        fn create(&mut self, src: &str) -> Result<CountingHandle, PlaybackError> {
            self.log.borrow_mut().created.push(src.to_string());
            Ok(CountingHandle {
                src: src.to_string(),
                log: Rc::clone(&self.log),
            })
        }
    }

    pub struct CountingHandle {
        src: String,
        log: SharedLog,
    }

    impl PlaybackHandle for CountingHandle {
        fn play(&mut self) -> Result<(), PlaybackError> {
            self.log.borrow_mut().calls.push(Call::Play(self.src.clone()));
            Ok(())
        }

        fn pause(&mut self) -> Result<(), PlaybackError> {
            self.log.borrow_mut().calls.push(Call::Pause(self.src.clone()));
            Ok(())
        }

        fn stop(&mut self) -> Result<(), PlaybackError> {
            self.log.borrow_mut().calls.push(Call::Stop(self.src.clone()));
            Ok(())
        }

        fn set_rate(&mut self, rate: f32) -> Result<(), PlaybackError> {
            self.log
                .borrow_mut()
                .calls
                .push(Call::Rate(self.src.clone(), rate));
            Ok(())
        }
    }

    impl Drop for CountingHandle {
        fn drop(&mut self) {
            self.log.borrow_mut().dropped.push(self.src.clone());
        }
    }

    /// Shared counting player plus the log it writes to.
    pub fn counting_player() -> (SharedPlayer, SharedLog) {
        let backend = CountingBackend::default();
        let log = Rc::clone(&backend.log);
        let player: SharedPlayer = Rc::new(RefCell::new(PlayerCache::new(backend)));
        (player, log)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_one_handle_per_source() {
        let backend = CountingBackend::default();
        let log = Rc::clone(&backend.log);
        let mut player = PlayerCache::new(backend);

        player.play("a.webm").unwrap();
        player.play("a.webm").unwrap();
        player.pause("a.webm").unwrap();
        player.stop("a.webm").unwrap();

        assert_eq!(log.borrow().created, vec!["a.webm".to_string()]);
        assert_eq!(log.borrow().count(&Call::Play("a.webm".into())), 2);
        assert_eq!(player.len(), 1);
    }

    #[test]
    fn test_distinct_sources_get_distinct_handles() {
        let backend = CountingBackend::default();
        let log = Rc::clone(&backend.log);
        let mut player = PlayerCache::new(backend);

        player.play("a.webm").unwrap();
        player.set_playback_rate("b.webm", 1.5).unwrap();

        assert_eq!(log.borrow().created.len(), 2);
        assert_eq!(
            log.borrow().calls.last(),
            Some(&Call::Rate("b.webm".into(), 1.5))
        );
        assert_eq!(player.backend_name(), "counting");
    }

    #[test]
    fn test_release_stops_and_forgets_handle() {
        let backend = CountingBackend::default();
        let log = Rc::clone(&backend.log);
        let mut player = PlayerCache::new(backend);

        player.play("a.webm").unwrap();
        player.release("a.webm").unwrap();
        assert!(player.is_empty());
        assert_eq!(log.borrow().count(&Call::Stop("a.webm".into())), 1);
        assert_eq!(log.borrow().dropped, vec!["a.webm".to_string()]);

        // Nothing was created for it, so nothing is created to release it
        player.release("never-played.webm").unwrap();
        assert_eq!(log.borrow().created, vec!["a.webm".to_string()]);
        assert!(player.is_empty());
    }
}

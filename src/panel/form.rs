//! File input the finished take is attached to.

use crate::recording::AudioFile;

type ChangeListener = Box<dyn FnMut(&str, &[AudioFile])>;

/// Named file input with change subscribers, standing in for `<input type="file">`.
pub struct FormInput {
    name: String,
    files: Vec<AudioFile>,
    listeners: Vec<ChangeListener>,
}

impl FormInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the input's file list. Listeners are not notified until
    /// [`FormInput::dispatch_change`].
    pub fn set_files(&mut self, files: Vec<AudioFile>) {
        self.files = files;
    }

    pub fn files(&self) -> &[AudioFile] {
        &self.files
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Subscribes to change events. The listener receives the input name and its files.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&str, &[AudioFile]) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn dispatch_change(&mut self) {
        tracing::debug!(
            "Change on #{}: {} file(s) attached",
            self.name,
            self.files.len()
        );
        for listener in self.listeners.iter_mut() {
            listener(&self.name, &self.files);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::AudioBlob;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_change_reaches_subscribers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut input = FormInput::new("messageMedia");
        let sink = Rc::clone(&seen);
        input.subscribe(move |name, files| {
            sink.borrow_mut()
                .push((name.to_string(), files.iter().map(|f| f.name().to_string()).collect::<Vec<_>>()));
        });

        let file = AudioFile::new("recording-1.webm", AudioBlob::from_chunks(&[], "audio/webm"));
        input.set_files(vec![file]);
        assert!(seen.borrow().is_empty());

        input.dispatch_change();
        assert_eq!(
            *seen.borrow(),
            vec![("messageMedia".to_string(), vec!["recording-1.webm".to_string()])]
        );
    }
}

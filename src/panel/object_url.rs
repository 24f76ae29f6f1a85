//! Object URLs for in-memory blobs.
//!
//! Players need something they can open, so each URL is backed by a file in a
//! scratch directory. Revoking a URL deletes its file; dropping the registry
//! revokes whatever is still outstanding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::recording::{playable_extension, write_playable, AudioBlob};

pub struct ObjectUrls {
    dir: PathBuf,
    urls: HashMap<String, PathBuf>,
    next_id: u64,
}

impl ObjectUrls {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            urls: HashMap::new(),
            next_id: 0,
        }
    }

    /// Writes `blob` to a scratch file and returns its `file://` URL.
    ///
    /// # Errors
    /// - If the scratch directory or file cannot be written
    pub fn create(&mut self, blob: &AudioBlob) -> anyhow::Result<String> {
        std::fs::create_dir_all(&self.dir)?;
        self.next_id += 1;
        let path = self.dir.join(format!(
            "voicenote-{}-{}.{}",
            std::process::id(),
            self.next_id,
            playable_extension(blob)
        ));
        write_playable(blob, &path)?;

        let url = format!("file://{}", path.display());
        tracing::debug!("Created object URL {} ({} bytes)", url, blob.size());
        self.urls.insert(url.clone(), path);
        Ok(url)
    }

    /// Releases `url`. Unknown URLs are ignored.
    pub fn revoke(&mut self, url: &str) {
        if let Some(path) = self.urls.remove(url) {
            remove_quietly(&path);
            tracing::debug!("Revoked object URL {}", url);
        }
    }

    pub fn revoke_all(&mut self) {
        for (_, path) in self.urls.drain() {
            remove_quietly(&path);
        }
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.urls.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl Drop for ObjectUrls {
    fn drop(&mut self) {
        self.revoke_all();
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::debug!("Failed to remove {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::local_path;
    use crate::recording::Chunk;

    fn blob() -> AudioBlob {
        AudioBlob::from_chunks(&[Chunk::from(&b"data"[..])], "audio/webm")
    }

    #[test]
    fn test_create_and_revoke() {
        let dir = tempfile::tempdir().unwrap();
        let mut urls = ObjectUrls::new(dir.path());

        let url = urls.create(&blob()).unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with(".webm"));
        let path = local_path(&url);
        assert_eq!(std::fs::read(&path).unwrap(), b"data");

        urls.revoke(&url);
        assert!(!path.exists());
        assert!(urls.is_empty());
        urls.revoke(&url);
    }

    #[test]
    fn test_drop_revokes_outstanding_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let mut urls = ObjectUrls::new(dir.path());
            let url = urls.create(&blob()).unwrap();
            local_path(&url)
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_urls_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let mut urls = ObjectUrls::new(dir.path());
        let a = urls.create(&blob()).unwrap();
        let b = urls.create(&blob()).unwrap();
        assert_ne!(a, b);
        assert_eq!(urls.len(), 2);
    }
}

//! In-memory buffer for the take currently being captured.

use super::artifact::{ArtifactFormat, AudioBlob, AudioFile, Chunk};

/// Accumulates captured chunks and materializes them on demand.
///
/// Chunks are append-only while a take is in progress and are cleared as a
/// whole on stop or reset. Artifacts are rebuilt from the chunk list every
/// time they are requested.
#[derive(Debug, Default)]
pub struct Recording {
    chunks: Vec<Chunk>,
    format: ArtifactFormat,
}

impl Recording {
    pub fn new(format: ArtifactFormat) -> Self {
        Self {
            chunks: Vec::new(),
            format,
        }
    }

    /// Appends one fragment. Empty fragments carry no audio and are dropped.
    pub fn add_chunk(&mut self, chunk: Chunk) {
        if chunk.is_empty() {
            return;
        }
        self.chunks.push(chunk);
    }

    /// Builds a preview blob of everything captured so far.
    ///
    /// The chunk list is left intact so capture can continue afterwards.
    pub fn pause(&self) -> AudioBlob {
        AudioBlob::from_chunks(&self.chunks, &self.format.mime_type)
    }

    /// Builds the final file for this take and clears the chunk list.
    pub fn stop(&mut self) -> AudioFile {
        let blob = AudioBlob::from_chunks(&self.chunks, &self.format.mime_type);
        self.chunks.clear();
        tracing::debug!("Recording materialized: {} bytes", blob.size());
        AudioFile::timestamped(blob, &self.format)
    }

    pub fn reset(&mut self) {
        self.chunks.clear();
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total number of buffered bytes.
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }

    pub fn format(&self) -> &ArtifactFormat {
        &self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(bytes: &[u8]) -> Chunk {
        Chunk::from(bytes)
    }

    #[test]
    fn test_stop_concatenates_and_clears() {
        let mut recording = Recording::new(ArtifactFormat::webm());
        recording.add_chunk(chunk(b"one"));
        recording.add_chunk(chunk(b"two"));
        recording.add_chunk(chunk(b"three"));

        let file = recording.stop();
        assert_eq!(file.blob().data(), b"onetwothree");
        assert_eq!(file.mime_type(), "audio/webm");
        assert!(recording.is_empty());
    }

    #[test]
    fn test_pause_keeps_chunks() {
        let mut recording = Recording::new(ArtifactFormat::webm());
        recording.add_chunk(chunk(b"before"));

        let preview = recording.pause();
        assert_eq!(preview.data(), b"before");
        assert_eq!(recording.chunks().len(), 1);

        recording.add_chunk(chunk(b"after"));
        let file = recording.stop();
        assert_eq!(file.blob().data(), b"beforeafter");
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut recording = Recording::new(ArtifactFormat::webm());
        recording.add_chunk(chunk(b"x"));
        recording.reset();
        assert!(recording.is_empty());
        assert!(recording.stop().blob().is_empty());
    }

    #[test]
    fn test_empty_chunks_are_ignored() {
        let mut recording = Recording::new(ArtifactFormat::webm());
        recording.add_chunk(Chunk::default());
        assert!(recording.is_empty());
        assert_eq!(recording.byte_len(), 0);
    }
}

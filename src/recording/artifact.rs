//! Materialized recordings.
//!
//! An artifact is derived data: a typed blob built from the chunks captured so
//! far, plus a file wrapper carrying the name it is attached or saved under.

use chrono::{DateTime, Local};

/// Container type of a recording, as declared by the capture source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFormat {
    /// MIME type stamped on every blob and file
    pub mime_type: String,
    /// File extension used for generated file names (without the dot)
    pub extension: String,
}

impl ArtifactFormat {
    pub fn new(mime_type: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            extension: extension.into(),
        }
    }

    /// WebM audio, the container browsers record into.
    pub fn webm() -> Self {
        Self::new("audio/webm", "webm")
    }

    /// Raw signed 16-bit little-endian mono PCM at the given rate.
    pub fn pcm16(sample_rate: u32) -> Self {
        Self::new(format!("audio/L16;rate={sample_rate};channels=1"), "pcm")
    }

    /// Returns the sample rate if this is a raw PCM format.
    pub fn pcm_sample_rate(&self) -> Option<u32> {
        let params = self.mime_type.strip_prefix("audio/L16")?;
        params
            .split(';')
            .filter_map(|p| p.trim().strip_prefix("rate="))
            .find_map(|rate| rate.parse().ok())
    }
}

impl Default for ArtifactFormat {
    fn default() -> Self {
        Self::webm()
    }
}

/// One opaque fragment delivered by the capture device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk(Vec<u8>);

impl Chunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}

impl From<&[u8]> for Chunk {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

/// Typed binary blob built from a sequence of chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    data: Vec<u8>,
    mime_type: String,
}

impl AudioBlob {
    /// Concatenates `chunks` in order into a single blob.
    pub fn from_chunks(chunks: &[Chunk], mime_type: &str) -> Self {
        let size = chunks.iter().map(Chunk::len).sum();
        let mut data = Vec::with_capacity(size);
        for chunk in chunks {
            data.extend_from_slice(chunk.as_bytes());
        }
        Self {
            data,
            mime_type: mime_type.to_string(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Named file wrapping a blob, ready to be attached to a form input.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFile {
    name: String,
    blob: AudioBlob,
    last_modified: DateTime<Local>,
}

impl AudioFile {
    pub fn new(name: impl Into<String>, blob: AudioBlob) -> Self {
        Self {
            name: name.into(),
            blob,
            last_modified: Local::now(),
        }
    }

    /// Builds the file for a final take, named `recording-<unix millis>.<ext>`.
    pub fn timestamped(blob: AudioBlob, format: &ArtifactFormat) -> Self {
        let now = Local::now();
        Self {
            name: format!("recording-{}.{}", now.timestamp_millis(), format.extension),
            blob,
            last_modified: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blob(&self) -> &AudioBlob {
        &self.blob
    }

    pub fn mime_type(&self) -> &str {
        self.blob.mime_type()
    }

    pub fn last_modified(&self) -> DateTime<Local> {
        self.last_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_concatenates_chunks_in_order() {
        let chunks = vec![Chunk::from(&b"ab"[..]), Chunk::from(&b"cd"[..])];
        let blob = AudioBlob::from_chunks(&chunks, "audio/webm");
        assert_eq!(blob.data(), b"abcd");
        assert_eq!(blob.mime_type(), "audio/webm");
        assert_eq!(blob.size(), 4);
    }

    #[test]
    fn test_empty_chunk_list_gives_empty_blob() {
        let blob = AudioBlob::from_chunks(&[], "audio/webm");
        assert!(blob.is_empty());
    }

    #[test]
    fn test_timestamped_file_name() {
        let blob = AudioBlob::from_chunks(&[], "audio/webm");
        let file = AudioFile::timestamped(blob, &ArtifactFormat::webm());
        let name = file.name();
        assert!(name.starts_with("recording-"));
        assert!(name.ends_with(".webm"));
        let stamp = &name["recording-".len()..name.len() - ".webm".len()];
        assert!(stamp.parse::<i64>().is_ok(), "timestamp was {stamp}");
    }

    #[test]
    fn test_pcm_format_carries_sample_rate() {
        let format = ArtifactFormat::pcm16(48000);
        assert_eq!(format.pcm_sample_rate(), Some(48000));
        assert_eq!(format.extension, "pcm");
        assert_eq!(ArtifactFormat::webm().pcm_sample_rate(), None);
    }
}

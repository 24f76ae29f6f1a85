//! Writes artifacts to disk.
//!
//! Raw PCM takes are wrapped in a WAV header so any player can open them and,
//! when a different output format is configured, converted with ffmpeg.
//! Takes already in a container format are written byte for byte.

use anyhow::{anyhow, Result};
use hound::WavWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::artifact::{ArtifactFormat, AudioBlob, AudioFile};
use crate::locate::find_ffmpeg;

/// File extension a blob is written with by [`write_playable`].
pub fn playable_extension(blob: &AudioBlob) -> &'static str {
    let mime = blob.mime_type();
    if mime.starts_with("audio/L16") {
        return "wav";
    }
    match mime.split(';').next().unwrap_or_default().trim() {
        "audio/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        "audio/flac" => "flac",
        _ => "bin",
    }
}

/// Writes `blob` to `path` in a form audio players understand.
///
/// # Errors
/// - If the file cannot be created or written
pub fn write_playable(blob: &AudioBlob, path: &Path) -> Result<()> {
    let pcm_rate = ArtifactFormat::new(blob.mime_type(), "").pcm_sample_rate();
    match pcm_rate {
        Some(sample_rate) => write_wav(blob.data(), sample_rate, path),
        None => {
            std::fs::write(path, blob.data())?;
            Ok(())
        }
    }
}

/// Saves an attached take into `dir` and returns the written path.
///
/// # Arguments
/// * `file` - The take attached to the form input
/// * `dir` - Destination directory (created if missing)
/// * `output_format` - ffmpeg codec and options, e.g. "wav" or "libopus -b:a 24k";
///   only applied to raw PCM takes
///
/// # Errors
/// - If the directory or file cannot be written
/// - If ffmpeg is required but missing or fails
pub fn export_attachment(file: &AudioFile, dir: &Path, output_format: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let stem = Path::new(file.name())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recording")
        .to_string();

    let blob = file.blob();
    let is_pcm = blob.mime_type().starts_with("audio/L16");
    let codec = output_format.split_whitespace().next().unwrap_or("wav");

    if !is_pcm {
        let path = dir.join(file.name());
        std::fs::write(&path, blob.data())?;
        tracing::info!("Attachment saved: {} ({} bytes)", path.display(), blob.size());
        return Ok(path);
    }

    let wav_path = dir.join(format!("{stem}.wav"));
    write_playable(blob, &wav_path)?;

    if matches!(codec, "wav" | "pcm_s16le") {
        tracing::info!("Attachment saved: {}", wav_path.display());
        return Ok(wav_path);
    }

    let output_path = dir.join(format!("{stem}.{}", codec_extension(codec)));
    let converted = convert_with_ffmpeg(&wav_path, &output_path, output_format);

    if let Err(e) = std::fs::remove_file(&wav_path) {
        tracing::debug!("Failed to remove intermediate WAV: {}", e);
    }
    converted?;

    tracing::info!(
        "Attachment saved: {} (format: {})",
        output_path.display(),
        output_format
    );
    Ok(output_path)
}

/// Maps an ffmpeg codec name to the extension of its usual container.
fn codec_extension(codec: &str) -> &str {
    match codec {
        "libopus" | "libvorbis" => "ogg",
        "aac" => "m4a",
        "pcm_s16le" => "wav",
        "libmp3lame" => "mp3",
        other => other,
    }
}

fn write_wav(pcm: &[u8], sample_rate: u32, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in pcm.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([sample[0], sample[1]]))?;
    }
    writer.finalize()?;

    tracing::debug!("WAV written: {}", path.display());
    Ok(())
}

/// Converts a WAV file with ffmpeg. `format` is "codec [options]"; output is forced mono.
fn convert_with_ffmpeg(input_wav: &Path, output_path: &Path, format: &str) -> Result<()> {
    let mut parts = format.split_whitespace();
    let codec = parts
        .next()
        .ok_or_else(|| anyhow!("Invalid format string: empty"))?;

    let ffmpeg_path = find_ffmpeg()?;

    let output = Command::new(&ffmpeg_path)
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input_wav)
        .arg("-acodec")
        .arg(codec)
        .arg("-ac")
        .arg("1")
        .arg("-y")
        .args(parts)
        .arg(output_path)
        .output()?;

    if output.status.success() {
        tracing::debug!("Audio converted to {} format", codec);
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&output.stderr);
        tracing::error!("ffmpeg conversion failed: {}", error_msg);
        Err(anyhow!("Audio encoding failed: {error_msg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::artifact::Chunk;

    fn pcm_blob(samples: &[i16], rate: u32) -> AudioBlob {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        AudioBlob::from_chunks(&[Chunk::new(bytes)], &ArtifactFormat::pcm16(rate).mime_type)
    }

    #[test]
    fn test_pcm_blob_is_written_as_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        write_playable(&pcm_blob(&[1, -1, 300], 16000), &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, -1, 300]);
    }

    #[test]
    fn test_container_blob_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.webm");
        let blob = AudioBlob::from_chunks(&[Chunk::from(&b"webm-bytes"[..])], "audio/webm");
        write_playable(&blob, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"webm-bytes");
        assert_eq!(playable_extension(&blob), "webm");
    }

    #[test]
    fn test_export_pcm_as_wav() {
        let dir = tempfile::tempdir().unwrap();
        let file = AudioFile::new("recording-42.pcm", pcm_blob(&[5, 6], 8000));
        let path = export_attachment(&file, dir.path(), "wav").unwrap();
        assert_eq!(path, dir.path().join("recording-42.wav"));
        assert!(path.exists());
    }

    #[test]
    fn test_export_container_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let blob = AudioBlob::from_chunks(&[Chunk::from(&b"abc"[..])], "audio/webm");
        let file = AudioFile::new("recording-7.webm", blob);
        let path = export_attachment(&file, dir.path(), "libopus").unwrap();
        assert_eq!(path, dir.path().join("recording-7.webm"));
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }

    #[test]
    fn test_codec_extension() {
        assert_eq!(codec_extension("libopus"), "ogg");
        assert_eq!(codec_extension("flac"), "flac");
        assert_eq!(codec_extension("aac"), "m4a");
    }
}

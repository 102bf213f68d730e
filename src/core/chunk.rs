//! Fixed-length chunking of WAV audio.
//!
//! Splitting happens in-process with `hound` since every working file is
//! already WAV. A trailing window shorter than the chunk length is dropped.

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// Fresh token grouping the chunks of one split call
pub fn new_batch_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// File name of chunk `index` in `batch`
pub fn chunk_file_name(name: &str, batch: &str, index: usize) -> String {
    format!("{}_{}_{:03}.wav", name, batch, index)
}

fn wav_error(path: &Path) -> impl FnOnce(hound::Error) -> PipelineError + '_ {
    move |source| PipelineError::Wav {
        path: path.to_path_buf(),
        source,
    }
}

/// Duration of a WAV file in milliseconds
pub fn wav_duration_ms(path: &Path) -> Result<u64> {
    let reader = WavReader::open(path).map_err(wav_error(path))?;
    let spec = reader.spec();
    Ok(reader.duration() as u64 * 1000 / spec.sample_rate.max(1) as u64)
}

/// Split `source` into `chunk_seconds`-long files under `dest_dir`.
///
/// Returns the chunk paths in index order. Each call draws its own batch
/// token.
pub fn split_wav(source: &Path, dest_dir: &Path, name: &str, chunk_seconds: u32) -> Result<Vec<PathBuf>> {
    split_wav_with_batch(source, dest_dir, name, chunk_seconds, &new_batch_id())
}

/// [`split_wav`] with a caller-chosen batch token
pub fn split_wav_with_batch(
    source: &Path,
    dest_dir: &Path,
    name: &str,
    chunk_seconds: u32,
    batch: &str,
) -> Result<Vec<PathBuf>> {
    if chunk_seconds == 0 {
        return Err(PipelineError::Precondition(
            "chunk length must be at least one second".to_string(),
        ));
    }

    let mut reader = WavReader::open(source).map_err(wav_error(source))?;
    let spec = reader.spec();

    let window_frames = spec.sample_rate as u64 * chunk_seconds as u64;
    let total_frames = reader.duration() as u64;
    let chunk_count = (total_frames / window_frames) as usize;
    let window_samples = (window_frames * spec.channels as u64) as usize;

    debug!(
        source = %source.display(),
        total_frames,
        window_frames,
        chunk_count,
        "Splitting into chunks"
    );

    std::fs::create_dir_all(dest_dir)?;

    let mut chunks = Vec::with_capacity(chunk_count);
    for index in 0..chunk_count {
        let path = dest_dir.join(chunk_file_name(name, batch, index));
        match spec.sample_format {
            SampleFormat::Float => {
                let samples = reader.samples::<f32>().take(window_samples);
                write_window(&path, spec, samples, source)?;
            }
            SampleFormat::Int => {
                let samples = reader.samples::<i32>().take(window_samples);
                write_window(&path, spec, samples, source)?;
            }
        }
        chunks.push(path);
    }

    Ok(chunks)
}

fn write_window<S, I>(path: &Path, spec: WavSpec, samples: I, source: &Path) -> Result<()>
where
    S: hound::Sample,
    I: Iterator<Item = hound::Result<S>>,
{
    let mut writer = WavWriter::create(path, spec).map_err(wav_error(path))?;
    for sample in samples {
        let sample = sample.map_err(wav_error(source))?;
        writer.write_sample(sample).map_err(wav_error(path))?;
    }
    writer.finalize().map_err(wav_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tone(path: &Path, seconds: u32, sample_rate: u32, channels: u16) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..(seconds * sample_rate) {
            for _ in 0..channels {
                writer.write_sample((i % 100) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_split_discards_remainder() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("clip.wav");
        write_tone(&source, 25, 1000, 1);

        let chunks = split_wav_with_batch(&source, &temp.path().join("out"), "clip", 8, "abcd1234").unwrap();

        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(
                chunk.file_name().unwrap().to_string_lossy(),
                format!("clip_abcd1234_{:03}.wav", i)
            );
            assert_eq!(wav_duration_ms(chunk).unwrap(), 8000);
        }
    }

    #[test]
    fn test_split_preserves_sample_content_and_channels() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("stereo.wav");
        write_tone(&source, 4, 500, 2);

        let chunks = split_wav_with_batch(&source, temp.path(), "stereo", 2, "b").unwrap();
        assert_eq!(chunks.len(), 2);

        let mut second = WavReader::open(&chunks[1]).unwrap();
        assert_eq!(second.spec().channels, 2);
        let first_sample: i16 = second.samples::<i16>().next().unwrap().unwrap();
        // Second window starts at frame 1000
        assert_eq!(first_sample, (1000 % 100) as i16);
    }

    #[test]
    fn test_short_clip_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("short.wav");
        write_tone(&source, 3, 1000, 1);

        let chunks = split_wav(&source, temp.path(), "short", 8).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_batches_differ_between_calls() {
        assert_ne!(new_batch_id(), new_batch_id());
        assert_eq!(new_batch_id().len(), 8);
    }

    #[test]
    fn test_zero_chunk_length_rejected() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("clip.wav");
        write_tone(&source, 1, 1000, 1);

        assert!(matches!(
            split_wav(&source, temp.path(), "clip", 0),
            Err(PipelineError::Precondition(_))
        ));
    }
}

//! Shared fixtures: synthetic WAV files and in-process fakes for the
//! external audio tools.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};

use clipforge::adapters::{AudioTransform, ExportFormat, Separator};
use clipforge::error::{PipelineError, Result};

/// Low sample rate keeps fixtures small
pub const TEST_RATE: u32 = 1000;

/// Write a mono 16-bit WAV of `seconds` length
pub fn write_wav(path: &Path, seconds: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let spec = WavSpec {
        channels: 1,
        sample_rate: TEST_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for i in 0..(seconds * TEST_RATE) {
        writer.write_sample((i % 64) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Write a sidecar file next to nothing in particular
pub fn write_text(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Transform that copies its input, optionally failing for one name
#[derive(Default)]
pub struct CopyTransform {
    pub conversions: AtomicUsize,
    pub extractions: AtomicUsize,
    pub exports: AtomicUsize,

    /// Fail `remove_silence` when the source stem contains this
    pub fail_on: Option<String>,

    /// Write garbage instead of WAV data on conversion
    pub corrupt_conversion: bool,
}

impl CopyTransform {
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

async fn copy(source: &Path, dest: &Path) -> Result<()> {
    tokio::fs::copy(source, dest).await?;
    Ok(())
}

#[async_trait]
impl AudioTransform for CopyTransform {
    fn name(&self) -> &str {
        "copy"
    }

    async fn convert_to_wav(&self, source: &Path, dest: &Path) -> Result<()> {
        self.conversions.fetch_add(1, Ordering::SeqCst);
        if self.corrupt_conversion {
            tokio::fs::write(dest, b"not audio").await?;
            return Ok(());
        }
        copy(source, dest).await
    }

    async fn extract(&self, source: &Path, dest: &Path, _start_ms: u64, _end_ms: u64) -> Result<()> {
        self.extractions.fetch_add(1, Ordering::SeqCst);
        copy(source, dest).await
    }

    async fn remove_silence(&self, source: &Path, dest: &Path) -> Result<()> {
        if let Some(ref name) = self.fail_on {
            let stem = source.file_stem().unwrap_or_default().to_string_lossy();
            if stem.contains(name.as_str()) {
                return Err(PipelineError::ExternalTool {
                    tool: "ffmpeg".to_string(),
                    exit_code: 1,
                    stderr: format!("cannot process {}", stem),
                });
            }
        }
        copy(source, dest).await
    }

    async fn compress(&self, source: &Path, dest: &Path) -> Result<()> {
        copy(source, dest).await
    }

    async fn normalize(&self, source: &Path, dest: &Path) -> Result<()> {
        copy(source, dest).await
    }

    async fn to_mono(&self, source: &Path, dest: &Path) -> Result<()> {
        copy(source, dest).await
    }

    async fn export(&self, source: &Path, dest: &Path, _format: ExportFormat) -> Result<()> {
        self.exports.fetch_add(1, Ordering::SeqCst);
        copy(source, dest).await
    }
}

/// Separator mimicking demucs' nested output layout
pub struct FakeSeparator {
    pub model: String,
}

impl Default for FakeSeparator {
    fn default() -> Self {
        Self {
            model: "htdemucs".to_string(),
        }
    }
}

#[async_trait]
impl Separator for FakeSeparator {
    fn name(&self) -> &str {
        "fake-demucs"
    }

    async fn separate(&self, source: &Path, out_dir: &Path) -> Result<PathBuf> {
        let stem = source.file_stem().unwrap_or_default().to_string_lossy().into_owned();
        let dir = out_dir.join(&self.model).join(&stem);
        tokio::fs::create_dir_all(&dir).await?;
        let vocals = dir.join("vocals.wav");
        tokio::fs::copy(source, &vocals).await?;
        tokio::fs::copy(source, dir.join("no_vocals.wav")).await?;
        Ok(vocals)
    }
}

/// Names of the files directly inside `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

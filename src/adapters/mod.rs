//! Adapter interfaces for external audio tools.
//!
//! The pipeline never touches DSP itself. Format conversion, silence
//! removal, compression, loudness normalization, channel mixing and export
//! go through [`AudioTransform`]; vocal isolation goes through
//! [`Separator`]. The default implementations shell out to ffmpeg,
//! ffmpeg-normalize and demucs.

pub mod demucs;
pub mod ffmpeg;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::error::{PipelineError, Result};

pub use demucs::{DemucsSeparator, Device};
pub use ffmpeg::FfmpegTransform;

/// Sample format every exported clip is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFormat {
    /// Samples per second
    pub sample_rate: u32,

    /// Bytes per sample (1, 2, 3 or 4)
    pub sample_width: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            sample_width: 2,
        }
    }
}

/// Audio operations delegated to an external toolkit.
///
/// Every method reads `source` and writes a new file at `dest`; sources are
/// never modified in place.
#[async_trait]
pub trait AudioTransform: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Decode any media file into the WAV working container
    async fn convert_to_wav(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Copy `[start_ms, end_ms)` of `source` into `dest`
    async fn extract(&self, source: &Path, dest: &Path, start_ms: u64, end_ms: u64) -> Result<()>;

    /// Drop intervals quieter than the configured threshold, keeping the
    /// remaining audio in order
    async fn remove_silence(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Dynamic-range compression
    async fn compress(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Loudness normalization preserving the relative loudness range
    async fn normalize(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Mix down to a single channel
    async fn to_mono(&self, source: &Path, dest: &Path) -> Result<()>;

    /// Write `source` to `dest` with a fixed sample rate and width
    async fn export(&self, source: &Path, dest: &Path, format: ExportFormat) -> Result<()>;
}

/// Vocal isolation tool
#[async_trait]
pub trait Separator: Send + Sync {
    /// Human-readable tool name
    fn name(&self) -> &str;

    /// Separate `source` (a WAV file) under `out_dir`, returning the path of
    /// the vocals-only artifact
    async fn separate(&self, source: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// Run an external tool to completion.
///
/// A spawn failure or non-zero exit becomes [`PipelineError::ExternalTool`]
/// carrying the tool's stderr.
pub async fn run_tool<I, S>(binary: &str, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    debug!(tool = %binary, ?args, "Running external tool");

    let output = Command::new(binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| PipelineError::spawn(binary, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PipelineError::ExternalTool {
            tool: binary.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_external_error() {
        let err = run_tool("clipforge-no-such-tool", ["--help"]).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ExternalTool { exit_code: -1, .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_external_error() {
        let err = run_tool("sh", ["-c", "echo broken >&2; exit 3"])
            .await
            .unwrap_err();

        match err {
            PipelineError::ExternalTool {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_export_format() {
        let format = ExportFormat::default();
        assert_eq!(format.sample_rate, 44_100);
        assert_eq!(format.sample_width, 2);
    }
}

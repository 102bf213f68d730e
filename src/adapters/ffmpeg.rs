//! ffmpeg-backed audio transforms.
//!
//! Every operation is a single `ffmpeg -y -i <source> ... <dest>` call,
//! except loudness normalization which goes through `ffmpeg-normalize`.

use std::ffi::OsString;
use std::path::Path;

use async_trait::async_trait;

use super::{run_tool, AudioTransform, ExportFormat};
use crate::error::Result;

/// Audio transforms implemented with the ffmpeg CLI
#[derive(Debug, Clone)]
pub struct FfmpegTransform {
    /// ffmpeg binary (default: "ffmpeg")
    ffmpeg: String,

    /// Loudness normalizer binary (default: "ffmpeg-normalize")
    normalizer: String,

    /// Level below which audio counts as silence, in dBFS
    silence_threshold_db: f64,

    /// Shortest silence worth removing
    min_silence_ms: u64,
}

impl Default for FfmpegTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegTransform {
    pub fn new() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            normalizer: "ffmpeg-normalize".to_string(),
            silence_threshold_db: -50.0,
            min_silence_ms: 1000,
        }
    }

    /// Use custom binaries
    pub fn with_binaries(ffmpeg: impl Into<String>, normalizer: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            normalizer: normalizer.into(),
            ..Self::new()
        }
    }

    /// Override silence detection parameters
    pub fn with_silence(mut self, threshold_db: f64, min_silence_ms: u64) -> Self {
        self.silence_threshold_db = threshold_db;
        self.min_silence_ms = min_silence_ms;
        self
    }

    /// `-y -i <source> <middle...> <dest>`
    fn ffmpeg_args(source: &Path, middle: &[&str], dest: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), source.into()];
        args.extend(middle.iter().map(OsString::from));
        args.push(dest.into());
        args
    }

    async fn ffmpeg(&self, source: &Path, middle: &[&str], dest: &Path) -> Result<()> {
        run_tool(&self.ffmpeg, Self::ffmpeg_args(source, middle, dest)).await
    }

    /// `silenceremove` filter dropping every silent stretch, not just the edges
    fn silence_filter(&self) -> String {
        format!(
            "silenceremove=stop_periods=-1:stop_duration={:.3}:stop_threshold={}dB",
            self.min_silence_ms as f64 / 1000.0,
            self.silence_threshold_db
        )
    }
}

/// Seconds with millisecond precision, as ffmpeg expects for `-ss`/`-to`
pub fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// PCM codec for a sample width in bytes
pub fn pcm_codec(sample_width: u16) -> &'static str {
    match sample_width {
        1 => "pcm_u8",
        3 => "pcm_s24le",
        4 => "pcm_s32le",
        _ => "pcm_s16le",
    }
}

#[async_trait]
impl AudioTransform for FfmpegTransform {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert_to_wav(&self, source: &Path, dest: &Path) -> Result<()> {
        self.ffmpeg(source, &["-vn"], dest).await
    }

    async fn extract(&self, source: &Path, dest: &Path, start_ms: u64, end_ms: u64) -> Result<()> {
        let start = format_seconds(start_ms);
        let end = format_seconds(end_ms);
        self.ffmpeg(source, &["-ss", &start, "-to", &end, "-c", "copy"], dest)
            .await
    }

    async fn remove_silence(&self, source: &Path, dest: &Path) -> Result<()> {
        let filter = self.silence_filter();
        self.ffmpeg(source, &["-af", &filter], dest).await
    }

    async fn compress(&self, source: &Path, dest: &Path) -> Result<()> {
        self.ffmpeg(
            source,
            &["-af", "acompressor=threshold=-20dB:ratio=4:attack=5:release=50"],
            dest,
        )
        .await
    }

    async fn normalize(&self, source: &Path, dest: &Path) -> Result<()> {
        let args: Vec<OsString> = vec![
            source.into(),
            "-o".into(),
            dest.into(),
            "-f".into(),
            "--keep-loudness-range-target".into(),
            "-c:a".into(),
            "pcm_s16le".into(),
        ];
        run_tool(&self.normalizer, args).await
    }

    async fn to_mono(&self, source: &Path, dest: &Path) -> Result<()> {
        self.ffmpeg(source, &["-ac", "1"], dest).await
    }

    async fn export(&self, source: &Path, dest: &Path, format: ExportFormat) -> Result<()> {
        let rate = format.sample_rate.to_string();
        self.ffmpeg(
            source,
            &["-ar", &rate, "-c:a", pcm_codec(format.sample_width)],
            dest,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0), "0.000");
        assert_eq!(format_seconds(90_500), "90.500");
        assert_eq!(format_seconds(3_723_004), "3723.004");
    }

    #[test]
    fn test_pcm_codec_by_width() {
        assert_eq!(pcm_codec(1), "pcm_u8");
        assert_eq!(pcm_codec(2), "pcm_s16le");
        assert_eq!(pcm_codec(3), "pcm_s24le");
        assert_eq!(pcm_codec(4), "pcm_s32le");
    }

    #[test]
    fn test_ffmpeg_args_layout() {
        let args = FfmpegTransform::ffmpeg_args(
            Path::new("in.mp4"),
            &["-ac", "1"],
            Path::new("out.wav"),
        );
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["-y", "-i", "in.mp4", "-ac", "1", "out.wav"]);
    }

    #[test]
    fn test_silence_filter_uses_settings() {
        let transform = FfmpegTransform::new().with_silence(-40.0, 500);
        assert_eq!(
            transform.silence_filter(),
            "silenceremove=stop_periods=-1:stop_duration=0.500:stop_threshold=-40dB"
        );
    }

    #[test]
    fn test_custom_binaries() {
        let transform = FfmpegTransform::with_binaries("/opt/ffmpeg", "/opt/norm");
        assert_eq!(transform.ffmpeg, "/opt/ffmpeg");
        assert_eq!(transform.normalizer, "/opt/norm");
        assert_eq!(transform.name(), "ffmpeg");
    }
}

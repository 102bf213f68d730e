//! Stage executors for the raw and separated phases.
//!
//! Each executor applies an operation's actions left to right, feeding the
//! path produced by one stage into the next. Intermediate files live in a
//! caller-provided work directory; only final artifacts are written to the
//! operation's output directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info, instrument};

use crate::adapters::{AudioTransform, ExportFormat, Separator};
use crate::domain::{file_stem, Action, Phase, RawSourceOperation, SeparatedSourceOperation};
use crate::error::{PipelineError, Result};

use super::chunk::split_wav;
use super::resolver::WAV_EXTENSION;

/// Suffix appended to the stem by each non-terminal separated stage
pub fn stage_suffix(action: Action) -> Option<&'static str> {
    match action {
        Action::RemoveSilence => Some("_silenceremoved"),
        Action::Compress => Some("_compressed"),
        Action::Normalize => Some("_normalized"),
        Action::Mono => Some("_mono"),
        _ => None,
    }
}

fn check_phase(actions: &[Action], phase: Phase) -> Result<()> {
    match actions.iter().find(|a| a.phase() != phase) {
        Some(foreign) => Err(PipelineError::Precondition(format!(
            "action '{}' does not belong to the {:?} phase",
            foreign, phase
        ))),
        None => Ok(()),
    }
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(WAV_EXTENSION))
}

fn wav_name(stem: &str) -> String {
    format!("{}.{}", stem, WAV_EXTENSION)
}

/// Copy `path` into `dir` under its own file name, unless it is already
/// somewhere below `dir`
async fn place_in(path: &Path, dir: &Path) -> Result<PathBuf> {
    if path.starts_with(dir) {
        return Ok(path.to_path_buf());
    }
    let file_name = path.file_name().ok_or_else(|| {
        PipelineError::Precondition(format!("{} has no file name", path.display()))
    })?;
    let dest = dir.join(file_name);
    fs::copy(path, &dest).await?;
    Ok(dest)
}

/// Runs `extract` and `separate` for one source or section
pub struct RawStageExecutor {
    transform: Arc<dyn AudioTransform>,
    separator: Arc<dyn Separator>,

    /// Canonical folder collecting every separation artifact across runs
    separated_dir: PathBuf,
}

impl RawStageExecutor {
    pub fn new(
        transform: Arc<dyn AudioTransform>,
        separator: Arc<dyn Separator>,
        separated_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transform,
            separator,
            separated_dir: separated_dir.into(),
        }
    }

    /// Execute one raw operation, returning its final artifact.
    ///
    /// The WAV conversion of the source is memoized by file name inside
    /// `work_dir`, so sections of the same source share one conversion.
    /// Operations sharing a work directory must not run concurrently.
    #[instrument(skip(self, op, work_dir), fields(source = %op.source.display()))]
    pub async fn execute(&self, op: &RawSourceOperation, work_dir: &Path) -> Result<PathBuf> {
        check_phase(&op.actions, Phase::Raw)?;
        fs::create_dir_all(&op.output_dir).await?;

        let stem = op.source_stem();
        let converted = work_dir.join(wav_name(&stem));
        if fs::try_exists(&converted).await? {
            debug!(path = %converted.display(), "Reusing converted source");
        } else {
            self.transform.convert_to_wav(&op.source, &converted).await?;
        }

        let mut current = converted;
        for action in &op.actions {
            current = match action {
                Action::Extract => self.extract(op, &stem, &current, work_dir).await?,
                Action::Separate => self.separate(op, &current).await?,
                other => {
                    return Err(PipelineError::Precondition(format!(
                        "raw executor cannot run '{}'",
                        other
                    )))
                }
            };
        }

        place_in(&current, &op.output_dir).await
    }

    async fn extract(
        &self,
        op: &RawSourceOperation,
        stem: &str,
        current: &Path,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        let section = op.section.ok_or_else(|| {
            PipelineError::Precondition(format!(
                "extract requested for {} without a section",
                op.source.display()
            ))
        })?;

        let dest = work_dir.join(wav_name(&format!("{}_{}", stem, section.index)));
        debug!(
            index = section.index,
            start_ms = section.start_ms,
            end_ms = section.end_ms,
            "Extracting section"
        );
        self.transform
            .extract(current, &dest, section.start_ms, section.end_ms)
            .await?;
        Ok(dest)
    }

    async fn separate(&self, op: &RawSourceOperation, current: &Path) -> Result<PathBuf> {
        if !is_wav(current) || hound::WavReader::open(current).is_err() {
            return Err(PipelineError::Format {
                stage: Action::Separate.to_string(),
                path: current.to_path_buf(),
                expected: "a WAV file".to_string(),
            });
        }

        let vocals = self.separator.separate(current, &op.output_dir).await?;

        if op.output_dir != self.separated_dir {
            let relative = vocals
                .strip_prefix(&op.output_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(file_stem(current)).join("vocals.wav"));
            let canonical = self.separated_dir.join(relative);
            if let Some(parent) = canonical.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::copy(&vocals, &canonical).await?;
            debug!(path = %canonical.display(), "Copied vocals to separated folder");
        }

        Ok(vocals)
    }
}

/// Runs silence removal through split for one vocal stem
pub struct SeparatedStageExecutor {
    transform: Arc<dyn AudioTransform>,

    /// Length of each chunk produced by `split`
    chunk_seconds: u32,

    /// Format every output is exported in
    export: ExportFormat,
}

impl SeparatedStageExecutor {
    pub fn new(transform: Arc<dyn AudioTransform>, chunk_seconds: u32, export: ExportFormat) -> Self {
        Self {
            transform,
            chunk_seconds,
            export,
        }
    }

    /// Execute one separated operation, returning the exported files.
    ///
    /// Without `split` this is exactly one path; with `split` it is one path
    /// per full-length chunk, in chunk order.
    #[instrument(skip(self, op, work_dir), fields(name = %op.source_name))]
    pub async fn execute(
        &self,
        op: &SeparatedSourceOperation,
        work_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        check_phase(&op.actions, Phase::Separated)?;
        fs::create_dir_all(&op.output_dir).await?;

        let mut current = work_dir.join(wav_name(&op.source_name));
        fs::copy(&op.source, &current).await?;

        let mut finals = None;
        for action in &op.actions {
            if *action == Action::Split {
                finals = Some(self.split(&current, work_dir, &op.source_name).await?);
                break;
            }

            let suffix = stage_suffix(*action).ok_or_else(|| {
                PipelineError::Precondition(format!("separated executor cannot run '{}'", action))
            })?;
            let dest = work_dir.join(wav_name(&format!("{}{}", file_stem(&current), suffix)));

            match action {
                Action::RemoveSilence => self.transform.remove_silence(&current, &dest).await?,
                Action::Compress => self.transform.compress(&current, &dest).await?,
                Action::Normalize => self.transform.normalize(&current, &dest).await?,
                Action::Mono => self.transform.to_mono(&current, &dest).await?,
                other => {
                    return Err(PipelineError::Precondition(format!(
                        "separated executor cannot run '{}'",
                        other
                    )))
                }
            }
            current = dest;
        }

        let finals = finals.unwrap_or_else(|| vec![current]);

        let mut outputs = Vec::with_capacity(finals.len());
        for path in finals {
            let file_name = path.file_name().ok_or_else(|| {
                PipelineError::Precondition(format!("{} has no file name", path.display()))
            })?;
            let dest = op.output_dir.join(file_name);
            self.transform.export(&path, &dest, self.export).await?;
            outputs.push(dest);
        }

        info!(outputs = outputs.len(), "Exported clips");
        Ok(outputs)
    }

    async fn split(&self, current: &Path, work_dir: &Path, name: &str) -> Result<Vec<PathBuf>> {
        let source = current.to_path_buf();
        let chunk_dir = work_dir.join("chunks");
        let name = name.to_string();
        let chunk_seconds = self.chunk_seconds;

        tokio::task::spawn_blocking(move || split_wav(&source, &chunk_dir, &name, chunk_seconds))
            .await
            .map_err(|e| PipelineError::Io(std::io::Error::other(e)))?
    }
}

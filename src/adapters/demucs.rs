//! Demucs vocal separation adapter.
//!
//! Runs the `demucs` CLI as a subprocess. Demucs nests its output as
//! `<out_dir>/<model>/<source_stem>/<stem>.wav`; the vocal artifact is
//! always named `vocals.wav`.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{run_tool, Separator};
use crate::domain::file_stem;
use crate::error::{PipelineError, Result};

/// Compute device passed to demucs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda => f.write_str("cuda"),
        }
    }
}

/// Demucs adapter using subprocess mode
#[derive(Debug, Clone)]
pub struct DemucsSeparator {
    /// Path to the demucs binary (default: "demucs")
    binary_path: String,

    /// Pretrained model name; also the first directory level of the output
    model: String,

    /// Parallel jobs demucs may use internally
    jobs: usize,

    device: Device,

    /// Only split into vocals / no_vocals
    two_stems: bool,
}

impl Default for DemucsSeparator {
    fn default() -> Self {
        Self::new()
    }
}

impl DemucsSeparator {
    pub fn new() -> Self {
        Self {
            binary_path: "demucs".to_string(),
            model: "htdemucs".to_string(),
            jobs: num_cpus::get(),
            device: Device::Cpu,
            two_stems: true,
        }
    }

    /// Create an adapter with a custom binary path
    pub fn with_binary_path(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            ..Self::new()
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn two_stems(mut self, two_stems: bool) -> Self {
        self.two_stems = two_stems;
        self
    }

    /// Where demucs will write the vocal artifact for `source`
    pub fn vocals_path(&self, source: &Path, out_dir: &Path) -> PathBuf {
        out_dir
            .join(&self.model)
            .join(file_stem(source))
            .join("vocals.wav")
    }

    fn args(&self, source: &Path, out_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if self.two_stems {
            args.push("--two-stems=vocals".into());
        }
        let rest: [OsString; 9] = [
            "-n".into(),
            self.model.clone().into(),
            "-j".into(),
            self.jobs.to_string().into(),
            "-d".into(),
            self.device.to_string().into(),
            "-o".into(),
            out_dir.into(),
            source.into(),
        ];
        args.extend(rest);
        args
    }
}

#[async_trait]
impl Separator for DemucsSeparator {
    fn name(&self) -> &str {
        "demucs"
    }

    async fn separate(&self, source: &Path, out_dir: &Path) -> Result<PathBuf> {
        info!(source = %source.display(), device = %self.device, "Separating vocals");
        run_tool(&self.binary_path, self.args(source, out_dir)).await?;

        let vocals = self.vocals_path(source, out_dir);
        if !vocals.is_file() {
            return Err(PipelineError::ExternalTool {
                tool: self.binary_path.clone(),
                exit_code: 0,
                stderr: format!("expected output {} was not produced", vocals.display()),
            });
        }
        Ok(vocals)
    }
}

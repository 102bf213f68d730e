//! Error taxonomy for the pipeline.
//!
//! A missing sidecar file is not represented here: the resolver skips the
//! source and logs it instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving or executing pipeline work
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed timestamp in a sidecar timing file
    #[error("Invalid timestamp '{segment}' in {}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        segment: String,
        reason: String,
    },

    /// An executor was handed an operation its caller should never build
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// A stage input is not in the container that stage requires
    #[error("{} is not a valid input for {stage}: expected {expected}", .path.display())]
    Format {
        stage: String,
        path: PathBuf,
        expected: String,
    },

    /// An external tool could not be run or exited abnormally
    #[error("{tool} failed with exit code {exit_code}: {stderr}")]
    ExternalTool {
        tool: String,
        exit_code: i32,
        stderr: String,
    },

    /// Decoding or encoding WAV data in-process
    #[error("WAV error in {}: {source}", .path.display())]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more pooled work items failed
    #[error("{failed} of {total} {phase} operations failed")]
    PhaseFailed {
        phase: String,
        failed: usize,
        total: usize,
    },
}

impl PipelineError {
    /// Failure to spawn a tool at all (missing binary, permissions)
    pub fn spawn(tool: &str, err: std::io::Error) -> Self {
        Self::ExternalTool {
            tool: tool.to_string(),
            exit_code: -1,
            stderr: err.to_string(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

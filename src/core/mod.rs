//! Core pipeline engine.
//!
//! This module contains:
//! - Timing: sidecar section parsing
//! - Resolver: filesystem walks producing operations
//! - Executor: raw and separated stage chains
//! - Chunk: fixed-length WAV splitting
//! - Workspace: scoped temporary directories
//! - Orchestrator: phase wiring and the worker pool

pub mod chunk;
pub mod executor;
pub mod orchestrator;
pub mod resolver;
pub mod timing;
pub mod workspace;

// Re-export commonly used types
pub use chunk::{split_wav, wav_duration_ms};
pub use executor::{RawStageExecutor, SeparatedStageExecutor};
pub use orchestrator::{Orchestrator, RunOptions};
pub use resolver::{canonical_name, RawSourceResolver, SeparatedSourceResolver};
pub use timing::{parse_timestamp, sidecar_path, SectionTimings};
pub use workspace::Workspace;

//! clipforge - Staged audio pipeline for training-clip preparation
//!
//! Turns a tree of raw recordings into normalized, fixed-length clips
//! through an ordered sequence of stages:
//!
//! `extract → separate → remove_silence → compress → normalize → mono → split`
//!
//! # Architecture
//!
//! Work runs in two phases:
//! - Raw phase (`extract`, `separate`): sequential, one shared workspace
//! - Separated phase (the rest): a worker pool, one workspace per item
//!
//! Resolvers walk the filesystem into typed operations; executors thread
//! each operation through its stages; external tools (ffmpeg, demucs) sit
//! behind adapter traits.
//!
//! # Modules
//!
//! - `adapters`: External tool integrations (ffmpeg, demucs)
//! - `core`: Resolvers, executors, chunking, workspaces, orchestrator
//! - `domain`: Data structures (Action, Section, operations, RunReport)
//! - `error`: Pipeline error taxonomy
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Full pipeline over the inbox
//! clipforge run
//!
//! # Only post-separation processing with 10 second chunks
//! clipforge run --post-separation --chunk-seconds 10
//!
//! # Inspect a sidecar
//! clipforge sections recordings/session1.cue
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;

// Re-export main types at crate root for convenience
pub use adapters::{AudioTransform, ExportFormat, Separator};
pub use core::{Orchestrator, RunOptions};
pub use domain::{Action, Phase, RawSourceOperation, RunReport, Section, SeparatedSourceOperation};
pub use error::PipelineError;

//! Work items produced by the resolvers and consumed by the executors.
//!
//! Operations are value objects: a resolver builds one per matched file
//! (or per section), an executor consumes it exactly once.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::action::Action;
use super::section::Section;

/// Work item for the raw phase (extract / separate)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawSourceOperation {
    /// Raw-phase actions, canonical order
    pub actions: Vec<Action>,

    /// Original recording
    pub source: PathBuf,

    /// Where the final artifact of this operation lands
    pub output_dir: PathBuf,

    /// Section to extract; only present when `extract` was requested
    pub section: Option<Section>,
}

impl RawSourceOperation {
    /// Stem of the source file, used to name derived artifacts
    pub fn source_stem(&self) -> String {
        file_stem(&self.source)
    }
}

/// Work item for the separated phase (silence removal through split)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeparatedSourceOperation {
    /// Separated-phase actions, canonical order
    pub actions: Vec<Action>,

    /// Vocal stem audio file
    pub source: PathBuf,

    /// Canonical base name derived from the separation tool's layout
    pub source_name: String,

    /// Where exported clips land
    pub output_dir: PathBuf,
}

/// File stem as an owned string (empty if the path has none)
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

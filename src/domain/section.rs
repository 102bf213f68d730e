//! Timed sections extracted from a source recording.

use serde::{Deserialize, Serialize};

/// One `[start_ms, end_ms)` range of a source file, numbered by parse order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Position of the range within its sidecar file (0-based)
    pub index: usize,

    /// Inclusive start offset in milliseconds
    pub start_ms: u64,

    /// Exclusive end offset in milliseconds
    pub end_ms: u64,
}

impl Section {
    pub fn new(index: usize, start_ms: u64, end_ms: u64) -> Self {
        Self {
            index,
            start_ms,
            end_ms,
        }
    }

    /// Length of the section in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

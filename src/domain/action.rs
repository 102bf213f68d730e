//! Stage identifiers and their canonical ordering.
//!
//! The order of stages is fixed: whatever order a user lists actions in,
//! they always run as `extract < separate < remove_silence < compress <
//! normalize < mono < split`. The order is defined once in [`Action::ALL`]
//! and everything else (phase membership, sorting) is derived from it.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A single transform stage
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Action {
    /// Slice timed sections out of a source recording
    Extract,

    /// Isolate the vocal track with the separation tool
    Separate,

    /// Cut silent intervals
    RemoveSilence,

    /// Dynamic-range compression
    Compress,

    /// Loudness normalization
    Normalize,

    /// Collapse to a single channel
    Mono,

    /// Partition into fixed-length chunks
    Split,
}

/// Which processing regime an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Operates on original recordings, one shared workspace, sequential
    Raw,

    /// Operates on separated vocal stems, pooled
    Separated,
}

impl Action {
    /// Every action, in canonical execution order
    pub const ALL: [Action; 7] = [
        Action::Extract,
        Action::Separate,
        Action::RemoveSilence,
        Action::Compress,
        Action::Normalize,
        Action::Mono,
        Action::Split,
    ];

    /// Actions applied to raw recordings
    pub const RAW: [Action; 2] = [Action::Extract, Action::Separate];

    /// Preset used for post-separation processing
    pub const SEPARATED: [Action; 5] = [
        Action::RemoveSilence,
        Action::Compress,
        Action::Normalize,
        Action::Mono,
        Action::Split,
    ];

    /// Position in the canonical order
    pub fn ordinal(self) -> usize {
        Self::ALL
            .iter()
            .position(|a| *a == self)
            .unwrap_or(Self::ALL.len())
    }

    /// Phase this action runs in
    pub fn phase(self) -> Phase {
        if Self::RAW.contains(&self) {
            Phase::Raw
        } else {
            Phase::Separated
        }
    }

    /// Stable snake_case name (matches CLI and config spelling)
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Extract => "extract",
            Action::Separate => "separate",
            Action::RemoveSilence => "remove_silence",
            Action::Compress => "compress",
            Action::Normalize => "normalize",
            Action::Mono => "mono",
            Action::Split => "split",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| format!("unknown action '{}'", s))
    }
}

/// Project the requested actions onto one phase, in canonical order.
///
/// Duplicates collapse; actions outside the phase are dropped.
pub fn actions_for_phase(requested: &[Action], phase: Phase) -> Vec<Action> {
    Action::ALL
        .iter()
        .copied()
        .filter(|a| a.phase() == phase && requested.contains(a))
        .collect()
}

/// Sort and deduplicate a requested action list without filtering by phase
pub fn canonical_order(requested: &[Action]) -> Vec<Action> {
    Action::ALL
        .iter()
        .copied()
        .filter(|a| requested.contains(a))
        .collect()
}

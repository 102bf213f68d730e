//! Summary of one pipeline run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::Action;

/// What a run did and what it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier for this run
    pub id: Uuid,

    /// Actions requested, canonical order
    pub actions: Vec<Action>,

    /// Path the run started from
    pub input: PathBuf,

    /// Final output directory
    pub output_dir: PathBuf,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub completed_at: Option<DateTime<Utc>>,

    /// Raw-phase operations executed
    pub raw_operations: usize,

    /// Separated-phase operations executed
    pub separated_operations: usize,

    /// Every file written to the output directory
    pub outputs: Vec<PathBuf>,
}

impl RunReport {
    pub fn new(actions: Vec<Action>, input: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            actions,
            input,
            output_dir,
            started_at: Utc::now(),
            completed_at: None,
            raw_operations: 0,
            separated_operations: 0,
            outputs: Vec::new(),
        }
    }

    /// Stamp the completion time
    pub fn finish(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Wall-clock duration in milliseconds, if finished
    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

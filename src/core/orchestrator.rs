//! Main orchestrator for a pipeline run.
//!
//! Wires resolvers to executors. The raw phase runs sequentially in one
//! shared workspace; the separated phase runs on a bounded worker pool with
//! one workspace per item.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument, warn};

use crate::domain::{actions_for_phase, canonical_order, Action, Phase, RunReport};
use crate::error::{PipelineError, Result};

use super::executor::{RawStageExecutor, SeparatedStageExecutor};
use super::resolver::{RawSourceResolver, SeparatedSourceResolver};
use super::workspace::Workspace;

/// What to run and where
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// File or directory to start from
    pub input: PathBuf,

    /// Directory receiving final outputs
    pub output_dir: PathBuf,

    /// Requested actions in any order
    pub actions: Vec<Action>,
}

/// Main pipeline orchestrator
pub struct Orchestrator {
    raw: RawStageExecutor,
    separated: Arc<SeparatedStageExecutor>,

    /// Size of the separated-phase worker pool
    workers: usize,

    /// Parent directory for workspaces (system temp dir if unset)
    work_base: Option<PathBuf>,
}

impl Orchestrator {
    /// Create an orchestrator with one worker per CPU
    pub fn new(raw: RawStageExecutor, separated: SeparatedStageExecutor) -> Self {
        Self {
            raw,
            separated: Arc::new(separated),
            workers: num_cpus::get(),
            work_base: None,
        }
    }

    /// Override the worker pool size
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Place workspaces under `base` instead of the system temp dir
    pub fn with_work_dir(mut self, base: impl Into<PathBuf>) -> Self {
        self.work_base = Some(base.into());
        self
    }

    /// Execute both phases for `options`.
    ///
    /// When separated actions follow the raw phase, raw outputs go to an
    /// intermediate folder inside the run workspace and the separated
    /// resolver walks that folder. Without raw actions the separated
    /// resolver walks the input directly.
    #[instrument(skip(self, options), fields(input = %options.input.display()))]
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport> {
        let actions = canonical_order(&options.actions);
        if actions.is_empty() {
            return Err(PipelineError::Precondition("no actions requested".to_string()));
        }

        let raw_actions = actions_for_phase(&actions, Phase::Raw);
        let separated_actions = actions_for_phase(&actions, Phase::Separated);

        let mut report = RunReport::new(
            actions.clone(),
            options.input.clone(),
            options.output_dir.clone(),
        );
        info!(run_id = %report.id, ?actions, "Starting pipeline run");

        let run_workspace = Workspace::create(self.work_base.as_deref(), "clipforge-run-")?;

        let separated_input = if raw_actions.is_empty() {
            options.input.clone()
        } else {
            let raw_output = if separated_actions.is_empty() {
                options.output_dir.clone()
            } else {
                run_workspace.subdir("intermediate")?
            };

            let outputs = self
                .run_raw_phase(&options.input, &raw_actions, &raw_output, &run_workspace)
                .await?;
            report.raw_operations = outputs.len();
            if separated_actions.is_empty() {
                report.outputs = outputs;
            }
            raw_output
        };

        if !separated_actions.is_empty() {
            let (count, outputs) = self
                .run_separated_phase(&separated_input, &separated_actions, &options.output_dir)
                .await?;
            report.separated_operations = count;
            report.outputs = outputs;
        }

        report.finish();
        info!(
            run_id = %report.id,
            outputs = report.outputs.len(),
            duration_ms = report.duration_ms().unwrap_or_default(),
            "Run completed successfully"
        );
        Ok(report)
    }

    /// Run raw-phase operations one after another in a shared workspace.
    ///
    /// Sections of one source rely on the memoized conversion in that
    /// workspace, so items are never overlapped. The first failure aborts.
    pub async fn run_raw_phase(
        &self,
        input: &Path,
        actions: &[Action],
        output_dir: &Path,
        workspace: &Workspace,
    ) -> Result<Vec<PathBuf>> {
        let work_dir = workspace.subdir("raw")?;
        let mut outputs = Vec::new();

        for op in RawSourceResolver::new(input, actions, output_dir) {
            let op = op?;
            match self.raw.execute(&op, &work_dir).await {
                Ok(path) => outputs.push(path),
                Err(e) => {
                    error!(source = %op.source.display(), error = %e, "Raw operation failed");
                    return Err(e);
                }
            }
        }

        info!(operations = outputs.len(), "Raw phase finished");
        Ok(outputs)
    }

    /// Run separated-phase operations on the worker pool.
    ///
    /// Every in-flight item runs to completion so finished outputs stay on
    /// disk; if any item failed the phase returns [`PipelineError::PhaseFailed`].
    /// Returns the number of operations and all exported paths.
    pub async fn run_separated_phase(
        &self,
        input: &Path,
        actions: &[Action],
        output_dir: &Path,
    ) -> Result<(usize, Vec<PathBuf>)> {
        let ops = SeparatedSourceResolver::new(input, actions, output_dir)
            .collect::<Result<Vec<_>>>()?;
        let total = ops.len();
        info!(operations = total, workers = self.workers, "Starting separated phase");

        let results: Vec<Result<Vec<PathBuf>>> = stream::iter(ops)
            .map(|op| {
                let executor = Arc::clone(&self.separated);
                let work_base = self.work_base.clone();
                async move {
                    let name = op.source_name.clone();
                    let handle = tokio::spawn(async move {
                        let workspace = Workspace::create(work_base.as_deref(), "clipforge-item-")?;
                        executor.execute(&op, workspace.path()).await
                    });
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(PipelineError::Io(std::io::Error::other(e))),
                    };
                    if let Err(ref e) = result {
                        error!(%name, error = %e, "Separated operation failed");
                    }
                    result
                }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut outputs = Vec::new();
        let mut failed = 0;
        for result in results {
            match result {
                Ok(paths) => outputs.extend(paths),
                Err(_) => failed += 1,
            }
        }

        if failed > 0 {
            warn!(failed, total, "Separated phase finished with failures");
            return Err(PipelineError::PhaseFailed {
                phase: "separated".to_string(),
                failed,
                total,
            });
        }

        info!(outputs = outputs.len(), "Separated phase finished");
        Ok((total, outputs))
    }
}

//! Command-line interface for clipforge.
//!
//! Provides commands for running the clip pipeline, inspecting sidecar
//! timing files, and showing the resolved configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{DemucsSeparator, Device, FfmpegTransform};
use crate::config::{self, paths, ResolvedConfig};
use crate::core::{
    sidecar_path, Orchestrator, RawStageExecutor, RunOptions, SectionTimings,
    SeparatedStageExecutor,
};
use crate::domain::{canonical_order, Action, RunReport};

/// clipforge - Turn raw recordings into fixed-length training clips
#[derive(Parser, Debug)]
#[command(name = "clipforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline over a file or directory
    Run(RunArgs),

    /// Print the sections of a sidecar timing file
    Sections {
        /// Sidecar file, or the media file it belongs to
        path: PathBuf,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Input file or directory (default: the inbox folder)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory (default: the final clips folder)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Actions to run (comma-separated); always executed in canonical order
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub actions: Vec<Action>,

    /// Run separation on the GPU
    #[arg(long)]
    pub gpu: bool,

    /// Only run the post-separation stages over already separated stems
    #[arg(long, conflicts_with_all = ["separate_only", "actions"])]
    pub post_separation: bool,

    /// Only run vocal separation
    #[arg(long, conflicts_with = "actions")]
    pub separate_only: bool,

    /// Chunk length in seconds for the split stage
    #[arg(long, env = "CLIPFORGE_CHUNK_SECONDS")]
    pub chunk_seconds: Option<u32>,

    /// Worker pool size for the separated phase (default: CPU count)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => run(args).await,
            Commands::Sections { path } => show_sections(&path),
            Commands::Config => show_config(),
        }
    }
}

/// Actions a run should execute, in canonical order
pub fn select_actions(args: &RunArgs) -> Vec<Action> {
    if args.post_separation {
        Action::SEPARATED.to_vec()
    } else if args.separate_only {
        vec![Action::Separate]
    } else if args.actions.is_empty() {
        Action::ALL.to_vec()
    } else {
        canonical_order(&args.actions)
    }
}

/// Input path for a run, falling back to the conventional folder
fn resolve_input(args: &RunArgs) -> Result<PathBuf> {
    let input = match &args.input {
        Some(path) => path.clone(),
        None if args.post_separation => paths::separated()?,
        None => paths::inbox()?,
    };

    if !input.exists() {
        anyhow::bail!("Input path does not exist: {}", input.display());
    }
    Ok(input)
}

/// Output directory for a run; defaults are created, explicit paths must exist
fn resolve_output(args: &RunArgs) -> Result<PathBuf> {
    let output = match &args.output {
        Some(path) => path.clone(),
        None if args.separate_only => paths::ensure_dir(paths::separated()?)?,
        None => paths::ensure_dir(paths::final_dir()?)?,
    };

    validate_output_dir(&output)?;
    Ok(output)
}

fn validate_output_dir(output: &Path) -> Result<()> {
    if !output.exists() {
        anyhow::bail!("Output directory does not exist: {}", output.display());
    }
    if !output.is_dir() {
        anyhow::bail!("Output path is not a directory: {}", output.display());
    }
    Ok(())
}

/// Build an orchestrator from configuration and run flags
pub fn build_orchestrator(config: &ResolvedConfig, args: &RunArgs) -> Orchestrator {
    let audio = &config.audio;
    let transform = Arc::new(
        FfmpegTransform::with_binaries(&audio.ffmpeg, &audio.normalizer)
            .with_silence(audio.silence_threshold_db, audio.min_silence_ms),
    );

    let separation = &config.separation;
    let separator = Arc::new(
        DemucsSeparator::with_binary_path(&separation.binary)
            .model(&separation.model)
            .jobs(separation.jobs)
            .two_stems(separation.two_stems)
            .device(if args.gpu { Device::Cuda } else { Device::Cpu }),
    );

    let chunk_seconds = args.chunk_seconds.unwrap_or(audio.chunk_seconds);

    let raw = RawStageExecutor::new(transform.clone(), separator, &config.separated);
    let separated = SeparatedStageExecutor::new(transform, chunk_seconds, audio.export_format());

    let mut orchestrator = Orchestrator::new(raw, separated);
    if let Some(workers) = args.workers {
        orchestrator = orchestrator.with_workers(workers);
    }
    if let Some(ref work_dir) = config.work_dir {
        orchestrator = orchestrator.with_work_dir(work_dir);
    }
    orchestrator
}

/// Run the pipeline
async fn run(args: RunArgs) -> Result<()> {
    let config = config::config()?;

    let input = resolve_input(&args)?;
    let output_dir = resolve_output(&args)?;
    let actions = select_actions(&args);

    let orchestrator = build_orchestrator(config, &args);
    let options = RunOptions {
        input,
        output_dir,
        actions,
    };

    let report = orchestrator
        .run(&options)
        .await
        .context("Pipeline run failed")?;

    print_report(&report, args.json)
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
        println!("{}", out);
        return Ok(());
    }

    let actions: Vec<&str> = report.actions.iter().map(|a| a.as_str()).collect();
    println!("Run ID: {}", report.id);
    println!("Actions: {}", actions.join(", "));
    println!("Input: {}", report.input.display());
    println!("Output: {}", report.output_dir.display());
    println!("Raw operations: {}", report.raw_operations);
    println!("Separated operations: {}", report.separated_operations);
    if let Some(ms) = report.duration_ms() {
        println!("Duration: {}ms", ms);
    }
    println!("\nOutputs ({}):", report.outputs.len());
    for path in &report.outputs {
        println!("  {}", path.display());
    }
    eprintln!("\n[Run {} completed successfully]", report.id);

    Ok(())
}

/// Print the sections of a sidecar file
fn show_sections(path: &Path) -> Result<()> {
    let sidecar = if crate::core::timing::is_sidecar(path) {
        path.to_path_buf()
    } else {
        sidecar_path(path)
    };

    let timings = SectionTimings::open(&sidecar)
        .with_context(|| format!("Failed to open sidecar: {}", sidecar.display()))?;

    println!("{:<6} {:>12} {:>12} {:>12}", "INDEX", "START_MS", "END_MS", "LENGTH_MS");
    println!("{}", "-".repeat(45));
    for section in timings {
        let section = section?;
        println!(
            "{:<6} {:>12} {:>12} {:>12}",
            section.index,
            section.start_ms,
            section.end_ms,
            section.duration_ms()
        );
    }

    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let config = config::config()?;

    println!("clipforge Configuration");
    println!("=======================\n");

    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }

    println!("\nPaths:");
    println!("  Home:      {}", config.home.display());
    println!("  Inbox:     {}", config.inbox.display());
    println!("  Raw data:  {}", config.raw_data.display());
    println!("  Separated: {}", config.separated.display());
    println!("  Final:     {}", config.final_dir.display());
    match &config.work_dir {
        Some(dir) => println!("  Work dir:  {}", dir.display()),
        None => println!("  Work dir:  (system temp)"),
    }

    println!("\nSeparation:");
    println!("  Binary:    {}", config.separation.binary);
    println!("  Model:     {}", config.separation.model);
    println!("  Jobs:      {}", config.separation.jobs);
    println!("  Two stems: {}", config.separation.two_stems);

    println!("\nAudio:");
    println!("  ffmpeg:        {}", config.audio.ffmpeg);
    println!("  Normalizer:    {}", config.audio.normalizer);
    println!("  Silence:       {} dB / {} ms", config.audio.silence_threshold_db, config.audio.min_silence_ms);
    println!("  Chunk length:  {} s", config.audio.chunk_seconds);
    println!(
        "  Export:        {} Hz, {} byte(s)/sample",
        config.audio.sample_rate, config.audio.sample_width_bytes
    );

    Ok(())
}

//! Configuration for clipforge.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CLIPFORGE_HOME, CLIPFORGE_DATA)
//! 2. Config file (.clipforge/config.yaml)
//! 3. Defaults (~/.clipforge)
//!
//! Config file discovery:
//! - Searches current directory and parents for .clipforge/config.yaml
//! - Paths in config file are relative to the project root (the directory
//!   holding .clipforge/)

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::ExportFormat;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub separation: Option<SeparationConfig>,
    #[serde(default)]
    pub audio: Option<AudioConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Folder new recordings are dropped into
    pub inbox: Option<String>,
    /// Root of the data tree
    pub raw_data: Option<String>,
    /// Canonical separation output folder
    pub separated: Option<String>,
    /// Canonical folder of finished clips
    #[serde(rename = "final")]
    pub final_dir: Option<String>,
    /// Parent for temporary workspaces
    pub work_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeparationConfig {
    pub binary: Option<String>,
    pub model: Option<String>,
    pub jobs: Option<usize>,
    pub two_stems: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioConfig {
    pub ffmpeg: Option<String>,
    pub normalizer: Option<String>,
    pub silence_threshold_db: Option<f64>,
    pub min_silence_ms: Option<u64>,
    pub chunk_seconds: Option<u32>,
    pub sample_rate: Option<u32>,
    pub sample_width_bytes: Option<u16>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// clipforge home (default ~/.clipforge)
    pub home: PathBuf,
    pub inbox: PathBuf,
    pub raw_data: PathBuf,
    pub separated: PathBuf,
    pub final_dir: PathBuf,
    /// Workspace parent; system temp dir when unset
    pub work_dir: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub separation: SeparationSettings,
    pub audio: AudioSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeparationSettings {
    pub binary: String,
    pub model: String,
    pub jobs: usize,
    pub two_stems: bool,
}

impl Default for SeparationSettings {
    fn default() -> Self {
        Self {
            binary: "demucs".to_string(),
            model: "htdemucs".to_string(),
            jobs: num_cpus::get(),
            two_stems: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AudioSettings {
    pub ffmpeg: String,
    pub normalizer: String,
    pub silence_threshold_db: f64,
    pub min_silence_ms: u64,
    pub chunk_seconds: u32,
    pub sample_rate: u32,
    pub sample_width_bytes: u16,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            normalizer: "ffmpeg-normalize".to_string(),
            silence_threshold_db: -50.0,
            min_silence_ms: 1000,
            chunk_seconds: 8,
            sample_rate: 44_100,
            sample_width_bytes: 2,
        }
    }
}

impl AudioSettings {
    /// Format every exported clip is written in
    pub fn export_format(&self) -> ExportFormat {
        ExportFormat {
            sample_rate: self.sample_rate,
            sample_width: self.sample_width_bytes,
        }
    }
}

impl SeparationSettings {
    fn merge(config: Option<SeparationConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };
        Self {
            binary: config.binary.unwrap_or(defaults.binary),
            model: config.model.unwrap_or(defaults.model),
            jobs: config.jobs.unwrap_or(defaults.jobs),
            two_stems: config.two_stems.unwrap_or(defaults.two_stems),
        }
    }
}

impl AudioSettings {
    fn merge(config: Option<AudioConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };
        Self {
            ffmpeg: config.ffmpeg.unwrap_or(defaults.ffmpeg),
            normalizer: config.normalizer.unwrap_or(defaults.normalizer),
            silence_threshold_db: config
                .silence_threshold_db
                .unwrap_or(defaults.silence_threshold_db),
            min_silence_ms: config.min_silence_ms.unwrap_or(defaults.min_silence_ms),
            chunk_seconds: config.chunk_seconds.unwrap_or(defaults.chunk_seconds),
            sample_rate: config.sample_rate.unwrap_or(defaults.sample_rate),
            sample_width_bytes: config
                .sample_width_bytes
                .unwrap_or(defaults.sample_width_bytes),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".clipforge").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Environment overrides, read once so resolution stays testable
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    home: Option<String>,
    data: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            home: std::env::var("CLIPFORGE_HOME").ok(),
            data: std::env::var("CLIPFORGE_DATA").ok(),
        }
    }
}

/// Combine defaults, an optional config file and env overrides
fn resolve(
    default_home: PathBuf,
    config_file: Option<(PathBuf, ConfigFile)>,
    env: EnvOverrides,
) -> ResolvedConfig {
    let (config_path, file) = match config_file {
        Some((path, file)) => (Some(path), file),
        None => (None, ConfigFile::default()),
    };

    // Project root is the parent of .clipforge/
    let base_dir = config_path
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let from_file = |value: &Option<String>| value.as_deref().map(|p| resolve_path(&base_dir, p));

    let home = env.home.map(PathBuf::from).unwrap_or(default_home);

    let raw_data = env
        .data
        .map(PathBuf::from)
        .or_else(|| from_file(&file.paths.raw_data))
        .unwrap_or_else(|| home.join("data"));

    let inbox = from_file(&file.paths.inbox).unwrap_or_else(|| home.join("inbox"));
    let separated = from_file(&file.paths.separated).unwrap_or_else(|| raw_data.join("separated"));
    let final_dir = from_file(&file.paths.final_dir).unwrap_or_else(|| raw_data.join("final"));
    let work_dir = from_file(&file.paths.work_dir);

    ResolvedConfig {
        home,
        inbox,
        raw_data,
        separated,
        final_dir,
        work_dir,
        config_file: config_path,
        separation: SeparationSettings::merge(file.separation),
        audio: AudioSettings::merge(file.audio),
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".clipforge");

    let config_file = match find_config_file() {
        Some(path) => {
            let file = load_config_file(&path)?;
            Some((path, file))
        }
        None => None,
    };

    Ok(resolve(default_home, config_file, EnvOverrides::from_env()))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

//! Canonical directory layout for clipforge.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clipforge::config::paths;
//!
//! let inbox = paths::inbox()?;
//! let clips = paths::final_dir()?;
//! ```
//!
//! ## Layout
//!
//! | Location | Purpose |
//! |----------|---------|
//! | `inbox()` | New recordings (and their `.cue` sidecars) |
//! | `raw_data()` | Root of all pipeline data |
//! | `separated()` | Every separation artifact, across runs |
//! | `final_dir()` | Finished training clips |

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default input folder
pub fn inbox() -> Result<PathBuf> {
    Ok(crate::config::config()?.inbox.clone())
}

/// Root of the data tree
pub fn raw_data() -> Result<PathBuf> {
    Ok(crate::config::config()?.raw_data.clone())
}

/// Canonical separation output folder
pub fn separated() -> Result<PathBuf> {
    Ok(crate::config::config()?.separated.clone())
}

/// Canonical folder of finished clips
pub fn final_dir() -> Result<PathBuf> {
    Ok(crate::config::config()?.final_dir.clone())
}

/// Create `dir` (and parents) if missing, returning it
pub fn ensure_dir(dir: PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    Ok(dir)
}

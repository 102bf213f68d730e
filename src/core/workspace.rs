//! Scoped temporary directories for intermediate artifacts.
//!
//! A [`Workspace`] owns a `tempfile::TempDir`; dropping it removes the
//! directory and everything inside, whichever way the owning scope exits.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::Result;

/// A temporary working directory removed on drop
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temp directory
    pub fn new(prefix: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        debug!(path = %dir.path().display(), "Created workspace");
        Ok(Self { dir })
    }

    /// Create a workspace under `base` (created if missing)
    pub fn new_in(base: &Path, prefix: &str) -> Result<Self> {
        std::fs::create_dir_all(base)?;
        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(base)?;
        debug!(path = %dir.path().display(), "Created workspace");
        Ok(Self { dir })
    }

    /// Create a workspace in `base` if given, otherwise the system temp dir
    pub fn create(base: Option<&Path>, prefix: &str) -> Result<Self> {
        match base {
            Some(base) => Self::new_in(base, prefix),
            None => Self::new(prefix),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `name` inside the workspace
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Create (if needed) and return a subdirectory
    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let path = self.join(name);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let ws = Workspace::new("clipforge-test").unwrap();
        let path = ws.path().to_path_buf();
        std::fs::write(ws.join("scratch.wav"), b"data").unwrap();
        assert!(path.exists());

        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_removed_on_error_path() {
        fn failing(ws: &Workspace) -> Result<()> {
            ws.subdir("nested")?;
            Err(crate::error::PipelineError::Precondition("boom".into()))
        }

        let path = {
            let ws = Workspace::new("clipforge-test").unwrap();
            let path = ws.path().to_path_buf();
            assert!(failing(&ws).is_err());
            path
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_in_custom_base() {
        let base = TempDir::new().unwrap();
        let ws = Workspace::new_in(&base.path().join("work"), "run-").unwrap();
        assert!(ws.path().starts_with(base.path()));
    }
}

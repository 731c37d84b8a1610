use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::ui::prelude::{Level, emit};

/// Scratch directory for one run. Removed with everything in it when
/// dropped, whichever way the run ends.
pub struct WorkDir {
    dir: TempDir,
}

impl WorkDir {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("segcut_")
            .tempdir()
            .context("Failed to create temporary working directory")?;
        emit(
            Level::Debug,
            "segcut.workdir.create",
            &format!("Working directory {}", dir.path().display()),
            None,
        );
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        emit(
            Level::Debug,
            "segcut.workdir.remove",
            &format!("Removing working directory {}", self.dir.path().display()),
            None,
        );
    }
}

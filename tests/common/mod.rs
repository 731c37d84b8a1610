use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory holding a config file and any media the test writes.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    /// Config pointing ffmpeg and ffprobe at `sh`, which exists everywhere,
    /// so runs get past the tool check without real media tools.
    pub fn new() -> Result<Self> {
        let env = Self {
            temp_dir: tempfile::tempdir()?,
        };
        env.write_config("ffmpeg_path = \"sh\"\nffprobe_path = \"sh\"\n")?;
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("segcut.toml")
    }

    pub fn write_config(&self, contents: &str) -> Result<()> {
        fs::write(self.config_path(), contents)?;
        Ok(())
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use duct::cmd;

use super::FetchMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YtDlpFormat {
    /// Single-file mp4 with both picture and sound
    ProgressiveMp4,
    BestAudio,
}

impl YtDlpFormat {
    fn selector(self) -> &'static str {
        match self {
            YtDlpFormat::ProgressiveMp4 => "best[ext=mp4][vcodec!=none][acodec!=none]",
            YtDlpFormat::BestAudio => "bestaudio",
        }
    }
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    format: YtDlpFormat,
    name: String,
}

impl YtDlp {
    pub fn new(program: &str, format: YtDlpFormat) -> Self {
        let name = match format {
            YtDlpFormat::ProgressiveMp4 => format!("{program} (progressive mp4)"),
            YtDlpFormat::BestAudio => format!("{program} (bestaudio)"),
        };
        Self {
            program: program.to_string(),
            format,
            name,
        }
    }

    pub(super) fn args(&self, url: &str, destination: &Path) -> Vec<String> {
        vec![
            "--no-part".to_string(),
            "--force-overwrites".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "-f".to_string(),
            self.format.selector().to_string(),
            "-o".to_string(),
            destination.to_string_lossy().into_owned(),
            url.to_string(),
        ]
    }
}

impl FetchMethod for YtDlp {
    fn name(&self) -> &str {
        &self.name
    }

    fn retrieve(&self, url: &str, destination: &Path) -> Result<PathBuf> {
        let output = cmd(&self.program, self.args(url, destination))
            .stdout_null()
            .stderr_capture()
            .unchecked()
            .run()
            .with_context(|| format!("Failed to spawn {} for {}", self.program, url))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} exited with status {:?}: {}",
                self.program,
                output.status.code(),
                stderr.trim()
            );
        }

        if !destination.exists() {
            adopt_renamed_output(destination)?;
        }

        if !destination.exists() {
            bail!(
                "{} reported success but {} was not created",
                self.program,
                destination.display()
            );
        }

        Ok(destination.to_path_buf())
    }
}

/// yt-dlp may append its own extension; move such a file onto `destination`.
fn adopt_renamed_output(destination: &Path) -> Result<()> {
    let (Some(dir), Some(stem)) = (
        destination.parent(),
        destination.file_stem().and_then(|s| s.to_str()),
    ) else {
        return Ok(());
    };

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to inspect download directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.starts_with(&format!("{stem}.")) && !name.ends_with(".info.json") && !name.ends_with(".part") {
            fs::rename(entry.path(), destination).with_context(|| {
                format!(
                    "Failed to rename {} to {}",
                    entry.path().display(),
                    destination.display()
                )
            })?;
            break;
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::segments::Grammar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegcutConfig {
    /// Segment token grammar (strict or lenient)
    pub grammar: Grammar,
    /// Output file used when -o is not given
    pub default_output: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub ytdlp_path: String,
    /// Video encoder for video runs
    pub video_codec: String,
    /// Audio encoder for video runs
    pub audio_codec: String,
    /// Sample rate assumed when a source does not report one
    pub default_sample_rate: u32,
    /// Frame rate assumed when a source does not report one
    pub default_frame_rate: f64,
}

impl Default for SegcutConfig {
    fn default() -> Self {
        Self {
            grammar: Grammar::default(),
            default_output: "output.mp4".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            default_sample_rate: Self::DEFAULT_SAMPLE_RATE,
            default_frame_rate: Self::DEFAULT_FRAME_RATE,
        }
    }
}

impl SegcutConfig {
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
    pub const DEFAULT_FRAME_RATE: f64 = 30.0;

    pub fn load() -> Result<Self> {
        Self::load_from_path(config_path()?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to_path(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading segcut config from {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents).context("parsing segcut config")?;
        config.sanitize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating segcut config directory {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(self).context("serializing segcut config")?;
        fs::write(path, toml)
            .with_context(|| format!("writing segcut config to {}", path.display()))?;
        Ok(())
    }

    fn sanitize(&mut self) {
        if self.default_sample_rate == 0 {
            self.default_sample_rate = Self::DEFAULT_SAMPLE_RATE;
        }
        if !self.default_frame_rate.is_finite() || self.default_frame_rate <= 0.0 {
            self.default_frame_rate = Self::DEFAULT_FRAME_RATE;
        }
        if self.default_output.trim().is_empty() {
            self.default_output = Self::default().default_output;
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Unable to determine config directory")?
        .join("segcut")
        .join("segcut.toml"))
}

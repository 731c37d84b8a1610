use std::path::Path;

use anyhow::Result;

use super::probe::probe_media;
use super::{AudioClip, Clip, MediaKind, VideoClip, Window};

/// Opens local media as a clip of a given kind and trims it.
pub trait ClipLoader {
    /// Open the whole source as a clip of `kind`.
    fn load(&self, path: &Path, kind: MediaKind) -> Result<Clip>;

    /// Restrict a clip to `[start, end]`; a missing end means the end of the
    /// source. Ends past the source are clamped to its duration.
    fn trim(&self, clip: Clip, start: f64, end: Option<f64>) -> Clip {
        let source_duration = clip.source_duration();
        let end = end.unwrap_or(source_duration).min(source_duration);
        clip.with_window(Window::new(start, end))
    }
}

/// Loader backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeClipLoader {
    ffprobe: String,
    default_sample_rate: u32,
    default_frame_rate: f64,
}

impl FfprobeClipLoader {
    pub fn new(ffprobe: impl Into<String>, default_sample_rate: u32, default_frame_rate: f64) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            default_sample_rate,
            default_frame_rate,
        }
    }
}

impl ClipLoader for FfprobeClipLoader {
    fn load(&self, path: &Path, kind: MediaKind) -> Result<Clip> {
        if !path.exists() {
            anyhow::bail!("{} does not exist", path.display());
        }

        let report = probe_media(&self.ffprobe, path)?;
        let sample_rate = report.audio_sample_rate.unwrap_or(self.default_sample_rate);
        let window = Window::new(0.0, report.duration);

        let clip = match kind {
            MediaKind::Audio => {
                if report.audio_sample_rate.is_none() {
                    anyhow::bail!("{} has no audio stream", path.display());
                }
                Clip::Audio(AudioClip {
                    path: path.to_path_buf(),
                    window,
                    source_duration: report.duration,
                    sample_rate,
                    fade: None,
                })
            }
            MediaKind::Video => {
                let Some(video) = report.video else {
                    anyhow::bail!("{} has no video stream", path.display());
                };
                Clip::Video(VideoClip {
                    path: path.to_path_buf(),
                    window,
                    source_duration: report.duration,
                    size: Some((video.width, video.height)),
                    frame_rate: video.frame_rate.unwrap_or(self.default_frame_rate),
                    sample_rate,
                    has_audio: report.audio_sample_rate.is_some(),
                    fade: None,
                })
            }
        };

        Ok(clip)
    }
}

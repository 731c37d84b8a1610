//! Trimmed media clips and their kinds.

pub mod loader;
mod probe;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use loader::{ClipLoader, FfprobeClipLoader};

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a", "flac", "ogg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Kind implied by a local file name.
    pub fn from_path(path: &Path) -> Self {
        let is_audio = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                AUDIO_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);

        if is_audio {
            MediaKind::Audio
        } else {
            MediaKind::Video
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start and end inside a source, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub path: PathBuf,
    pub window: Window,
    /// Full length of the source
    pub source_duration: f64,
    pub sample_rate: u32,
    pub fade: Option<Fade>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoClip {
    pub path: PathBuf,
    pub window: Window,
    pub source_duration: f64,
    pub size: Option<(u32, u32)>,
    pub frame_rate: f64,
    pub sample_rate: u32,
    /// False when the source carries no audio stream
    pub has_audio: bool,
    pub fade: Option<Fade>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clip {
    Audio(AudioClip),
    Video(VideoClip),
}

impl Clip {
    pub fn kind(&self) -> MediaKind {
        match self {
            Clip::Audio(_) => MediaKind::Audio,
            Clip::Video(_) => MediaKind::Video,
        }
    }

    /// Length of the trimmed clip.
    pub fn duration(&self) -> f64 {
        self.window().duration()
    }

    pub fn window(&self) -> Window {
        match self {
            Clip::Audio(clip) => clip.window,
            Clip::Video(clip) => clip.window,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Clip::Audio(clip) => &clip.path,
            Clip::Video(clip) => &clip.path,
        }
    }

    pub fn source_duration(&self) -> f64 {
        match self {
            Clip::Audio(clip) => clip.source_duration,
            Clip::Video(clip) => clip.source_duration,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            Clip::Audio(clip) => clip.sample_rate,
            Clip::Video(clip) => clip.sample_rate,
        }
    }

    pub fn fade(&self) -> Option<Fade> {
        match self {
            Clip::Audio(clip) => clip.fade,
            Clip::Video(clip) => clip.fade,
        }
    }

    pub fn with_window(mut self, window: Window) -> Self {
        match &mut self {
            Clip::Audio(clip) => clip.window = window,
            Clip::Video(clip) => clip.window = window,
        }
        self
    }

    /// Fade in and out on the audio track only.
    pub fn fade_audio(mut self, seconds: f64) -> Self {
        if let Clip::Audio(clip) = &mut self {
            clip.fade = Some(Fade { seconds });
        }
        self
    }

    /// Fade picture and sound in and out.
    pub fn fade_video(mut self, seconds: f64) -> Self {
        if let Clip::Video(clip) = &mut self {
            clip.fade = Some(Fade { seconds });
        }
        self
    }

    /// Apply the fade primitive that matches this clip's kind.
    pub fn with_fade(self, seconds: f64) -> Self {
        match self.kind() {
            MediaKind::Audio => self.fade_audio(seconds),
            MediaKind::Video => self.fade_video(seconds),
        }
    }
}

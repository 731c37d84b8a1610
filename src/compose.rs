//! Timeline composition.
//!
//! Turns resolved segment descriptors into a homogeneous timeline: each
//! source is fetched when remote, loaded, trimmed, checked against the run
//! mode, faded, and separated from the next segment by an optional pause.

use std::path::{Path, PathBuf};

use crate::error::CutError;
use crate::fetch::{SourceFetcher, is_remote};
use crate::media::{Clip, ClipLoader, MediaKind};
use crate::segments::SegmentDescriptor;
use crate::timecode::parse_optional;
use crate::timeline::{Filler, RunMode, Timeline};
use crate::ui::prelude::{Level, emit};

/// Global pause and fade policy for one run, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionSettings {
    pub pause: f64,
    pub fade: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedTimeline {
    pub timeline: Timeline,
    pub mode: RunMode,
}

pub struct Composer<'a> {
    settings: CompositionSettings,
    fetcher: &'a dyn SourceFetcher,
    loader: &'a dyn ClipLoader,
    workdir: &'a Path,
}

impl<'a> Composer<'a> {
    pub fn new(
        settings: CompositionSettings,
        fetcher: &'a dyn SourceFetcher,
        loader: &'a dyn ClipLoader,
        workdir: &'a Path,
    ) -> Self {
        Self {
            settings,
            fetcher,
            loader,
            workdir,
        }
    }

    pub fn compose(&self, descriptors: &[SegmentDescriptor]) -> Result<ComposedTimeline, CutError> {
        let mut timeline = Timeline::new();
        let mut mode: Option<RunMode> = None;
        let mut last_video_size: Option<(u32, u32)> = None;

        for (position, descriptor) in descriptors.iter().enumerate() {
            let is_last = position + 1 == descriptors.len();
            let clip = self.load_segment(descriptor)?;

            mode = Some(check_mode(mode, descriptor, clip.kind())?);
            check_window(descriptor, &clip)?;

            let clip = if self.settings.fade > 0.0 {
                clip.with_fade(self.settings.fade)
            } else {
                clip
            };

            if let Clip::Video(video) = &clip
                && video.size.is_some()
            {
                last_video_size = video.size;
            }

            let filler = pause_filler(&clip, self.settings.pause, last_video_size);
            timeline.push_segment(clip);

            if let Some(filler) = filler
                && !is_last
            {
                let pushed = timeline.push_pause(filler);
                debug_assert!(pushed, "pause must follow a segment");
            }
        }

        let Some(mode) = mode else {
            return Err(CutError::NoClips);
        };
        timeline.trim_trailing_pause();

        Ok(ComposedTimeline { timeline, mode })
    }

    fn load_segment(&self, descriptor: &SegmentDescriptor) -> Result<Clip, CutError> {
        let index = descriptor.index;
        let start = parse_optional(descriptor.start.as_deref())?.unwrap_or(0.0);
        let end = parse_optional(descriptor.end.as_deref())?;

        emit(
            Level::Info,
            "segcut.segment.process",
            &format!(
                "Processing segment {index}: {} (from {start}s to {})",
                descriptor.source,
                end.map(|e| format!("{e}s"))
                    .unwrap_or_else(|| "end".to_string())
            ),
            None,
        );

        let (path, kind) = if is_remote(&descriptor.source) {
            // Remote sources are always loaded as audio
            (self.fetch_remote(descriptor)?, MediaKind::Audio)
        } else {
            let path = PathBuf::from(&descriptor.source);
            let kind = MediaKind::from_path(&path);
            (path, kind)
        };

        let clip = self
            .loader
            .load(&path, kind)
            .map_err(|err| CutError::Load {
                index,
                source_id: descriptor.source.clone(),
                message: format!("{err:#}"),
            })?;

        if let Some(end) = end
            && end > clip.source_duration()
        {
            emit(
                Level::Warn,
                "segcut.segment.clamp",
                &format!(
                    "Segment {index}: end {end}s is past the source length {:.3}s; trimming to the end",
                    clip.source_duration()
                ),
                None,
            );
        }

        Ok(self.loader.trim(clip, start, end))
    }

    fn fetch_remote(&self, descriptor: &SegmentDescriptor) -> Result<PathBuf, CutError> {
        let destination = self.workdir.join(format!("media_{}.mp4", descriptor.index));
        emit(
            Level::Info,
            "segcut.fetch.start",
            &format!("Downloading {} to {}", descriptor.source, destination.display()),
            None,
        );
        self.fetcher
            .fetch(&descriptor.source, &destination)
            .map_err(|cause| CutError::Fetch {
                index: descriptor.index,
                source_id: descriptor.source.clone(),
                cause,
            })
    }
}

/// First segment fixes the run mode; later segments must match it.
fn check_mode(
    current: Option<RunMode>,
    descriptor: &SegmentDescriptor,
    kind: MediaKind,
) -> Result<RunMode, CutError> {
    match current {
        None => Ok(kind),
        Some(expected) if expected == kind => Ok(expected),
        Some(expected) => Err(CutError::ModeMismatch {
            index: descriptor.index,
            source_id: descriptor.source.clone(),
            expected,
            found: kind,
        }),
    }
}

fn check_window(descriptor: &SegmentDescriptor, clip: &Clip) -> Result<(), CutError> {
    let window = clip.window();
    if window.start >= window.end {
        return Err(CutError::InvalidWindow {
            index: descriptor.index,
            source_id: descriptor.source.clone(),
            start: window.start,
            end: window.end,
        });
    }
    Ok(())
}

fn pause_filler(clip: &Clip, pause: f64, last_video_size: Option<(u32, u32)>) -> Option<Filler> {
    if pause <= 0.0 {
        return None;
    }
    Some(match clip {
        Clip::Audio(audio) => Filler::Silence {
            duration: pause,
            sample_rate: audio.sample_rate,
        },
        Clip::Video(video) => Filler::Black {
            duration: pause,
            frame_rate: video.frame_rate,
            size: video.size.or(last_video_size),
        },
    })
}

//! The ordered sequence handed to the output writer.
//!
//! Entries are trimmed clips with optional pause fillers between them. A
//! timeline never starts or ends with a pause and never holds two pauses in
//! a row; the composer keeps every entry the same kind.

use crate::media::{Clip, MediaKind};

/// Kind shared by every entry of a run, fixed by its first segment.
pub type RunMode = MediaKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Filler {
    /// Silent audio
    Silence { duration: f64, sample_rate: u32 },
    /// Black picture without a sound track of its own
    Black {
        duration: f64,
        frame_rate: f64,
        size: Option<(u32, u32)>,
    },
}

impl Filler {
    pub fn duration(&self) -> f64 {
        match self {
            Filler::Silence { duration, .. } | Filler::Black { duration, .. } => *duration,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Filler::Silence { .. } => MediaKind::Audio,
            Filler::Black { .. } => MediaKind::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEntry {
    Segment(Clip),
    Pause(Filler),
}

impl TimelineEntry {
    pub fn kind(&self) -> MediaKind {
        match self {
            TimelineEntry::Segment(clip) => clip.kind(),
            TimelineEntry::Pause(filler) => filler.kind(),
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            TimelineEntry::Segment(clip) => clip.duration(),
            TimelineEntry::Pause(filler) => filler.duration(),
        }
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, TimelineEntry::Pause(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_segment(&mut self, clip: Clip) {
        self.entries.push(TimelineEntry::Segment(clip));
    }

    /// Append a pause after the last segment. Ignored when the timeline is
    /// empty or already ends in a pause.
    pub fn push_pause(&mut self, filler: Filler) -> bool {
        match self.entries.last() {
            Some(TimelineEntry::Segment(_)) => {
                self.entries.push(TimelineEntry::Pause(filler));
                true
            }
            _ => false,
        }
    }

    /// Drop a trailing pause, if any.
    pub fn trim_trailing_pause(&mut self) {
        if self.entries.last().is_some_and(TimelineEntry::is_pause) {
            self.entries.pop();
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_pause()).count()
    }

    pub fn kinds(&self) -> Vec<MediaKind> {
        self.entries.iter().map(TimelineEntry::kind).collect()
    }

    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(TimelineEntry::duration).sum()
    }

    /// Structural shape as `(is_pause, kind)` pairs, used to compare runs.
    pub fn shape(&self) -> Vec<(bool, MediaKind)> {
        self.entries
            .iter()
            .map(|entry| (entry.is_pause(), entry.kind()))
            .collect()
    }
}

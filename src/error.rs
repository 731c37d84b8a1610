use thiserror::Error;

use crate::media::MediaKind;

/// Failures that abort a cut run.
///
/// Segment-scoped variants carry the 1-based segment index and the source
/// identifier exactly as the user supplied it.
#[derive(Error, Debug)]
pub enum CutError {
    #[error("Invalid time format: {token}")]
    Format { token: String },

    #[error("Segment tokens must come in groups of three (source start end), got {count}")]
    Arity { count: usize },

    #[error("Error downloading segment {index} '{source_id}': {cause}")]
    Fetch {
        index: usize,
        source_id: String,
        #[source]
        cause: FetchError,
    },

    #[error("Segment {index} '{source_id}' is {found} but the run is {expected}; cannot mix audio and video segments")]
    ModeMismatch {
        index: usize,
        source_id: String,
        expected: MediaKind,
        found: MediaKind,
    },

    #[error("No clips to process.")]
    NoClips,

    #[error("Failed to load segment {index} '{source_id}': {message}")]
    Load {
        index: usize,
        source_id: String,
        message: String,
    },

    #[error("Segment {index} '{source_id}' has an empty window ({start}s to {end}s)")]
    InvalidWindow {
        index: usize,
        source_id: String,
        start: f64,
        end: f64,
    },

    #[error("Required tool `{0}` was not found on PATH")]
    ToolMissing(String),

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },
}

impl CutError {
    pub fn format(token: impl Into<String>) -> Self {
        CutError::Format {
            token: token.into(),
        }
    }

    /// Segment index this failure is attributed to, if any.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            CutError::Fetch { index, .. }
            | CutError::ModeMismatch { index, .. }
            | CutError::Load { index, .. }
            | CutError::InvalidWindow { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Remote retrieval failure after the primary method and its single fallback.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{fallback} (primary method failed first: {primary})")]
    Exhausted { primary: String, fallback: String },

    #[error("invalid source URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_scoped_errors_report_their_index() {
        let err = CutError::ModeMismatch {
            index: 2,
            source_id: "clip.mp4".to_string(),
            expected: MediaKind::Audio,
            found: MediaKind::Video,
        };
        assert_eq!(err.segment_index(), Some(2));
        let message = err.to_string();
        assert!(message.contains("Segment 2"));
        assert!(message.contains("clip.mp4"));
        assert!(message.contains("cannot mix audio and video"));
    }

    #[test]
    fn general_errors_have_no_segment_index() {
        assert_eq!(CutError::NoClips.segment_index(), None);
        assert_eq!(CutError::Arity { count: 4 }.segment_index(), None);
    }

    #[test]
    fn exhausted_fetch_leads_with_fallback_cause() {
        let err = FetchError::Exhausted {
            primary: "no progressive stream".to_string(),
            fallback: "yt-dlp exited with status 1".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("yt-dlp exited with status 1"));
        assert!(message.contains("no progressive stream"));
    }
}

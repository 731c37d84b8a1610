use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::timeline::RunMode;

const VIDEO_CONTAINERS: &[&str] = &["mp4", "mkv", "mov", "avi"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSelection {
    pub path: PathBuf,
    /// A video container extension was replaced for an audio run
    pub overridden: bool,
}

/// Pick the file name actually written for a run.
///
/// Audio runs without an extension get `.mp3`; audio runs naming a video
/// container are switched to `.mp3`. Video runs use the name verbatim.
pub fn select_output_path(requested: &Path, mode: RunMode) -> OutputSelection {
    if mode == RunMode::Video {
        return OutputSelection {
            path: requested.to_path_buf(),
            overridden: false,
        };
    }

    let extension = requested
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty());

    match extension {
        None => {
            let mut name = requested.as_os_str().to_os_string();
            if !name.to_string_lossy().ends_with('.') {
                name.push(".");
            }
            name.push("mp3");
            OutputSelection {
                path: PathBuf::from(name),
                overridden: false,
            }
        }
        Some(ext)
            if VIDEO_CONTAINERS
                .iter()
                .any(|container| ext.eq_ignore_ascii_case(container)) =>
        {
            OutputSelection {
                path: requested.with_extension("mp3"),
                overridden: true,
            }
        }
        Some(_) => OutputSelection {
            path: requested.to_path_buf(),
            overridden: false,
        },
    }
}

pub(super) fn prepare_output_destination(output_path: &Path, sources: &[&Path]) -> Result<()> {
    let canonical_output = output_path.canonicalize().ok();
    for source in sources {
        let same_file = *source == output_path
            || canonical_output
                .as_ref()
                .is_some_and(|out| source.canonicalize().ok().as_ref() == Some(out));
        if same_file {
            bail!(
                "Output path {} would overwrite the source {}",
                output_path.display(),
                source.display()
            );
        }
    }

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn audio_run_replaces_video_container() {
        let selection = select_output_path(Path::new("out.mp4"), RunMode::Audio);
        assert_eq!(selection.path, PathBuf::from("out.mp3"));
        assert!(selection.overridden);

        let selection = select_output_path(Path::new("clips/final.MKV"), RunMode::Audio);
        assert_eq!(selection.path, PathBuf::from("clips/final.mp3"));
    }

    #[test]
    fn audio_run_adds_missing_extension() {
        let selection = select_output_path(Path::new("out"), RunMode::Audio);
        assert_eq!(selection.path, PathBuf::from("out.mp3"));
        assert!(!selection.overridden);

        let selection = select_output_path(Path::new("/jobs/abc/output"), RunMode::Audio);
        assert_eq!(selection.path, PathBuf::from("/jobs/abc/output.mp3"));
    }

    #[test]
    fn audio_run_keeps_audio_extensions() {
        let selection = select_output_path(Path::new("mix.wav"), RunMode::Audio);
        assert_eq!(selection.path, PathBuf::from("mix.wav"));
        assert!(!selection.overridden);
    }

    #[test]
    fn video_run_keeps_name_verbatim() {
        let selection = select_output_path(Path::new("out.mp4"), RunMode::Video);
        assert_eq!(selection.path, PathBuf::from("out.mp4"));
        let selection = select_output_path(Path::new("out"), RunMode::Video);
        assert_eq!(selection.path, PathBuf::from("out"));
    }

    #[test]
    fn destination_directory_is_created() {
        let temp = tempdir().unwrap();
        let output = temp.path().join("job").join("output.mp3");
        prepare_output_destination(&output, &[]).unwrap();
        assert!(temp.path().join("job").is_dir());
    }

    #[test]
    fn refuses_to_overwrite_a_source() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("talk.mp3");
        fs::write(&source, b"x").unwrap();
        let err = prepare_output_destination(&source, &[source.as_path()]).unwrap_err();
        assert!(err.to_string().contains("would overwrite"));
    }
}

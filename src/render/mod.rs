mod compiler;
mod output;
mod services;

use std::fs;
use std::path::{Path, PathBuf};

use crate::compose::ComposedTimeline;
use crate::error::CutError;
use crate::timeline::TimelineEntry;
use crate::ui::prelude::{Level, OutputFormat, emit, get_output_format};

pub use self::compiler::FfmpegCompiler;
use self::output::{prepare_output_destination, select_output_path};
pub use self::services::{FfmpegRunOptions, FfmpegRunner, SystemFfmpegRunner};

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Print the ffmpeg command instead of running it
    pub dry_run: bool,
    pub verbose: bool,
}

/// Concatenates a composed timeline into exactly one output file.
pub struct OutputWriter<'a> {
    compiler: FfmpegCompiler,
    runner: &'a dyn FfmpegRunner,
    program: String,
}

impl<'a> OutputWriter<'a> {
    pub fn new(
        compiler: FfmpegCompiler,
        runner: &'a dyn FfmpegRunner,
        program: impl Into<String>,
    ) -> Self {
        Self {
            compiler,
            runner,
            program: program.into(),
        }
    }

    /// Returns the written path, or `None` for a dry run.
    pub fn write(
        &self,
        composed: &ComposedTimeline,
        requested: &Path,
        options: WriteOptions,
    ) -> Result<Option<PathBuf>, CutError> {
        let selection = select_output_path(requested, composed.mode);
        if selection.overridden {
            emit(
                Level::Warn,
                "segcut.render.extension",
                &format!("Audio-only mode: writing to {}", selection.path.display()),
                None,
            );
        }
        let output_path = selection.path;

        let compiled = self
            .compiler
            .compile(&composed.timeline, composed.mode, &output_path);

        if options.dry_run {
            let command = shell_words::join(
                std::iter::once(self.program.as_str())
                    .chain(compiled.args.iter().map(String::as_str)),
            );
            match get_output_format() {
                OutputFormat::Json => emit(
                    Level::Info,
                    "segcut.render.dry_run",
                    "ffmpeg command that would be executed",
                    Some(serde_json::json!({ "command": command })),
                ),
                OutputFormat::Text => {
                    println!("ffmpeg command that would be executed:");
                    println!("{command}");
                }
            }
            return Ok(None);
        }

        let sources: Vec<&Path> = composed
            .timeline
            .entries()
            .iter()
            .filter_map(|entry| match entry {
                TimelineEntry::Segment(clip) => Some(clip.path()),
                TimelineEntry::Pause(_) => None,
            })
            .collect();
        prepare_output_destination(&output_path, &sources)
            .map_err(|err| write_error(&output_path, err))?;

        emit(
            Level::Info,
            "segcut.render.start",
            &format!("Writing output to {}", output_path.display()),
            None,
        );

        let run = self.runner.run(
            &compiled.args,
            FfmpegRunOptions {
                verbose: options.verbose,
            },
        );

        if let Err(err) = run {
            discard_partial_output(&output_path);
            return Err(write_error(&output_path, err));
        }

        if !output_path.exists() {
            return Err(CutError::Write {
                path: output_path.display().to_string(),
                message: "ffmpeg finished without creating the file".to_string(),
            });
        }

        Ok(Some(output_path))
    }
}

fn write_error(path: &Path, err: anyhow::Error) -> CutError {
    CutError::Write {
        path: path.display().to_string(),
        message: format!("{err:#}"),
    }
}

fn discard_partial_output(path: &Path) {
    if path.exists() && fs::remove_file(path).is_err() {
        emit(
            Level::Warn,
            "segcut.render.cleanup",
            &format!("Could not remove partial output {}", path.display()),
            None,
        );
    }
}

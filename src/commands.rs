use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;

use crate::cli::Cli;
use crate::compose::{Composer, CompositionSettings};
use crate::config::SegcutConfig;
use crate::error::CutError;
use crate::fetch::{is_remote, system_fetcher};
use crate::media::FfprobeClipLoader;
use crate::render::{FfmpegCompiler, OutputWriter, SystemFfmpegRunner, WriteOptions};
use crate::segments::SegmentDescriptor;
use crate::ui::prelude::{Level, emit};
use crate::workspace::WorkDir;

pub fn handle_run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => SegcutConfig::load_from_path(path)?,
        None => SegcutConfig::load()?,
    };
    if let Some(grammar) = cli.grammar {
        config.grammar = grammar;
    }

    let descriptors = config.grammar.resolver().resolve(&cli.segments)?;
    ensure_tools(&config, &descriptors)?;

    let requested = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.default_output));

    let workdir = WorkDir::create()?;
    let fetcher = system_fetcher(&config);
    let loader = FfprobeClipLoader::new(
        &config.ffprobe_path,
        config.default_sample_rate,
        config.default_frame_rate,
    );
    let settings = CompositionSettings {
        pause: cli.pause,
        fade: cli.fade,
    };
    let composed = Composer::new(settings, &fetcher, &loader, workdir.path()).compose(&descriptors)?;

    emit(
        Level::Debug,
        "segcut.compose.done",
        &format!(
            "Composed {} {} segment(s), {:.3}s total",
            composed.timeline.segment_count(),
            composed.mode,
            composed.timeline.total_duration()
        ),
        None,
    );

    let runner = SystemFfmpegRunner::new(&config.ffmpeg_path);
    let writer = OutputWriter::new(
        FfmpegCompiler::new(&config.video_codec, &config.audio_codec),
        &runner,
        &config.ffmpeg_path,
    );
    let written = writer
        .write(
            &composed,
            &requested,
            WriteOptions {
                dry_run: cli.dry_run,
                verbose: cli.verbose,
            },
        )
        .with_context(|| format!("Rendering {}", requested.display()))?;

    if let Some(path) = written {
        emit(
            Level::Success,
            "segcut.render.complete",
            &format!("Wrote {}", path.display()),
            Some(json!({
                "path": path.display().to_string(),
                "mode": composed.mode,
                "segments": composed.timeline.segment_count(),
                "duration": composed.timeline.total_duration(),
            })),
        );
    }

    Ok(())
}

fn ensure_tools(config: &SegcutConfig, descriptors: &[SegmentDescriptor]) -> Result<(), CutError> {
    let mut required = vec![config.ffmpeg_path.as_str(), config.ffprobe_path.as_str()];
    if descriptors.iter().any(|descriptor| is_remote(&descriptor.source)) {
        required.push(config.ytdlp_path.as_str());
    }

    for tool in required {
        if which::which(tool).is_err() {
            return Err(CutError::ToolMissing(tool.to_string()));
        }
    }
    Ok(())
}

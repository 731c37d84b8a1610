//! Builds the single ffmpeg invocation that concatenates a timeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::media::{AudioClip, Clip, Fade, VideoClip};
use crate::timeline::{Filler, RunMode, Timeline, TimelineEntry};

const DEFAULT_DIMENSIONS: (u32, u32) = (1280, 720);
const DEFAULT_FRAME_RATE: f64 = 30.0;
const DEFAULT_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone)]
pub struct FfmpegCompileOutput {
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: String) {
        self.filters.push(filter);
    }

    pub fn join(&self) -> String {
        self.filters.join("; ")
    }
}

/// Input files in order of first appearance.
#[derive(Debug, Default)]
struct SourceMap {
    indices: HashMap<PathBuf, usize>,
    order: Vec<PathBuf>,
}

impl SourceMap {
    fn build(timeline: &Timeline) -> Self {
        let mut map = Self::default();
        for entry in timeline.entries() {
            if let TimelineEntry::Segment(clip) = entry
                && !map.indices.contains_key(clip.path())
            {
                map.indices.insert(clip.path().to_path_buf(), map.order.len());
                map.order.push(clip.path().to_path_buf());
            }
        }
        map
    }

    fn index(&self, path: &Path) -> usize {
        // Every segment path is registered by `build`
        self.indices.get(path).copied().unwrap_or_default()
    }

    fn input_args(&self) -> Vec<String> {
        self.order
            .iter()
            .flat_map(|path| ["-i".to_string(), path.to_string_lossy().into_owned()])
            .collect()
    }
}

/// Output format shared by every concatenated piece.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StreamFormat {
    size: (u32, u32),
    frame_rate: f64,
    sample_rate: u32,
}

impl StreamFormat {
    fn from_timeline(timeline: &Timeline) -> Self {
        let first_clip = timeline.entries().iter().find_map(|entry| match entry {
            TimelineEntry::Segment(clip) => Some(clip),
            TimelineEntry::Pause(_) => None,
        });

        match first_clip {
            Some(Clip::Video(video)) => Self {
                size: video.size.unwrap_or(DEFAULT_DIMENSIONS),
                frame_rate: video.frame_rate,
                sample_rate: video.sample_rate,
            },
            Some(Clip::Audio(audio)) => Self {
                size: DEFAULT_DIMENSIONS,
                frame_rate: DEFAULT_FRAME_RATE,
                sample_rate: audio.sample_rate,
            },
            None => Self {
                size: DEFAULT_DIMENSIONS,
                frame_rate: DEFAULT_FRAME_RATE,
                sample_rate: DEFAULT_SAMPLE_RATE,
            },
        }
    }
}

pub struct FfmpegCompiler {
    video_codec: String,
    audio_codec: String,
}

impl FfmpegCompiler {
    pub fn new(video_codec: impl Into<String>, audio_codec: impl Into<String>) -> Self {
        Self {
            video_codec: video_codec.into(),
            audio_codec: audio_codec.into(),
        }
    }

    pub fn compile(&self, timeline: &Timeline, mode: RunMode, output: &Path) -> FfmpegCompileOutput {
        let mut args = vec!["-y".to_string(), "-hide_banner".to_string()];

        let source_map = SourceMap::build(timeline);
        args.extend(source_map.input_args());

        let format = StreamFormat::from_timeline(timeline);
        let filter_complex = match mode {
            RunMode::Audio => self.build_audio_graph(timeline, &source_map, format),
            RunMode::Video => self.build_video_graph(timeline, &source_map, format),
        };
        args.push("-filter_complex".to_string());
        args.push(filter_complex);

        match mode {
            RunMode::Audio => {
                args.extend(["-map".to_string(), "[outa]".to_string()]);
                if is_mp3(output) {
                    args.extend(
                        ["-c:a", "libmp3lame", "-q:a", "2"]
                            .iter()
                            .map(|s| s.to_string()),
                    );
                }
            }
            RunMode::Video => {
                args.extend(
                    ["-map", "[outv]", "-map", "[outa]"]
                        .iter()
                        .map(|s| s.to_string()),
                );
                args.extend([
                    "-c:v".to_string(),
                    self.video_codec.clone(),
                    "-pix_fmt".to_string(),
                    "yuv420p".to_string(),
                    "-c:a".to_string(),
                    self.audio_codec.clone(),
                    "-movflags".to_string(),
                    "+faststart".to_string(),
                ]);
            }
        }

        args.push(output.to_string_lossy().into_owned());
        FfmpegCompileOutput { args }
    }

    fn build_audio_graph(&self, timeline: &Timeline, sources: &SourceMap, format: StreamFormat) -> String {
        let mut filters = FilterChain::new();
        let mut concat_inputs = String::new();

        for (idx, entry) in timeline.entries().iter().enumerate() {
            let label = format!("a{idx}");
            let filter = match entry {
                TimelineEntry::Segment(clip) => segment_audio_filter(clip, sources, format, &label),
                TimelineEntry::Pause(filler) => pause_audio_filter(filler, format, &label),
            };
            filters.push(filter);
            concat_inputs.push_str(&format!("[{label}]"));
        }

        filters.push(format!(
            "{concat_inputs}concat=n={count}:v=0:a=1[outa]",
            count = timeline.len()
        ));
        filters.join()
    }

    fn build_video_graph(&self, timeline: &Timeline, sources: &SourceMap, format: StreamFormat) -> String {
        let mut filters = FilterChain::new();
        let mut concat_inputs = String::new();

        for (idx, entry) in timeline.entries().iter().enumerate() {
            let video_label = format!("v{idx}");
            let audio_label = format!("a{idx}");
            let picture = match entry {
                TimelineEntry::Segment(Clip::Video(clip)) => {
                    video_picture_filter(clip, sources.index(&clip.path), format, &video_label)
                }
                TimelineEntry::Segment(Clip::Audio(clip)) => black_filter(
                    clip.window.duration(),
                    None,
                    format.frame_rate,
                    format,
                    &video_label,
                ),
                TimelineEntry::Pause(filler) => pause_picture_filter(filler, format, &video_label),
            };
            filters.push(picture);
            filters.push(match entry {
                TimelineEntry::Segment(clip) => segment_audio_filter(clip, sources, format, &audio_label),
                TimelineEntry::Pause(filler) => pause_audio_filter(filler, format, &audio_label),
            });
            concat_inputs.push_str(&format!("[{video_label}][{audio_label}]"));
        }

        filters.push(format!(
            "{concat_inputs}concat=n={count}:v=1:a=1[outv][outa]",
            count = timeline.len()
        ));
        filters.join()
    }
}

fn segment_audio_filter(clip: &Clip, sources: &SourceMap, format: StreamFormat, label: &str) -> String {
    match clip {
        Clip::Audio(audio) => audio_clip_filter(audio, sources.index(&audio.path), format, label),
        Clip::Video(video) => video_audio_filter(video, sources.index(&video.path), format, label),
    }
}

/// Silence generated at the filler's own rate and resampled to the output rate.
fn pause_audio_filter(filler: &Filler, format: StreamFormat, label: &str) -> String {
    let source_rate = match filler {
        Filler::Silence { sample_rate, .. } => *sample_rate,
        Filler::Black { .. } => format.sample_rate,
    };
    silence_filter(filler.duration(), source_rate, format, label)
}

fn pause_picture_filter(filler: &Filler, format: StreamFormat, label: &str) -> String {
    match filler {
        Filler::Black {
            duration,
            frame_rate,
            size,
        } => black_filter(*duration, *size, *frame_rate, format, label),
        Filler::Silence { duration, .. } => {
            black_filter(*duration, None, format.frame_rate, format, label)
        }
    }
}

fn audio_clip_filter(clip: &AudioClip, input: usize, format: StreamFormat, label: &str) -> String {
    format!(
        "[{input}:a]{trim}{fade}[{label}]",
        trim = audio_trim(clip.window.start, clip.window.end, format),
        fade = audio_fade(clip.fade, clip.window.duration()),
    )
}

fn video_audio_filter(clip: &VideoClip, input: usize, format: StreamFormat, label: &str) -> String {
    if !clip.has_audio {
        return silence_filter(clip.window.duration(), format.sample_rate, format, label);
    }
    format!(
        "[{input}:a]{trim}{fade}[{label}]",
        trim = audio_trim(clip.window.start, clip.window.end, format),
        fade = audio_fade(clip.fade, clip.window.duration()),
    )
}

fn video_picture_filter(clip: &VideoClip, input: usize, format: StreamFormat, label: &str) -> String {
    let (width, height) = format.size;
    format!(
        "[{input}:v]trim=start={start}:end={end},setpts=PTS-STARTPTS,scale={width}:{height}:force_original_aspect_ratio=decrease,pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}{fade}[{label}]",
        start = format_time(clip.window.start),
        end = format_time(clip.window.end),
        fps = format_rate(format.frame_rate),
        fade = video_fade(clip.fade, clip.window.duration()),
    )
}

fn audio_trim(start: f64, end: f64, format: StreamFormat) -> String {
    format!(
        "atrim=start={start}:end={end},asetpts=PTS-STARTPTS,aresample={rate},aformat=sample_fmts=fltp:channel_layouts=stereo",
        start = format_time(start),
        end = format_time(end),
        rate = format.sample_rate,
    )
}

fn silence_filter(duration: f64, source_rate: u32, format: StreamFormat, label: &str) -> String {
    format!(
        "anullsrc=r={source_rate}:cl=stereo,atrim=duration={duration},aresample={rate},aformat=sample_fmts=fltp:channel_layouts=stereo[{label}]",
        rate = format.sample_rate,
        duration = format_time(duration),
    )
}

fn black_filter(
    duration: f64,
    size: Option<(u32, u32)>,
    source_fps: f64,
    format: StreamFormat,
    label: &str,
) -> String {
    let (source_width, source_height) = size.unwrap_or(format.size);
    let (width, height) = format.size;
    format!(
        "color=c=black:s={source_width}x{source_height}:r={source_fps}:d={duration},scale={width}:{height},setsar=1,fps={fps}[{label}]",
        source_fps = format_rate(source_fps),
        fps = format_rate(format.frame_rate),
        duration = format_time(duration),
    )
}

/// Fade in from the clip start and out towards its end; the fade length is
/// passed through even when it exceeds the clip.
fn audio_fade(fade: Option<Fade>, duration: f64) -> String {
    match fade {
        Some(Fade { seconds }) => format!(
            ",afade=t=in:st=0:d={d},afade=t=out:st={out}:d={d}",
            d = format_time(seconds),
            out = format_time((duration - seconds).max(0.0)),
        ),
        None => String::new(),
    }
}

fn video_fade(fade: Option<Fade>, duration: f64) -> String {
    match fade {
        Some(Fade { seconds }) => format!(
            ",fade=t=in:st=0:d={d},fade=t=out:st={out}:d={d}",
            d = format_time(seconds),
            out = format_time((duration - seconds).max(0.0)),
        ),
        None => String::new(),
    }
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

fn format_time(value: f64) -> String {
    format!("{value:.6}")
}

fn format_rate(value: f64) -> String {
    format!("{value:.3}")
}

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub duration: f64,
    pub video: Option<VideoStreamInfo>,
    pub audio_sample_rate: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoStreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    sample_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

pub fn probe_media(ffprobe: &str, path: &Path) -> Result<ProbeReport> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration:stream=codec_type,width,height,avg_frame_rate,r_frame_rate,sample_rate,duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run ffprobe for {}", path.display()))?;

    if !output.status.success() {
        bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8(output.stdout)
        .context("ffprobe returned non-UTF8 output")?;
    parse_probe_json(&stdout)
        .with_context(|| format!("Unable to read ffprobe report for {}", path.display()))
}

fn parse_probe_json(json: &str) -> Result<ProbeReport> {
    let parsed: FfprobeOutput = serde_json::from_str(json).context("parsing ffprobe JSON")?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .and_then(|s| {
            Some(VideoStreamInfo {
                width: s.width?,
                height: s.height?,
                frame_rate: s
                    .avg_frame_rate
                    .as_deref()
                    .and_then(parse_frame_rate)
                    .or_else(|| s.r_frame_rate.as_deref().and_then(parse_frame_rate)),
            })
        });

    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));
    let audio_sample_rate = audio
        .and_then(|s| s.sample_rate.as_deref())
        .and_then(|rate| rate.parse().ok());

    let duration = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or_else(|| parsed.streams.iter().find_map(|s| s.duration.as_deref()))
        .ok_or_else(|| anyhow!("ffprobe did not report a duration"))?;
    let duration: f64 = duration
        .trim()
        .parse()
        .context("Failed to parse ffprobe duration as f64")?;

    Ok(ProbeReport {
        duration,
        video,
        audio_sample_rate,
    })
}

/// `"30000/1001"` or `"25"`; `"0/0"` yields `None`.
fn parse_frame_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_video_and_audio_streams() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080, "avg_frame_rate": "30000/1001", "r_frame_rate": "30000/1001"},
                {"codec_type": "audio", "sample_rate": "48000"}
            ],
            "format": {"duration": "12.500000"}
        }"#;
        let report = parse_probe_json(json).unwrap();
        assert_eq!(report.duration, 12.5);
        assert_eq!(report.audio_sample_rate, Some(48_000));
        let video = report.video.unwrap();
        assert_eq!((video.width, video.height), (1920, 1080));
        assert!((video.frame_rate.unwrap() - 29.97).abs() < 0.01);
    }

    #[test]
    fn audio_only_file_has_no_video_stream() {
        let json = r#"{
            "streams": [{"codec_type": "audio", "sample_rate": "44100", "duration": "3.0"}],
            "format": {}
        }"#;
        let report = parse_probe_json(json).unwrap();
        assert_eq!(report.duration, 3.0);
        assert!(report.video.is_none());
        assert_eq!(report.audio_sample_rate, Some(44_100));
    }

    #[test]
    fn missing_duration_is_an_error() {
        let json = r#"{"streams": [], "format": {}}"#;
        assert!(parse_probe_json(json).is_err());
    }

    #[test]
    fn frame_rate_falls_back_when_average_is_unknown() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 640, "height": 360, "avg_frame_rate": "0/0", "r_frame_rate": "25/1"}],
            "format": {"duration": "1.0"}
        }"#;
        let report = parse_probe_json(json).unwrap();
        assert_eq!(report.video.unwrap().frame_rate, Some(25.0));
    }
}

use std::io::Read;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};

use crate::ui::prelude::{Level, emit};

pub trait FfmpegRunner {
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SystemFfmpegRunner {
    program: String,
}

impl SystemFfmpegRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegRunOptions {
    pub verbose: bool,
}

impl FfmpegRunner for SystemFfmpegRunner {
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.program))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("{} stderr was not captured", self.program))?;

        let mut last_line = String::new();
        let mut error_lines: Vec<String> = Vec::new();
        let result = read_ffmpeg_stderr(stderr, options.verbose, &mut last_line, &mut error_lines);

        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for {}", self.program))?;
        result?;

        if !status.success() {
            let error_msg = if !error_lines.is_empty() {
                error_lines.join("\n")
            } else {
                last_line
            };
            bail!(
                "{} exited with status {:?}: {}",
                self.program,
                status.code(),
                error_msg.trim()
            );
        }

        Ok(())
    }
}

fn read_ffmpeg_stderr<R: Read>(
    mut stderr: R,
    verbose: bool,
    last_line: &mut String,
    error_lines: &mut Vec<String>,
) -> Result<()> {
    let mut buffer = [0u8; 4096];
    let mut accumulated = String::new();

    loop {
        let bytes_read = stderr
            .read(&mut buffer)
            .context("Failed to read ffmpeg stderr")?;
        if bytes_read == 0 {
            break;
        }

        accumulated.push_str(&String::from_utf8_lossy(&buffer[..bytes_read]));

        while let Some(pos) = accumulated.find(['\r', '\n']) {
            let line = accumulated[..pos].to_string();
            accumulated.drain(..=pos);
            record_line(line, verbose, last_line, error_lines);
        }
    }

    if !accumulated.is_empty() {
        record_line(accumulated, verbose, last_line, error_lines);
    }

    Ok(())
}

fn record_line(line: String, verbose: bool, last_line: &mut String, error_lines: &mut Vec<String>) {
    if line.trim().is_empty() {
        return;
    }

    if verbose {
        emit(Level::Info, "segcut.render.ffmpeg", &line, None);
    }

    if line.to_ascii_lowercase().contains("error") {
        error_lines.push(line.clone());
    }

    *last_line = line;
}

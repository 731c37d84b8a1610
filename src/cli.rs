use std::path::PathBuf;

use clap::Parser;

use crate::segments::Grammar;

/// Cut media segments and join them into one file with pauses and fades
#[derive(Parser, Debug)]
#[command(name = "segcut", author, version, about, long_about = None)]
pub struct Cli {
    /// Seconds of silence (or black) inserted between segments
    #[arg(value_parser = non_negative_seconds)]
    pub pause: f64,

    /// Fade-in and fade-out length applied to every segment, in seconds
    #[arg(value_parser = non_negative_seconds)]
    pub fade: f64,

    /// Segment tokens: SOURCE [START [END]] repeated (strict grammar needs all three)
    #[arg(required = true, num_args = 1..)]
    pub segments: Vec<String>,

    /// Output file (defaults to the configured default_output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// How segment tokens are grouped
    #[arg(long, value_enum)]
    pub grammar: Option<Grammar>,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the ffmpeg command instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Show ffmpeg output while rendering
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit events as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Activate debug mode
    #[arg(short, long)]
    pub debug: bool,
}

fn non_negative_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("'{value}' must be a non-negative number of seconds"));
    }
    Ok(seconds)
}

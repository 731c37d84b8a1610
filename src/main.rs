mod cli;
mod commands;
mod compose;
mod config;
mod error;
mod fetch;
mod media;
mod render;
mod segments;
mod timecode;
mod timeline;
mod ui;
mod workspace;

use clap::Parser;

use crate::cli::Cli;
use crate::error::CutError;
use crate::ui::prelude::{Level, OutputFormat, emit};

fn main() {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    ui::init(format, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    if let Err(err) = commands::handle_run(&cli) {
        let segment = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<CutError>())
            .and_then(CutError::segment_index);
        emit(
            Level::Error,
            "segcut.error",
            &format!("Error: {err:#}"),
            segment.map(|index| serde_json::json!({ "segment": index })),
        );
        std::process::exit(1);
    }
}

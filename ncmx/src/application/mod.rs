pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use ncmx_core::error::Result;

pub fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Decode {
            root,
            input,
            output,
            record,
            max_workers,
            buf_size,
            strategy,
            extension,
            json,
        } => handlers::handle_decode(
            root,
            input,
            output,
            record,
            max_workers,
            buf_size,
            strategy.into(),
            extension,
            json,
        ),
        Commands::Transcode {
            root,
            input,
            output,
            record,
            max_workers,
            ffmpeg,
            json,
        } => handlers::handle_transcode(root, input, output, record, max_workers, ffmpeg, json),
        Commands::Inspect {
            file,
            strategy,
            json,
        } => handlers::handle_inspect(file, strategy.into(), json).map(|_| true),
        Commands::Init { root } => handlers::handle_init(root).map(|_| true),
        Commands::Organize { root } => handlers::handle_organize(root).map(|_| true),
        Commands::Status { root, json } => handlers::handle_status(root, json).map(|_| true),
    }
}

mod application;
mod presentation;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use presentation::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match application::run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "aborted");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

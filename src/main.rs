// ABOUTME: Entry point for the stagecraft CLI application.
// ABOUTME: Sets up logging and cancellation, dispatches commands, and maps errors to exit codes.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use stagecraft::output::{Output, OutputMode};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    let code = match commands::run(cli, &mut output, cancel).await {
        Ok(()) => 0,
        Err(e) => {
            output.error(e.code(), &e.to_string());
            e.exit_code()
        }
    };
    std::process::exit(code);
}

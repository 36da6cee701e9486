#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;

use std::process;

use crate::config::{Cli, Command};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "beatgraph_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "beatgraph_cli::shutdown";
pub const TRACING_TARGET_COMMAND: &str = "beatgraph_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SHUTDOWN,
            "command finished successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();

    match cli.command {
        Command::Kinds => command::kinds(),
        Command::Candidates(args) => command::candidates(&args),
        Command::Analyze(args) => command::analyze(&args).await,
        Command::Execute(args) => command::execute(args).await,
    }
}

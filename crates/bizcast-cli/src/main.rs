//! bizcast CLI - Business finance question answering
//!
//! Usage:
//!   bizcast                         Interactive prompt
//!   bizcast ask "profit today?"     Answer one question
//!   bizcast features --window all   Show aggregated features
//!   bizcast check                   Validate artifacts and records

mod cli;
mod commands;


use anyhow::Result;
use bizcast_core::TimeWindow;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let overrides = commands::PathOverrides {
        records: cli.records,
        model: cli.model,
        normalization: cli.normalization,
    };
    let config = commands::load_config(cli.config.as_deref(), overrides)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::cmd_chat(&config),
        Commands::Ask { question, json } => commands::cmd_ask(&config, &question.join(" "), json),
        Commands::Features { window } => {
            let window: TimeWindow = window.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            commands::cmd_features(&config, window)
        }
        Commands::Check => commands::cmd_check(&config),
    }
}

//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// bizcast - Ask questions about your business finances
#[derive(Parser)]
#[command(name = "bizcast")]
#[command(about = "Predict capital, profit and loss from your transaction records", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of transaction record files (overrides config)
    #[arg(long, global = true)]
    pub records: Option<PathBuf>,

    /// Model weight artifact (overrides config)
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Normalization parameter artifact (overrides config)
    #[arg(long, global = true)]
    pub normalization: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `chat` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive question prompt
    Chat,

    /// Answer a single question
    Ask {
        /// The question, e.g. "What is my profit today?"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Print the full answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show aggregated model features for a time window
    Features {
        /// Window: today, yesterday, this-week, this-month, this-year, all
        #[arg(short, long, default_value = "all")]
        window: String,
    },

    /// Load artifacts and records and report what was found
    Check,
}

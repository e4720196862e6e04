//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod init;
mod score;
mod serve;
mod videos;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use thumbsense::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "thumbsense")]
#[command(about = "YouTube comment sentiment scoring service")]
#[command(version)]
pub struct Cli {
    /// Data directory or database file (overrides config file).
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the HTTP API with background workers and the pending sweep
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Request a video and process it to completion
    Request {
        /// YouTube video ID
        video_id: String,
    },

    /// Start every pending video and process it to completion
    Sweep,

    /// Show the sentiment summary for a video
    Score {
        /// YouTube video ID
        video_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tracked videos
    Videos {
        #[arg(long, default_value = "0")]
        skip: usize,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List a video's comments
    Comments {
        /// YouTube video ID
        video_id: String,
        #[arg(long, default_value = "0")]
        skip: usize,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Delete a video and its comments
    Delete {
        /// YouTube video ID
        video_id: String,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options)
        .await
        .map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { host, port } => serve::cmd_serve(&settings, &host, port).await,
        Commands::Request { video_id } => videos::cmd_request(&settings, &video_id).await,
        Commands::Sweep => videos::cmd_sweep(&settings).await,
        Commands::Score { video_id, json } => score::cmd_score(&settings, &video_id, json).await,
        Commands::Videos { skip, limit } => videos::cmd_videos(&settings, skip, limit).await,
        Commands::Comments {
            video_id,
            skip,
            limit,
        } => videos::cmd_comments(&settings, &video_id, skip, limit).await,
        Commands::Delete { video_id } => videos::cmd_delete(&settings, &video_id).await,
    }
}

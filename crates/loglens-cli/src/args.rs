use clap::{Parser, Subcommand};

use crate::types::{LevelArg, LogLevel, OutputFormat};

#[derive(Parser)]
#[command(name = "loglens")]
#[command(about = "Browse, index, and search AI coding assistant session logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (defaults to LOGLENS_PATH, then the XDG data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect installed assistant CLIs and write the source configuration
    Init {
        /// Re-detect and overwrite the existing configuration
        #[arg(long)]
        refresh: bool,
    },

    Index {
        #[command(subcommand)]
        command: IndexCommand,
    },

    /// List indexed sessions (metadata level)
    Sessions {
        #[arg(long)]
        source: Option<String>,

        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Render one session's timeline, grouped into turns
    Show {
        /// Session ID or unique prefix
        session_id: String,
    },

    /// Ranked full-text search over extracted messages
    Search {
        /// Keywords (all must match)
        #[arg(required = true)]
        terms: Vec<String>,

        #[arg(long, default_value = "160")]
        limit: usize,

        #[arg(long, default_value = "3")]
        per_session: usize,
    },

    /// Classify a single raw JSONL record
    Classify {
        /// The record; read from stdin when omitted
        #[arg(long)]
        line: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum IndexCommand {
    /// Advance the index over all configured source roots
    Update {
        #[arg(long, default_value = "full")]
        level: LevelArg,

        /// Re-parse sessions even when their files are unchanged
        #[arg(long)]
        force: bool,

        /// Restrict to one source (codex, claude, gemini)
        #[arg(long)]
        source: Option<String>,
    },

    /// Watch source roots and re-index sessions as their files change
    Watch,

    /// Drop sessions whose files are gone, then compact the store
    Vacuum,
}

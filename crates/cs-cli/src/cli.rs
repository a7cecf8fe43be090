//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Calendar-to-timesheet synchronizer.
///
/// Pulls calendar events for a date range, matches them to projects via
/// a rule set, and logs them as bot-tagged time entries.
#[derive(Debug, Parser)]
#[command(name = "calsync", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize calendar events into time entries.
    Sync {
        /// First day to process (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// Last day to process, inclusive (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,

        /// Preview every action without creating or deleting anything.
        #[arg(long)]
        simulate: bool,

        /// Delete previously created bot entries before each day's pass.
        #[arg(long)]
        purge: bool,

        /// Path to the rules file (overrides the configured path).
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// List the workspace's projects.
    Projects,
}

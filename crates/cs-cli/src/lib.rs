//! Calendar-to-timesheet synchronizer CLI library.
//!
//! This crate provides the CLI interface for the synchronizer.

mod cli;
pub mod commands;
mod config;
mod rules;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use rules::load_rules;

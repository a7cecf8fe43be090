//! CLI subcommand implementations.

pub mod projects;
pub mod sync;

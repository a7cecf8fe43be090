use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cs_clockify::ClockifyClient;
use cs_cli::commands::{projects, sync};
use cs_cli::{Cli, Commands, Config};

/// Initialize stdout logging plus the append-mode diagnostic log, so
/// every skip and warning can be triaged after the run without
/// re-querying the remote services.
fn init_tracing(verbose: bool, log_path: &Path) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;
    let file = Arc::new(file);

    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(move || Arc::clone(&file)),
        )
        .try_init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(cli.verbose, &config.log_path)?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Sync {
            start,
            end,
            simulate,
            purge,
            rules,
        }) => {
            let config = load_config(&cli)?;
            let args = sync::SyncArgs {
                start: *start,
                end: *end,
                simulate: *simulate,
                purge: *purge,
                rules: rules.clone(),
            };
            let report = sync::run(&args, &config).await?;

            println!(
                "Synced {} day(s), {} event(s): {} created, {} duplicates, {} conflicts, \
                 {} excluded, {} unmatched, {} purged, {} errors",
                report.days,
                report.events,
                report.created,
                report.duplicates,
                report.conflicts,
                report.excluded,
                report.unmatched_projects,
                report.purged,
                report.errors,
            );
            if *simulate {
                println!(
                    "Simulation only: {} entr(ies) would have been created.",
                    report.simulated
                );
            }
        }
        Some(Commands::Projects) => {
            let config = load_config(&cli)?;
            let mut sink = ClockifyClient::new(
                config.clockify.api_key.clone(),
                config.clockify.workspace_id.clone(),
            )
            .context("failed to build Clockify client")?;
            projects::run(&mut std::io::stdout(), &mut sink).await?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

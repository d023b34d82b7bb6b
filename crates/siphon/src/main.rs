// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Siphon - capture Telegram messages into a Markdown vault.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod report;
mod status;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Args, Parser, Subcommand};
use siphon_agent::{RetryTarget, WorkerLease, install_signal_handler};
use siphon_config::model::SiphonConfig;
use siphon_core::SiphonError;
use siphon_security::redact::{RedactingWriter, SecretList, register_secret};
use tracing::{error, info, warn};

/// Siphon - capture Telegram messages into a Markdown vault.
#[derive(Parser, Debug)]
#[command(name = "siphon", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch new messages and record them as pending, without processing.
    Poll,
    /// Fetch and process every pending message once.
    Process {
        /// Vault profile to file into.
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Print what would happen without running tools or writing state.
        #[arg(long)]
        dry_run: bool,
        /// Log at debug level.
        #[arg(long, short)]
        verbose: bool,
    },
    /// Process continuously until interrupted.
    Watch {
        /// Seconds between passes.
        #[arg(long, value_name = "SECONDS")]
        interval: Option<u64>,
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Show message counts and recent failures.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Reset or reprocess failed messages.
    Retry(RetryArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").args(["failed", "message_id"])))]
struct RetryArgs {
    /// Every failed message that was not blocked.
    #[arg(long)]
    failed: bool,
    /// A single message.
    #[arg(long, value_name = "ID")]
    message_id: Option<i64>,
    /// Reprocess from the cached payload instead of waiting for a refetch.
    #[arg(long)]
    now: bool,
    /// List messages that can be reprocessed with --now.
    #[arg(long, conflicts_with_all = ["failed", "message_id", "now"])]
    list: bool,
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,
}

impl RetryArgs {
    fn target(&self) -> Option<RetryTarget> {
        match (self.failed, self.message_id) {
            (_, Some(id)) => Some(RetryTarget::Message(id)),
            (true, None) => Some(RetryTarget::AllFailed),
            (false, None) => None,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration before anything touches state.
    let config = match siphon_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            siphon_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let verbose = matches!(cli.command, Commands::Process { verbose: true, .. });
    init_tracing(&config, verbose);

    if let Err(e) = run(cli.command, config).await {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: SiphonConfig) -> Result<(), SiphonError> {
    match command {
        Commands::Poll => {
            let orchestrator = app::orchestrator(&config, None).await?;
            let summary = orchestrator.poll().await?;
            report::print_poll(&summary);
        }
        Commands::Process {
            profile,
            dry_run: true,
            ..
        } => {
            let orchestrator = app::orchestrator(&config, profile.as_deref()).await?;
            let plans = orchestrator.dry_run().await?;
            report::print_plans(&plans);
        }
        Commands::Process { profile, .. } => {
            let orchestrator = app::orchestrator(&config, profile.as_deref()).await?;
            let lease = orchestrator.start_worker().await?;
            let cancel = install_signal_handler();
            let summary = orchestrator.process_pass(&cancel).await;
            release(lease).await;
            report::print_pass(&summary?);
        }
        Commands::Watch { interval, profile } => {
            let orchestrator = app::orchestrator(&config, profile.as_deref()).await?;
            let lease = orchestrator.start_worker().await?;
            let interval =
                Duration::from_secs(interval.unwrap_or(config.watch.interval_secs).max(1));
            let backoff = Duration::from_secs(config.watch.poll_backoff_secs);
            let cancel = install_signal_handler();
            let passes = orchestrator.watch(interval, backoff, &cancel).await;
            release(lease).await;
            info!(passes, "siphon watch shutdown complete");
        }
        Commands::Status { json, plain } => {
            let store = app::open_store(&config).await?;
            status::run_status(&store, json, plain).await?;
        }
        Commands::Retry(args) if args.list => {
            let store = app::open_store(&config).await?;
            report::print_retryable(&store.list_retry_eligible().await?);
        }
        Commands::Retry(args) => {
            let Some(target) = args.target() else {
                return Err(SiphonError::Config(
                    "retry needs --failed, --message-id ID or --list".into(),
                ));
            };
            let orchestrator = app::orchestrator(&config, args.profile.as_deref()).await?;
            if args.now {
                let lease = orchestrator.start_worker().await?;
                let cancel = install_signal_handler();
                let results = orchestrator.retry_now_target(target, &cancel).await;
                release(lease).await;
                report::print_retry_results(&results?);
            } else {
                let reset = orchestrator.reset(target).await?;
                report::print_reset(reset);
            }
        }
    }
    Ok(())
}

/// Hand the worker lease back so the next run need not wait for it to expire.
async fn release(lease: WorkerLease) {
    if let Err(e) = lease.release().await {
        warn!(error = %e, "could not release the worker lease");
    }
}

/// Log to stderr through a writer that masks the configured credentials.
fn init_tracing(config: &SiphonConfig, verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let secrets = SecretList::default();
    if let Some(token) = config.telegram.bot_token.as_deref() {
        register_secret(&secrets, token);
    }
    if let Some(key) = siphon_anthropic::resolve_api_key(&config.classifier.api_key) {
        register_secret(&secrets, &key);
    }

    let filter = if verbose {
        EnvFilter::new("siphon=debug,warn")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("siphon={},warn", config.agent.log_level)))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(move || RedactingWriter::new(std::io::stderr(), secrets.clone()))
        .init();
}

//! Reposter CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use reposter::{
    config,
    error::{AppError, Result},
    models::{Config, Cursor},
    pipeline::{self, HarvestSettings, Harvester, Window},
    services::{
        AvailabilityCheck, AvailabilityChecker, Authorizer, EligibilityFilter, RedditPublisher,
        SubmissionSearch,
    },
    storage::{CursorStore, LocalCursorStore},
    utils::{format_epoch, http::HttpClient, parse_epoch_or_date},
};
use tokio::signal;

/// Reposter - republish old community media with attribution
#[derive(Parser, Debug)]
#[command(
    name = "reposter",
    version,
    about = "Walks a community's history and republishes still-available media"
)]
struct Cli {
    /// Path to storage directory containing config and cursor
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the harvest loop until interrupted
    Run,

    /// Write the starting cursor
    Init {
        /// Window start, as epoch seconds or YYYY-MM-DD (UTC)
        #[arg(long)]
        after: String,

        /// Position within the first window
        #[arg(long, default_value_t = 0)]
        index: usize,

        /// Overwrite an existing cursor
        #[arg(long)]
        force: bool,
    },

    /// Classify the current window without publishing
    Preview {
        /// Also verify availability of eligible records
        #[arg(long)]
        check_availability: bool,
    },

    /// Show cursor and current window
    Info,

    /// Validate configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => log::info!("Received Ctrl+C, shutting down"),
        () = terminate => log::info!("Received SIGTERM, shutting down"),
    }
}

async fn run(config: &Config, store: &LocalCursorStore) -> Result<()> {
    let credentials = config::credentials_from_env()?;
    log::info!("Publishing as u/{}", credentials.username);

    let http = Arc::new(HttpClient::new(&config.http)?);
    let search = SubmissionSearch::new(Arc::clone(&http), &config.endpoints.search_url)?;
    let filter = EligibilityFilter::new(&config.filter);
    let checker = AvailabilityChecker::new(
        Arc::clone(&http),
        config.http.browser_user_agent.clone(),
        config.endpoints.removed_media_urls.clone(),
    );
    let authorizer = Authorizer::new(
        Arc::clone(&http),
        config.endpoints.token_url.clone(),
        config.http.user_agent.clone(),
        credentials,
    );
    let publisher = RedditPublisher::new(
        http,
        authorizer,
        config.endpoints.api_base.clone(),
        config.harvest.publish_mode,
        config.harvest.attribution_template.clone(),
    );

    let harvester = Harvester::new(
        HarvestSettings::from_config(config),
        store,
        &search,
        &filter,
        &checker,
        &publisher,
    );

    tokio::select! {
        result = harvester.run() => result,
        () = shutdown_signal() => Ok(()),
    }
}

async fn preview(
    config: &Config,
    store: &LocalCursorStore,
    check_availability: bool,
) -> Result<()> {
    let cursor = store.load().await?;
    let http = Arc::new(HttpClient::new(&config.http)?);
    let search = SubmissionSearch::new(Arc::clone(&http), &config.endpoints.search_url)?;
    let filter = EligibilityFilter::new(&config.filter);
    let checker = AvailabilityChecker::new(
        http,
        config.http.browser_user_agent.clone(),
        config.endpoints.removed_media_urls.clone(),
    );
    let checker: Option<&dyn AvailabilityCheck> = if check_availability {
        Some(&checker)
    } else {
        None
    };

    let (window, items) = pipeline::run_preview(
        cursor,
        &HarvestSettings::from_config(config),
        &search,
        &filter,
        checker,
    )
    .await;

    log::info!("Window {}: {} submissions", window, items.len());
    for item in &items {
        log::info!(
            "  #{:<3} {} [{}] {} - {}",
            item.position,
            item.record.fullname(),
            item.record.domain,
            item.record.title,
            item.outcome
        );
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = LocalCursorStore::new(config::cursor_dir(&cli.storage_dir));

    match cli.command {
        Command::Run => {
            let config = config::load_config(&cli.storage_dir)?;
            log::info!("Loaded configuration from {}", cli.storage_dir.display());
            run(&config, &store).await?;
        }

        Command::Init {
            after,
            index,
            force,
        } => {
            let after = parse_epoch_or_date(&after).ok_or_else(|| {
                AppError::validation(format!(
                    "--after must be epoch seconds or YYYY-MM-DD, got {after:?}"
                ))
            })?;
            pipeline::run_init(&store, Cursor::new(after, index), force).await?;
        }

        Command::Preview { check_availability } => {
            let config = config::load_config(&cli.storage_dir)?;
            preview(&config, &store, check_availability).await?;
        }

        Command::Info => {
            let config = Config::load_or_default(config::config_path(&cli.storage_dir));
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!(
                "Communities: r/{} -> r/{}",
                config.communities.source,
                config.communities.target
            );

            if store.is_initialized().await? {
                let cursor = store.load().await?;
                let window = Window::starting_at(cursor.after, config.harvest.window_secs);
                log::info!(
                    "Cursor: after={} ({} UTC), index={}",
                    cursor.after,
                    format_epoch(cursor.after),
                    cursor.index
                );
                log::info!("Current window: {}", window);
            } else {
                log::info!("Cursor not initialized at {}", store.location());
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let config = Config::load(config::config_path(&cli.storage_dir))?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK");
        }
    }

    Ok(())
}

//! BRD Flow notifier
//!
//! Seeds an in-memory document store from a JSON fixture, runs the
//! notification feed for one user and prints the resulting list.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use brdflow_core::config::AppConfig;
use brdflow_core::error::AppError;
use brdflow_core::traits::navigator::NoopNavigator;
use brdflow_core::types::id::{NotificationId, UserId};
use brdflow_database::fixture::StoreFixture;
use brdflow_database::memory::MemoryDocumentStore;
use brdflow_realtime::{FeedSnapshot, NotificationFeed};

/// Run the BRD notification feed for one user.
#[derive(Debug, Parser)]
#[command(name = "brdflow-notifier", version, about)]
struct Args {
    /// User whose notifications are aggregated
    #[arg(short, long)]
    user: String,

    /// JSON fixture with `requests` and `comments`
    #[arg(short, long, default_value = "config/fixture.json")]
    fixture: PathBuf,

    /// Time to let live queries settle before reading the list (ms)
    #[arg(long, default_value_t = 250)]
    settle_ms: u64,

    /// Mark a single notification read before printing
    #[arg(long, conflicts_with = "mark_all_read")]
    mark_read: Option<String>,

    /// Mark every notification read before printing
    #[arg(long)]
    mark_all_read: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(args, config).await {
        tracing::error!("Notifier error: {}", e);
        std::process::exit(1);
    }
}

/// Load layered configuration for the current environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("BRDFLOW_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(args: Args, config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting BRD Flow notifier v{}", env!("CARGO_PKG_VERSION"));

    let store = MemoryDocumentStore::new(&config.store);
    StoreFixture::load(&args.fixture).await?.apply(&store).await?;

    let feed = NotificationFeed::new(
        Arc::new(store),
        Arc::new(NoopNavigator),
        config.notifications.clone(),
    );

    feed.start(UserId::new(args.user)).await;
    tokio::time::sleep(Duration::from_millis(args.settle_ms)).await;

    let pending = if let Some(id) = args.mark_read {
        Some(feed.mark_read(&NotificationId::new(id)).await?)
    } else if args.mark_all_read {
        Some(feed.mark_all_read().await?)
    } else {
        None
    };
    if let Some(pending) = pending {
        let summary = pending.wait().await;
        tracing::info!(
            attempted = summary.attempted,
            failed = summary.failed,
            "Read state persisted"
        );
    }

    print_snapshot(&feed.snapshot())?;

    feed.stop().await;
    tracing::info!("Notifier stopped");
    Ok(())
}

fn print_snapshot(snapshot: &FeedSnapshot) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

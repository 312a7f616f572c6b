//! ==============================================================================
//! main.rs - water feed entry point
//! ==============================================================================
//!
//! purpose:
//!     polls the water-quality spreadsheet and keeps the dashboard's json
//!     files fresh.
//!
//! responsibilities:
//!     - load feed.toml (or defaults)
//!     - set up tracing at the configured level
//!     - create the output directories
//!     - hand over to the poll loop until ctrl-c
//!
//! files:
//!
//!     ┌──────────────────┐        ┌─────────────────────────────────────┐
//!     │ water_data.xlsx  │ ─────> │ feed loop (every interval_seconds)  │
//!     └──────────────────┘        └──────┬───────────┬───────────┬──────┘
//!                                        │           │           │
//!                                        ▼           ▼           ▼
//!                                   data.json  history.json  state.json
//!                                   (latest)   (last N)      (cursor)
//!
//! ==============================================================================

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use water_feed::{Feed, FeedConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  Water Feed - spreadsheet to dashboard json");
    println!("===========================================================");

    // step 1: load configuration
    let config = FeedConfig::load_or_default();
    config.print_summary();

    // step 2: logging
    init_tracing(&config.logging.level);

    // step 3: output directories and saved cursor
    let feed = Feed::new(config.clone());
    feed.prepare_dirs()?;
    tracing::info!(
        cursor = feed.cursor().cursor,
        interval_seconds = config.polling.interval_seconds,
        "starting spreadsheet polling"
    );

    // step 4: poll until interrupted
    feed.run().await;
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|e| {
        println!("[CONFIG] Warning: invalid log level {:?} ({}) - using info", level, e);
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

//! rcrebuild - rebuild the recent changes feed from scratch.
//!
//! Wipes the `recentchanges` table and regenerates it from the revision,
//! logging and user-group tables, then purges cached feed timestamps.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if rcrebuild::cli::is_verbose() {
        "rcrebuild=info"
    } else {
        "rcrebuild=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Run CLI
    rcrebuild::cli::run().await
}

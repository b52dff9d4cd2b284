use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lexrag::config::Config;
use lexrag::search::{self, SEARCH_TARGETS};

/// Run a search statement against a legal search target and print the
/// retrieved opinions as JSON.
#[derive(Parser, Debug)]
#[command(name = "lexrag", version, about)]
struct Args {
    /// Search statement, e.g. 'caseName:("Kramer v. Kramer")'
    statement: String,

    /// Search target to query
    #[arg(long, default_value = "courtlistener")]
    target: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lexrag=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    info!(target = %args.target, available = ?SEARCH_TARGETS, "configuration loaded");

    let results = search::route_search(&args.target, &args.statement, &config).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

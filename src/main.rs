//! jobdeck command-line entry point.
//!
//! Wires up environment loading and logging, then hands the parsed
//! command line to the dispatcher in the library.

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use jobdeck::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    let _ = dotenvy::dotenv();

    // Logs go to stderr so listing output stays pipeable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    cli::run(Cli::parse()).await
}

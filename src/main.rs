//! socialauth CLI binary entry point.

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use socialauth::cli::errors::format_error_help;
use socialauth::cli::{self, Cli};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();

    let args = Cli::parse();

    if let Err(e) = cli::run(args).await {
        eprintln!("Error: {}", format_error_help(&e));
        std::process::exit(1);
    }
}

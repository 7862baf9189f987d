use clap::Parser;
use tracing_subscriber::EnvFilter;

use smartread::cli::{self, Cli};
use smartread::config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "smartread=debug" } else { "smartread=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut settings = load_settings().await;
    cli.apply_to_settings(&mut settings);

    cli::run(cli, settings).await
}

mod cli;

use clap::Parser;
use cli::Cli;
use harvest_core::{ErrorExt, FileConfigLoader, HarvestError};
use harvest_service::{HarvestContext, HarvestSummary};
use reddit_client::{RedditClient, RedditClientConfig};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "thread_harvest=info,harvest_service=info,reddit_client=info";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    match execute(cli).await {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e.user_friendly_message());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn execute(cli: Cli) -> Result<HarvestSummary, HarvestError> {
    let loader = match &cli.config {
        Some(path) => FileConfigLoader::new(path),
        None => FileConfigLoader::with_default_paths("."),
    }
    .with_overrides(std::env::vars());

    let request = cli.into_request()?;
    let context = HarvestContext::new(&request.strategy);
    tracing::info!(
        "Starting {} harvest (run {})",
        request.strategy.name(),
        context.run_id()
    );

    harvest_service::run(
        &loader,
        |credentials| RedditClient::new(RedditClientConfig::from(credentials)),
        &request,
        &context,
    )
    .await
}

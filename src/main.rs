use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use catalog_translate::cli::{Cli, Commands};
use catalog_translate::config::Config;
use catalog_translate::provider::OpenAiProvider;
use catalog_translate::runner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging; -v raises the crate directive to debug
    let directive = if cli.command.verbose() {
        "catalog_translate=debug"
    } else {
        "catalog_translate=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    // Load configuration from environment
    let config = Config::from_env()?;
    let provider = Arc::new(OpenAiProvider::new(&config));

    match cli.command {
        Commands::Translate(args) => {
            runner::run_translate_files(provider, &config, &args).await?;
        }
        Commands::TranslateText(args) => {
            runner::run_translate_text(provider.as_ref(), &args).await?;
        }
        Commands::Review(args) => {
            runner::run_review_files(provider, &config, &args).await?;
        }
    }

    Ok(())
}

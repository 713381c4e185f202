use anyhow::Result;
use clap::Parser;
use std::path::Path;

use mspace::cli::{self, Cli, Commands};
use mspace::config::{Config, LoggingConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Commands that never read config.toml
    match cli.command {
        Commands::Catalog(args) => return cli::catalog::run(args),
        Commands::Paths => return cli::paths::run(cli.config.as_deref()),
        Commands::Config(args) => {
            init_logging(cli.verbose, &LoggingConfig::default());
            return cli::config::run(args, cli.config.as_deref()).await;
        }
        _ => {}
    }

    let config_path = cli
        .config
        .as_deref()
        .map(|p| shellexpand::tilde(p).to_string());
    let config = Config::load_from(config_path.as_deref().map(Path::new))?;
    init_logging(cli.verbose, &config.logging);

    match cli.command {
        Commands::Visualize(args) => cli::visualize::run(args, &config).await,
        Commands::Generate(args) => cli::generate::run(args, &config).await,
        Commands::Advise(args) => cli::advise::run(args, &config).await,
        Commands::Serve(args) => cli::serve::run(args, &config).await,
        Commands::Catalog(_) | Commands::Paths | Commands::Config(_) => Ok(()),
    }
}

fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let log_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

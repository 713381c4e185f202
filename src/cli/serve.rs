use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::server::Server;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind (overrides server.bind)
    #[arg(long)]
    pub bind: Option<String>,
}

pub async fn run(args: ServeArgs, config: &Config) -> Result<()> {
    let mut config = config.clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    if config.credential().is_none() {
        tracing::warn!("No API key configured; generate requests will fail until one is set");
    }

    let server = Server::new(&config)?;
    server.run().await
}

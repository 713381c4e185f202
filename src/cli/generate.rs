use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::export;
use crate::generation::GeminiClient;
use crate::session::{GenerationOutcome, SessionController};

#[derive(Args)]
pub struct GenerateArgs {
    /// Room to render
    #[arg(long, default_value = "living")]
    pub space: String,

    /// Design style to render it in
    #[arg(long, default_value = "japandi")]
    pub style: String,

    /// Directory to save the PNG into (default: export.dir)
    #[arg(short, long)]
    pub output: Option<String>,
}

pub async fn run(args: GenerateArgs, config: &Config) -> Result<()> {
    let client = Arc::new(GeminiClient::from_config(config)?);
    let controller = SessionController::new(client);

    controller.select_space(&args.space)?;
    controller.select_style(&args.style)?;

    let (space, style) = controller.selection();
    eprintln!("Rendering {} in {} style...", space.name, style.name);

    match controller.trigger_generation().await {
        GenerationOutcome::Resolved { .. } => {}
        GenerationOutcome::Failed { message, .. } => anyhow::bail!(message),
        GenerationOutcome::Ignored => anyhow::bail!("A rendering is already in progress"),
    }

    let dir = args
        .output
        .map(|d| PathBuf::from(shellexpand::tilde(&d).to_string()))
        .unwrap_or_else(|| config.export_dir());
    let path = export::export_current(&controller, &dir, Utc::now())?;

    println!("{}", path.display());
    Ok(())
}

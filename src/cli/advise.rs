use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::generation::GeminiClient;

#[derive(Args)]
pub struct AdviseArgs {
    /// The question for the design consultant
    pub question: String,
}

pub async fn run(args: AdviseArgs, config: &Config) -> Result<()> {
    if args.question.trim().is_empty() {
        anyhow::bail!("Question must not be empty");
    }

    let client = GeminiClient::from_config(config)?;
    let answer = client.advise(&args.question).await;
    println!("{}", answer);
    Ok(())
}

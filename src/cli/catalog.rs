use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::catalog::{SPACES, STYLES};

#[derive(Args)]
pub struct CatalogArgs {
    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Include the full prompts
    #[arg(long)]
    pub prompts: bool,
}

pub fn run(args: CatalogArgs) -> Result<()> {
    if args.format == "json" {
        let value = json!({ "spaces": SPACES, "styles": STYLES });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Spaces:");
    for space in SPACES {
        println!("  {:<12}{}", space.id, space.name);
        if args.prompts {
            print_prompt(space.prompt);
        }
    }
    println!();
    println!("Styles:");
    for style in STYLES {
        println!(
            "  {:<12}{} ({}) {}",
            style.id, style.name, style.accent, style.description
        );
        if args.prompts {
            print_prompt(style.prompt);
        }
    }

    Ok(())
}

fn print_prompt(prompt: &str) {
    for line in prompt.lines() {
        println!("      {}", line);
    }
}

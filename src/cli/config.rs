use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::{self, Config};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show {
        /// Output format: toml (default) or json
        #[arg(short, long, default_value = "toml")]
        format: String,
    },

    /// Get a configuration value
    Get {
        /// Config key (e.g., generation.image_model)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Config key (e.g., server.port)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,

    /// Initialize default config file
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> Result<()> {
    let path = match config_path {
        Some(p) => std::path::PathBuf::from(shellexpand::tilde(p).to_string()),
        None => Config::config_path()?,
    };

    match args.command {
        ConfigCommands::Show { format } => show_config(&path, &format),
        ConfigCommands::Get { key } => get_config(&path, &key),
        ConfigCommands::Set { key, value } => set_config(&path, &key, &value),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Init { force } => init_config(&path, force),
    }
}

fn show_config(path: &std::path::Path, format: &str) -> Result<()> {
    let mut config = Config::load_from(Some(path))?;
    let key = &config.generation.api_key;
    if !key.is_empty() && !key.starts_with('$') {
        config.generation.api_key = "(set)".to_string();
    }

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        _ => {
            let toml = toml::to_string_pretty(&config)?;
            println!("{}", toml);
        }
    }

    Ok(())
}

fn get_config(path: &std::path::Path, key: &str) -> Result<()> {
    let config = Config::load_from(Some(path))?;
    let value = config.get_value(key)?;
    println!("{}", value);
    Ok(())
}

fn set_config(path: &std::path::Path, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_from(Some(path))?;
    config.set_value(key, value)?;
    config.save_to(path)?;
    if key == "generation.api_key" {
        println!("Set {}", key);
    } else {
        println!("Set {} = {}", key, value);
    }
    Ok(())
}

fn init_config(path: &std::path::Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    config::save_template(path)?;

    println!("Created config file at {}", path.display());
    Ok(())
}

//! CLI subcommand: `mspace paths`
//!
//! Prints all resolved XDG-compliant paths for debugging and scripting.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::paths::Paths;

pub fn run(config_path: Option<&str>) -> Result<()> {
    let paths = Paths::resolve()?;
    let config_file = config_path
        .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()))
        .unwrap_or_else(|| paths.config_file());

    println!("MSpace Paths (XDG Base Directory)");
    println!("==================================");
    println!();
    println!("Config:     {}", paths.config_dir.display());
    println!("  config.toml:    {}", config_file.display());
    println!();
    println!("Data:       {}", paths.data_dir.display());
    println!("  exports:        {}", paths.export_dir.display());

    // export.dir in config.toml wins over the XDG default
    if let Ok(config) = Config::from_file(&config_file)
        && config.export_dir() != paths.export_dir
    {
        println!();
        println!("Exports (config.toml): {}", config.export_dir().display());
    }

    Ok(())
}

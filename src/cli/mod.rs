pub mod advise;
pub mod catalog;
pub mod config;
pub mod generate;
pub mod paths;
pub mod serve;
pub mod visualize;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mspace")]
#[command(
    author,
    version,
    about = "Interior design visualizer backed by an image generation model"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(short, long, global = true, env = "MSPACE_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive visualizer session
    Visualize(visualize::VisualizeArgs),

    /// Render one room/style pair and save it
    Generate(generate::GenerateArgs),

    /// List the rooms and design styles
    Catalog(catalog::CatalogArgs),

    /// Ask the design consultant a single question
    Advise(advise::AdviseArgs),

    /// Serve the visualizer over HTTP
    Serve(serve::ServeArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Show resolved XDG directory paths
    Paths,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_with_global_flags() {
        let cli = Cli::try_parse_from([
            "mspace",
            "generate",
            "--space",
            "master",
            "--style",
            "luxury",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.space, "master");
                assert_eq!(args.style, "luxury");
                assert!(args.output.is_none());
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_defaults_to_first_catalog_entries() {
        let cli = Cli::try_parse_from(["mspace", "generate"]).unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.space, "living");
                assert_eq!(args.style, "japandi");
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn serve_port_override() {
        let cli = Cli::try_parse_from(["mspace", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.port, Some(8080)),
            _ => panic!("expected serve"),
        }
    }
}

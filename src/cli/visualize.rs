use anyhow::Result;
use chrono::Utc;
use clap::Args;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::{SPACES, STYLES, SelectionKey};
use crate::commands::{find_command, format_help_text};
use crate::config::Config;
use crate::export;
use crate::generation::GeminiClient;
use crate::session::{GenerationOutcome, Phase, SessionController};

#[derive(Args)]
pub struct VisualizeArgs {
    /// Room to start on
    #[arg(long)]
    pub space: Option<String>,

    /// Style to start on
    #[arg(long)]
    pub style: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Help,
    Quit,
    Spaces,
    Styles,
    Space(String),
    Style(String),
    Generate,
    Status,
    Export(Option<String>),
    Advise(String),
    Usage(&'static str),
    Unknown(String),
}

fn parse_command(input: &str) -> ReplCommand {
    let (word, rest) = match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    };

    let Some(cmd) = find_command(word) else {
        return ReplCommand::Unknown(word.to_string());
    };

    match cmd.name {
        "help" => ReplCommand::Help,
        "quit" => ReplCommand::Quit,
        "spaces" => ReplCommand::Spaces,
        "styles" => ReplCommand::Styles,
        "generate" => ReplCommand::Generate,
        "status" => ReplCommand::Status,
        "space" | "style" | "advise" if rest.is_empty() => ReplCommand::Usage(cmd.usage),
        "space" => ReplCommand::Space(rest.to_string()),
        "style" => ReplCommand::Style(rest.to_string()),
        "advise" => ReplCommand::Advise(rest.to_string()),
        "export" => ReplCommand::Export((!rest.is_empty()).then(|| rest.to_string())),
        other => ReplCommand::Unknown(other.to_string()),
    }
}

pub async fn run(args: VisualizeArgs, config: &Config) -> Result<()> {
    let client = Arc::new(GeminiClient::from_config(config)?);
    let controller = Arc::new(SessionController::new(client.clone()));

    if let Some(space) = args.space.as_deref() {
        controller.select_space(space)?;
    }
    if let Some(style) = args.style.as_deref() {
        controller.select_style(style)?;
    }

    let credential_status = if client.has_credential() {
        ""
    } else {
        " | API key: not set"
    };
    println!(
        "MSpace v{} | Model: {}{}\n",
        env!("CARGO_PKG_VERSION"),
        client.image_model(),
        credential_status
    );
    print_selection(&controller);
    println!("Type /help for commands, /quit to exit\n");

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("mspace> ");

        let input = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break; // Ctrl+D
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let _ = rl.add_history_entry(input);

        if !input.starts_with('/') {
            eprintln!("Commands start with '/'. Type /help for a list.\n");
            continue;
        }

        match parse_command(input) {
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("\n{}\n", format_help_text()),
            ReplCommand::Spaces => {
                let (current, _) = controller.selection();
                println!();
                for space in SPACES {
                    let marker = if space.id == current.id { "*" } else { " " };
                    println!(" {} {:<12}{}", marker, space.id, space.name);
                }
                println!();
            }
            ReplCommand::Styles => {
                let (_, current) = controller.selection();
                println!();
                for style in STYLES {
                    let marker = if style.id == current.id { "*" } else { " " };
                    println!(
                        " {} {:<12}{} - {}",
                        marker, style.id, style.name, style.description
                    );
                }
                println!();
            }
            ReplCommand::Space(id) => match controller.select_space(&id) {
                Ok(()) => print_selection(&controller),
                Err(e) => eprintln!("{}\n", e),
            },
            ReplCommand::Style(id) => match controller.select_style(&id) {
                Ok(()) => print_selection(&controller),
                Err(e) => eprintln!("{}\n", e),
            },
            ReplCommand::Generate => spawn_generation(controller.clone()),
            ReplCommand::Status => print_status(&controller),
            ReplCommand::Export(dir) => {
                let dir = dir
                    .map(|d| PathBuf::from(shellexpand::tilde(&d).to_string()))
                    .unwrap_or_else(|| config.export_dir());
                match export::export_current(&controller, &dir, Utc::now()) {
                    Ok(path) => println!("Saved {}\n", path.display()),
                    Err(e) => eprintln!("Export failed: {}\n", e),
                }
            }
            ReplCommand::Advise(question) => {
                let answer = client.advise(&question).await;
                println!("\n{}\n", answer);
            }
            ReplCommand::Usage(usage) => {
                let word = input.split_whitespace().next().unwrap_or(input);
                eprintln!("Usage: {} {}\n", word, usage);
            }
            ReplCommand::Unknown(word) => {
                eprintln!("Unknown command: {}. Type /help for a list.\n", word);
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Run the request in the background so the selection can change while it is in flight.
fn spawn_generation(controller: Arc<SessionController>) {
    if controller.snapshot().is_busy {
        println!("A rendering is already in progress.\n");
        return;
    }

    let (space, style) = controller.selection();
    println!("Rendering {} in {} style...\n", space.name, style.name);

    tokio::spawn(async move {
        match controller.trigger_generation().await {
            GenerationOutcome::Resolved { key } => {
                println!("\n[{}] rendering ready. /export to save it.", key);
            }
            GenerationOutcome::Failed { key, message, .. } => {
                println!("\n[{}] {}", key, message);
            }
            GenerationOutcome::Ignored => {
                println!("\nA rendering is already in progress.");
            }
        }
    });
}

fn print_selection(controller: &SessionController) {
    let snapshot = controller.snapshot();
    let cached = if snapshot.has_image {
        " (rendering cached)"
    } else {
        ""
    };
    println!(
        "Space: {} | Style: {}{}\n",
        snapshot.space_name, snapshot.style_name, cached
    );
}

fn print_status(controller: &SessionController) {
    let snapshot = controller.snapshot();
    let phase = match snapshot.phase {
        Phase::Idle => "idle",
        Phase::Pending => "rendering",
        Phase::Resolved => "ready",
        Phase::Failed => "failed",
    };

    println!();
    println!("Space:     {} ({})", snapshot.space_name, snapshot.space_id);
    println!("Style:     {} ({})", snapshot.style_name, snapshot.style_id);
    println!("Status:    {}", phase);
    if let Some(error) = &snapshot.last_error {
        println!("Error:     {}", error);
    }
    let cached: Vec<&str> = snapshot.cached.iter().map(SelectionKey::as_str).collect();
    if cached.is_empty() {
        println!("Cached:    none");
    } else {
        println!("Cached:    {}", cached.join(", "));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_selection_commands() {
        assert_eq!(
            parse_command("/space master"),
            ReplCommand::Space("master".to_string())
        );
        assert_eq!(
            parse_command("/style   scandi "),
            ReplCommand::Style("scandi".to_string())
        );
        assert_eq!(parse_command("/g"), ReplCommand::Generate);
    }

    #[test]
    fn missing_argument_yields_usage() {
        assert_eq!(parse_command("/space"), ReplCommand::Usage("<id>"));
        assert_eq!(parse_command("/advise"), ReplCommand::Usage("<question>"));
    }

    #[test]
    fn export_directory_is_optional() {
        assert_eq!(parse_command("/export"), ReplCommand::Export(None));
        assert_eq!(
            parse_command("/export ~/Desktop"),
            ReplCommand::Export(Some("~/Desktop".to_string()))
        );
    }

    #[test]
    fn advise_keeps_the_whole_question() {
        assert_eq!(
            parse_command("/advise what rug suits a grey sofa?"),
            ReplCommand::Advise("what rug suits a grey sofa?".to_string())
        );
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            parse_command("/memory"),
            ReplCommand::Unknown("/memory".to_string())
        );
    }
}

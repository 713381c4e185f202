//! Slash command definitions for the interactive visualizer.

/// A slash command definition.
pub struct SlashCommand {
    pub name: &'static str,
    pub description: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
}

impl SlashCommand {
    pub fn matches(&self, word: &str) -> bool {
        let word = word.strip_prefix('/').unwrap_or(word);
        self.name == word || self.aliases.contains(&word)
    }

    /// Format as a help line, e.g. "  /help, /h, /?     - Show this help"
    fn help_line(&self) -> String {
        let mut names = format!("/{}", self.name);
        for alias in self.aliases {
            names.push_str(&format!(", /{}", alias));
        }
        if !self.usage.is_empty() {
            names.push_str(&format!(" {}", self.usage));
        }
        format!("  {:<24}- {}", names, self.description)
    }
}

pub const COMMANDS: &[SlashCommand] = &[
    SlashCommand {
        name: "help",
        description: "Show available commands",
        aliases: &["h", "?"],
        usage: "",
    },
    SlashCommand {
        name: "quit",
        description: "Exit the visualizer",
        aliases: &["exit", "q"],
        usage: "",
    },
    SlashCommand {
        name: "spaces",
        description: "List rooms",
        aliases: &[],
        usage: "",
    },
    SlashCommand {
        name: "styles",
        description: "List design styles",
        aliases: &[],
        usage: "",
    },
    SlashCommand {
        name: "space",
        description: "Select a room",
        aliases: &[],
        usage: "<id>",
    },
    SlashCommand {
        name: "style",
        description: "Select a design style",
        aliases: &[],
        usage: "<id>",
    },
    SlashCommand {
        name: "generate",
        description: "Render the current room in the current style",
        aliases: &["g"],
        usage: "",
    },
    SlashCommand {
        name: "status",
        description: "Show selection, cache and last error",
        aliases: &[],
        usage: "",
    },
    SlashCommand {
        name: "export",
        description: "Save the current rendering as PNG",
        aliases: &[],
        usage: "[dir]",
    },
    SlashCommand {
        name: "advise",
        description: "Ask the design consultant a question",
        aliases: &[],
        usage: "<question>",
    },
];

/// Look up a command by its name or an alias, with or without the leading slash.
pub fn find_command(word: &str) -> Option<&'static SlashCommand> {
    COMMANDS.iter().find(|cmd| cmd.matches(word))
}

pub fn format_help_text() -> String {
    let mut lines = vec!["Commands:".to_string()];
    for cmd in COMMANDS {
        lines.push(cmd.help_line());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_command() {
        assert_eq!(find_command("/g").map(|c| c.name), Some("generate"));
        assert_eq!(find_command("exit").map(|c| c.name), Some("quit"));
        assert!(find_command("/attach").is_none());
    }

    #[test]
    fn help_lists_every_command_with_usage() {
        let help = format_help_text();
        assert!(help.starts_with("Commands:"));
        assert_eq!(help.lines().count(), COMMANDS.len() + 1);
        assert!(help.contains("/export [dir]"));
    }
}

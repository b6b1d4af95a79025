//! Command handler for REPL built-in commands
//!
//! Commands start with `/`; anything else is an accident description.

use colored::*;

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Reload,
    Context { enable: Option<bool> },
    Clear,
    Exit,
    Unknown { input: String },
}

/// Check whether input is a built-in command
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}

/// Parses commands and holds the toggles they control
pub struct CommandHandler {
    show_context: bool,
}

impl CommandHandler {
    /// Create new command handler
    pub fn new() -> Self {
        CommandHandler { show_context: false }
    }

    /// Parse input string into a command
    pub fn parse(&self, input: &str) -> Command {
        let trimmed = input.trim();

        // Not a command if doesn't start with /
        if !trimmed.starts_with('/') {
            return Command::Unknown {
                input: input.to_string(),
            };
        }

        let parts: Vec<&str> = trimmed[1..].split_whitespace().collect();
        if parts.is_empty() {
            return Command::Unknown {
                input: input.to_string(),
            };
        }

        match parts[0].to_lowercase().as_str() {
            "help" | "h" => Command::Help,
            "exit" | "quit" | "q" => Command::Exit,
            "status" => Command::Status,
            "reload" => Command::Reload,
            "context" | "ctx" => {
                let enable = parts.get(1).and_then(|s| match s.to_lowercase().as_str() {
                    "on" | "1" | "true" => Some(true),
                    "off" | "0" | "false" => Some(false),
                    _ => None,
                });
                Command::Context { enable }
            }
            "clear" | "cls" => Command::Clear,
            _ => Command::Unknown {
                input: input.to_string(),
            },
        }
    }

    /// Apply a `/context` command; returns the new setting
    pub fn toggle_context(&mut self, enable: Option<bool>) -> bool {
        self.show_context = enable.unwrap_or(!self.show_context);
        self.show_context
    }

    /// Whether retrieved cases are printed before answers
    pub fn show_context(&self) -> bool {
        self.show_context
    }

    /// Display help information
    pub fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());

        let commands = [
            ("/help, /h", "Show this help message"),
            ("/status", "Show case count and index state"),
            ("/reload", "Re-read the case file and rebuild the index"),
            ("/context [on|off]", "Toggle printing of retrieved cases"),
            ("/clear, /cls", "Clear screen"),
            ("/exit, /quit, /q", "Exit REPL"),
        ];

        for (cmd, desc) in commands {
            println!("  {:<20} {}", cmd.green(), desc);
        }

        println!("\n{}", "Usage:".bold());
        println!("  - 사고 상황을 그대로 입력하세요 (예: 신호 위반으로 교차로에서 충돌한 상황)");
        println!("  - Use {} for input history", "UP/DOWN arrows".cyan());
        println!("  - Press {} or {} to exit", "Ctrl-D".cyan(), "/exit".cyan());
        println!();
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_command() {
        assert!(is_command("/help"));
        assert!(is_command("  /exit"));
        assert!(!is_command("교차로 충돌"));
        assert!(!is_command(""));
    }

    #[test]
    fn test_parse_basic_commands() {
        let handler = CommandHandler::new();
        assert_eq!(handler.parse("/help"), Command::Help);
        assert_eq!(handler.parse("/h"), Command::Help);
        assert_eq!(handler.parse("/exit"), Command::Exit);
        assert_eq!(handler.parse("/QUIT"), Command::Exit);
        assert_eq!(handler.parse("/status"), Command::Status);
        assert_eq!(handler.parse("/reload"), Command::Reload);
        assert_eq!(handler.parse("/cls"), Command::Clear);
    }

    #[test]
    fn test_parse_context_argument() {
        let handler = CommandHandler::new();
        assert_eq!(handler.parse("/context"), Command::Context { enable: None });
        assert_eq!(
            handler.parse("/ctx on"),
            Command::Context { enable: Some(true) }
        );
        assert_eq!(
            handler.parse("/context off"),
            Command::Context { enable: Some(false) }
        );
    }

    #[test]
    fn test_parse_unknown() {
        let handler = CommandHandler::new();
        assert!(matches!(handler.parse("/foo"), Command::Unknown { .. }));
        assert!(matches!(handler.parse("/"), Command::Unknown { .. }));
        assert!(matches!(handler.parse("no slash"), Command::Unknown { .. }));
    }

    #[test]
    fn test_toggle_context() {
        let mut handler = CommandHandler::new();
        assert!(!handler.show_context());
        assert!(handler.toggle_context(None));
        assert!(!handler.toggle_context(None));
        assert!(handler.toggle_context(Some(true)));
        assert!(handler.toggle_context(Some(true)));
        assert!(!handler.toggle_context(Some(false)));
    }
}

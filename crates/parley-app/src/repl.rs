//! Line handling for the interactive loop.

/// What one line of terminal input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Talk to the bot.
    Say(String),
    /// Print the current session's statements.
    History,
    /// List known sessions.
    Sessions,
    /// Forget every conversation.
    Reset,
    Help,
    Quit,
    /// Blank line.
    Nothing,
    Unknown(String),
}

pub const HELP: &str = "Commands: /history, /sessions, /reset, /help, /quit. Anything else is said to the bot.";

/// Classify a line. Only a leading `/` starts a command.
pub fn parse_line(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Nothing;
    }
    let Some(cmd) = trimmed.strip_prefix('/') else {
        return Command::Say(trimmed.to_string());
    };
    match cmd.to_ascii_lowercase().as_str() {
        "history" => Command::History,
        "sessions" => Command::Sessions,
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

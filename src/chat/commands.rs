//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the client and is never sent to the
//! service as a question.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Pick a file and upload it.
    Upload(String),

    /// Show the upload status.
    Status,

    /// Show the sources of the latest answer.
    Sources,

    /// Print the whole transcript again.
    History,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a question.
///
/// # Examples
///
/// ```
/// # use docchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/upload report.pdf").is_some());
/// assert!(parse_command("What is the project name?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "upload" | "u" => match argument {
            Some(path) => ChatCommand::Upload(unquote(path).to_string()),
            None => ChatCommand::Invalid("/upload requires a file path".to_string()),
        },
        "status" => ChatCommand::Status,
        "sources" => ChatCommand::Sources,
        "history" => ChatCommand::History,
        "stats" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Strips one pair of matching quotes, so paths with spaces can be pasted.
fn unquote(path: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = path
            .strip_prefix(quote)
            .and_then(|p| p.strip_suffix(quote))
        {
            return inner;
        }
    }
    path
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /upload <file>         Upload a document (.pdf or .docx)
  /status                Show the upload status
  /sources               Show the sources of the latest answer
  /history               Print the conversation again
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat
Anything else is sent as a question about the uploaded document."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_upload() {
        assert_eq!(
            parse_command("/upload report.pdf"),
            Some(ChatCommand::Upload("report.pdf".to_string()))
        );
        assert_eq!(
            parse_command("/UPLOAD   ~/docs/plan.docx  "),
            Some(ChatCommand::Upload("~/docs/plan.docx".to_string()))
        );
        assert_eq!(
            parse_command("/upload \"My Report.pdf\""),
            Some(ChatCommand::Upload("My Report.pdf".to_string()))
        );
        assert_eq!(
            parse_command("/u 'a b.pdf'"),
            Some(ChatCommand::Upload("a b.pdf".to_string()))
        );
        assert_eq!(
            parse_command("/upload"),
            Some(ChatCommand::Invalid(
                "/upload requires a file path".to_string()
            ))
        );
    }

    #[test]
    fn parse_views() {
        assert_eq!(parse_command("/status"), Some(ChatCommand::Status));
        assert_eq!(parse_command("/sources"), Some(ChatCommand::Sources));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn parse_unknown() {
        assert!(matches!(
            parse_command("/model sonar-pro"),
            Some(ChatCommand::Invalid(msg)) if msg == "Unknown command: /model"
        ));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("What is in chapter 2?"), None);
        assert_eq!(parse_command("a/b"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/upload"));
        assert!(help.contains("/quit"));
        assert!(help.contains("/sources"));
    }
}

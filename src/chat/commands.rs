//! Slash command parsing for the chat application.
//!
//! Commands start with `/` and control the session; they are never sent to
//! the provider.

/// Which layer of the instruction bundle `/prompts` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptLayer {
    /// Rules and knowledge, exactly as sent.
    Both,
    /// The behavioural rules only.
    Rules,
    /// The domain knowledge only.
    Knowledge,
}

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// List the suggested questions, or stage the one with this 1-based number.
    Suggest(Option<usize>),

    /// Show the instruction bundle.
    Prompts(PromptLayer),

    /// Set the auto-save transcript path.
    TranscriptPath(String),

    /// Clear the auto-save transcript path.
    ClearTranscriptPath,

    /// Save the transcript to a specific file immediately.
    SaveTranscript(String),

    /// Load conversation history from a file.
    LoadTranscript(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use champlain_guide::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/suggest 2").is_some());
/// assert!(parse_command("What should I take after CSI-140?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "suggest" => match argument {
            None => ChatCommand::Suggest(None),
            Some(arg) => match arg.parse::<usize>() {
                Ok(n) if n > 0 => ChatCommand::Suggest(Some(n)),
                _ => ChatCommand::Invalid("/suggest expects a question number".to_string()),
            },
        },
        "prompts" => match argument.map(str::to_lowercase).as_deref() {
            None => ChatCommand::Prompts(PromptLayer::Both),
            Some("rules") => ChatCommand::Prompts(PromptLayer::Rules),
            Some("knowledge") => ChatCommand::Prompts(PromptLayer::Knowledge),
            Some(_) => {
                ChatCommand::Invalid("/prompts expects 'rules' or 'knowledge'".to_string())
            }
        },
        "transcript" => match argument {
            Some(arg) if arg.eq_ignore_ascii_case("clear") => ChatCommand::ClearTranscriptPath,
            Some(arg) => ChatCommand::TranscriptPath(arg.to_string()),
            None => ChatCommand::Invalid("/transcript requires a file path".to_string()),
        },
        "save" => match argument {
            Some(arg) => ChatCommand::SaveTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/save requires a file path".to_string()),
        },
        "load" => match argument {
            Some(arg) => ChatCommand::LoadTranscript(arg.to_string()),
            None => ChatCommand::Invalid("/load requires a file path".to_string()),
        },
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history
  /suggest [n]           List suggested questions, or pre-fill question n
  /prompts [layer]       Show the instructions ('rules' or 'knowledge')
  /transcript <file>     Enable auto-saving transcripts (or 'clear')
  /save <file>           Save the current transcript immediately
  /load <file>           Load a transcript from disk
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
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
    fn parse_clear() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
    }

    #[test]
    fn parse_suggest() {
        assert_eq!(parse_command("/suggest"), Some(ChatCommand::Suggest(None)));
        assert_eq!(
            parse_command("/suggest 3"),
            Some(ChatCommand::Suggest(Some(3)))
        );
        assert!(matches!(
            parse_command("/suggest 0"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("number")
        ));
        assert!(matches!(
            parse_command("/suggest two"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_prompts() {
        assert_eq!(
            parse_command("/prompts"),
            Some(ChatCommand::Prompts(PromptLayer::Both))
        );
        assert_eq!(
            parse_command("/prompts Rules"),
            Some(ChatCommand::Prompts(PromptLayer::Rules))
        );
        assert_eq!(
            parse_command("/prompts knowledge"),
            Some(ChatCommand::Prompts(PromptLayer::Knowledge))
        );
        assert!(matches!(
            parse_command("/prompts other"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_transcript_commands() {
        assert_eq!(
            parse_command("/transcript chat.json"),
            Some(ChatCommand::TranscriptPath("chat.json".to_string()))
        );
        assert_eq!(
            parse_command("/transcript clear"),
            Some(ChatCommand::ClearTranscriptPath)
        );
        assert_eq!(
            parse_command("/save session.json"),
            Some(ChatCommand::SaveTranscript("session.json".to_string()))
        );
        assert_eq!(
            parse_command("/load session.json"),
            Some(ChatCommand::LoadTranscript("session.json".to_string()))
        );
        assert_eq!(
            parse_command("/save"),
            Some(ChatCommand::Invalid("/save requires a file path".to_string()))
        );
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model claude-haiku-4-5"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("Is CSI-240/SEC-250 allowed?"), None);
    }

    #[test]
    fn help_text_lists_commands() {
        let help = help_text();
        for command in ["/clear", "/suggest", "/prompts", "/stats", "/quit"] {
            assert!(help.contains(command), "missing {command}");
        }
    }
}

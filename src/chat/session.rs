//! Core chat session management.
//!
//! A [`ChatSession`] wires a [`Conversation`] to a [`CompletionClient`] and a
//! [`Renderer`], and carries out slash commands.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::chat::commands::{ChatCommand, PromptLayer, help_text};
use crate::chat::config::ChatConfig;
use crate::client::Anthropic;
use crate::completion::{CompletionBackend, CompletionClient};
use crate::conversation::{Conversation, Rejection, SubmitOutcome};
use crate::error::Result;
use crate::render::{CoursePattern, Renderer, render_message};
use crate::types::{Model, Role};

/// Shown with the welcome screen.
pub const DISCLAIMER: &str = "ChamplainGuide is an AI assistant. Always verify course info with \
                              your official academic advisor and the registrar.";

/// Whether the REPL should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Keep going.
    Continue,
    /// The user asked to leave.
    Quit,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: Model,
    /// The maximum tokens per response.
    pub max_tokens: u32,
    /// The number of turns in the conversation.
    pub turn_count: usize,
    /// Total number of API requests made.
    pub total_requests: u64,
    /// Replies replaced by a canned fallback.
    pub fallback_replies: u64,
    /// Replies dropped because the conversation was cleared first.
    pub stale_replies: u64,
    /// Total input tokens across all requests.
    pub total_input_tokens: u64,
    /// Total output tokens across all requests.
    pub total_output_tokens: u64,
    /// The auto-save transcript path, if set.
    pub transcript_path: Option<PathBuf>,
}

/// A chat session that manages conversation state and API interactions.
pub struct ChatSession<B: CompletionBackend = Anthropic> {
    client: CompletionClient<B>,
    conversation: Conversation,
    courses: CoursePattern,
    transcript_path: Option<PathBuf>,
}

impl<B: CompletionBackend> ChatSession<B> {
    /// Creates a new chat session around a completion client.
    pub fn new(client: CompletionClient<B>, config: &ChatConfig) -> Self {
        let courses = CoursePattern::new(client.instructions().course_prefixes().to_vec());
        Self {
            client,
            conversation: Conversation::new(),
            courses,
            transcript_path: config.transcript_path.clone(),
        }
    }

    /// The underlying conversation.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Removes and returns the staged suggestion, to pre-fill the next prompt.
    pub fn take_staged(&mut self) -> Option<String> {
        self.conversation.take_staged()
    }

    /// Shows the welcome screen when nothing has been said yet.
    pub fn print_welcome(&self, renderer: &mut dyn Renderer) {
        if !self.conversation.is_empty() {
            return;
        }
        let instructions = self.client.instructions();
        renderer.print_welcome(
            &format!("Welcome to ChamplainGuide ({})", instructions.name()),
            instructions.suggestions(),
        );
        renderer.print_info(DISCLAIMER);
    }

    /// Sends a user message and prints the reply.
    ///
    /// # Errors
    ///
    /// Only the transcript auto-save can fail; the reply is in the transcript
    /// and on screen either way.
    pub async fn send(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<SubmitOutcome> {
        let pending = match self.conversation.begin_submit(user_input) {
            Ok(pending) => pending,
            Err(rejection) => {
                if rejection == Rejection::Busy {
                    renderer.print_error("Still waiting for the previous reply.");
                }
                return Ok(SubmitOutcome::Rejected(rejection));
            }
        };

        renderer.start_waiting();
        let reply = self.client.complete(pending.transcript()).await;
        renderer.finish_waiting();

        let outcome = self.conversation.finish_submit(pending, reply);
        match &outcome {
            SubmitOutcome::Replied(reply) => {
                renderer.print_assistant_turn(&render_message(&reply.text, &self.courses));
                self.auto_save_transcript()?;
            }
            SubmitOutcome::Stale(_) => {
                renderer.print_info("Conversation was cleared; discarding the late reply.");
            }
            SubmitOutcome::Rejected(_) => {}
        }
        Ok(outcome)
    }

    /// Carries out a slash command.
    pub fn handle_command(
        &mut self,
        command: ChatCommand,
        renderer: &mut dyn Renderer,
    ) -> CommandOutcome {
        match command {
            ChatCommand::Quit => return CommandOutcome::Quit,
            ChatCommand::Clear => {
                self.conversation.clear();
                renderer.print_info("Conversation cleared.");
                self.print_welcome(renderer);
            }
            ChatCommand::Help => renderer.print_info(help_text()),
            ChatCommand::Suggest(None) => {
                let suggestions = self.client.instructions().suggestions();
                if suggestions.is_empty() {
                    renderer.print_info("No suggested questions.");
                } else {
                    let mut text = String::from("Suggested questions:");
                    for (index, suggestion) in suggestions.iter().enumerate() {
                        let _ = write!(text, "\n  {}. {suggestion}", index + 1);
                    }
                    renderer.print_info(&text);
                }
            }
            ChatCommand::Suggest(Some(number)) => {
                let suggestions = self.client.instructions().suggestions();
                match self
                    .conversation
                    .select_suggestion(suggestions, number.saturating_sub(1))
                {
                    Some(_) => renderer.print_info("Suggestion ready; edit it or press Enter."),
                    None => renderer.print_error(&format!(
                        "There is no suggestion {number}; there are {}.",
                        suggestions.len()
                    )),
                }
            }
            ChatCommand::Prompts(layer) => renderer.print_info(&self.describe_prompts(layer)),
            ChatCommand::TranscriptPath(path) => {
                renderer.print_info(&format!("Transcript auto-save set to {path}"));
                self.transcript_path = Some(PathBuf::from(path));
            }
            ChatCommand::ClearTranscriptPath => {
                self.transcript_path = None;
                renderer.print_info("Transcript auto-save disabled.");
            }
            ChatCommand::SaveTranscript(path) => {
                match self.conversation.save_transcript_to(&path) {
                    Ok(()) => renderer.print_info(&format!("Transcript saved to {path}")),
                    Err(err) => renderer.print_error(&format!("Failed to save transcript: {err}")),
                }
            }
            ChatCommand::LoadTranscript(path) => {
                match self.conversation.load_transcript_from(&path) {
                    Ok(()) => {
                        renderer.print_info(&format!("Transcript loaded from {path}"));
                        self.replay(renderer);
                    }
                    Err(err) => renderer.print_error(&format!("Failed to load transcript: {err}")),
                }
            }
            ChatCommand::Stats => renderer.print_info(&describe_stats(&self.stats())),
            ChatCommand::Invalid(message) => renderer.print_error(&message),
        }
        CommandOutcome::Continue
    }

    /// Returns the configured transcript path, if any.
    pub fn transcript_path(&self) -> Option<&Path> {
        self.transcript_path.as_deref()
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let stats = self.conversation.stats();
        SessionStats {
            model: self.client.model().clone(),
            max_tokens: self.client.max_tokens(),
            turn_count: stats.turns,
            total_requests: stats.requests,
            fallback_replies: stats.fallbacks,
            stale_replies: stats.stale_replies,
            total_input_tokens: stats.total_usage.input_tokens,
            total_output_tokens: stats.total_usage.output_tokens,
            transcript_path: self.transcript_path.clone(),
        }
    }

    fn describe_prompts(&self, layer: PromptLayer) -> String {
        let instructions = self.client.instructions();
        match layer {
            PromptLayer::Both => format!(
                "System prompt (as sent on every request):\n\n{}",
                instructions.system_prompt()
            ),
            PromptLayer::Rules => format!(
                "Rules: behavior, tone and constraints (constant across subjects)\n\n{}",
                instructions.rules()
            ),
            PromptLayer::Knowledge => format!(
                "Knowledge: {} (swap for different programs)\n\n{}",
                instructions.name(),
                instructions.knowledge()
            ),
        }
    }

    fn replay(&self, renderer: &mut dyn Renderer) {
        for turn in self.conversation.transcript() {
            match turn.role() {
                Role::User => renderer.print_user_turn(turn.content()),
                Role::Assistant => {
                    renderer.print_assistant_turn(&render_message(turn.content(), &self.courses))
                }
            }
        }
    }

    fn auto_save_transcript(&self) -> Result<()> {
        if let Some(path) = &self.transcript_path {
            self.conversation.save_transcript_to(path)
        } else {
            Ok(())
        }
    }
}

fn describe_stats(stats: &SessionStats) -> String {
    let mut text = String::from("Session Statistics:");
    let _ = write!(text, "\n  Model: {}", stats.model);
    let _ = write!(text, "\n  Max tokens: {}", stats.max_tokens);
    let _ = write!(text, "\n  Turns: {}", stats.turn_count);
    let _ = write!(
        text,
        "\n  Total tokens: {} in / {} out ({} requests)",
        stats.total_input_tokens, stats.total_output_tokens, stats.total_requests
    );
    let _ = write!(text, "\n  Fallback replies: {}", stats.fallback_replies);
    if stats.stale_replies > 0 {
        let _ = write!(text, "\n  Discarded late replies: {}", stats.stale_replies);
    }
    match &stats.transcript_path {
        Some(path) => {
            let _ = write!(text, "\n  Transcript file: {}", path.display());
        }
        None => text.push_str("\n  Transcript file: (disabled)"),
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::testing::ScriptedBackend;
    use crate::completion::{CONNECTION_FALLBACK, Reply};
    use crate::instructions::InstructionBundle;
    use crate::render::{Block, Span};
    use crate::types::Turn;

    #[derive(Default)]
    struct RecordingRenderer {
        events: Vec<String>,
        blocks: Vec<Vec<Block>>,
    }

    impl Renderer for RecordingRenderer {
        fn print_welcome(&mut self, title: &str, suggestions: &[String]) {
            self.events
                .push(format!("welcome: {title} ({} suggestions)", suggestions.len()));
        }

        fn print_user_turn(&mut self, text: &str) {
            self.events.push(format!("user: {text}"));
        }

        fn print_assistant_turn(&mut self, blocks: &[Block]) {
            self.events.push("assistant".to_string());
            self.blocks.push(blocks.to_vec());
        }

        fn print_error(&mut self, error: &str) {
            self.events.push(format!("error: {error}"));
        }

        fn print_info(&mut self, info: &str) {
            self.events.push(format!("info: {info}"));
        }

        fn start_waiting(&mut self) {
            self.events.push("waiting".to_string());
        }

        fn finish_waiting(&mut self) {
            self.events.push("done".to_string());
        }
    }

    fn session(backend: ScriptedBackend) -> ChatSession<ScriptedBackend> {
        let client = CompletionClient::new(backend, InstructionBundle::builtin());
        ChatSession::new(client, &ChatConfig::new())
    }

    #[tokio::test]
    async fn send_renders_reply() {
        let mut session = session(ScriptedBackend::answering(&["Take CSI-240 next."]));
        let mut renderer = RecordingRenderer::default();

        let outcome = session.send("What next?", &mut renderer).await.unwrap();
        assert!(outcome.appended().is_some());
        assert_eq!(renderer.events, ["waiting", "done", "assistant"]);
        assert_eq!(
            renderer.blocks[0],
            [Block::Paragraph(vec![
                Span::Plain("Take ".to_string()),
                Span::Code("CSI-240".to_string()),
                Span::Plain(" next.".to_string()),
            ])]
        );
        assert_eq!(session.conversation().len(), 2);
    }

    #[tokio::test]
    async fn blank_input_does_nothing() {
        let mut session = session(ScriptedBackend::default());
        let mut renderer = RecordingRenderer::default();

        let outcome = session.send("   ", &mut renderer).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Rejected(Rejection::Empty));
        assert!(renderer.events.is_empty());
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn failure_shows_connection_fallback() {
        let mut session = session(ScriptedBackend::default());
        let mut renderer = RecordingRenderer::default();

        session.send("Hello?", &mut renderer).await.unwrap();
        assert_eq!(
            session.conversation().transcript()[1],
            Turn::assistant(CONNECTION_FALLBACK)
        );
        assert_eq!(session.stats().fallback_replies, 1);
    }

    #[tokio::test]
    async fn auto_save_writes_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto.json");
        let mut session = session(ScriptedBackend::answering(&["Sure."]));
        let mut renderer = RecordingRenderer::default();
        session.handle_command(
            ChatCommand::TranscriptPath(path.display().to_string()),
            &mut renderer,
        );

        session.send("Help me plan", &mut renderer).await.unwrap();

        let mut restored = Conversation::new();
        restored.load_transcript_from(&path).unwrap();
        assert_eq!(
            restored.transcript(),
            [Turn::user("Help me plan"), Turn::assistant("Sure.")]
        );
    }

    #[test]
    fn suggest_stages_text() {
        let mut session = session(ScriptedBackend::default());
        let mut renderer = RecordingRenderer::default();

        session.handle_command(ChatCommand::Suggest(Some(1)), &mut renderer);
        assert_eq!(
            session.take_staged().as_deref(),
            Some("What courses should I take as a freshman CS major?")
        );
        assert!(session.conversation().is_empty());

        session.handle_command(ChatCommand::Suggest(Some(9)), &mut renderer);
        assert!(session.take_staged().is_none());
        assert!(renderer.events.last().unwrap().starts_with("error:"));
    }

    #[test]
    fn clear_shows_welcome_again() {
        let mut session = session(ScriptedBackend::default());
        let mut renderer = RecordingRenderer::default();
        let pending = session.conversation.begin_submit("hi").unwrap();
        session.conversation.finish_submit(
            pending,
            Reply {
                text: "hello".to_string(),
                kind: crate::completion::ReplyKind::Answered,
                usage: None,
            },
        );

        session.handle_command(ChatCommand::Clear, &mut renderer);
        assert!(session.conversation().is_empty());
        assert_eq!(renderer.events[0], "info: Conversation cleared.");
        assert!(renderer.events[1].starts_with("welcome: Welcome to ChamplainGuide"));
    }

    #[test]
    fn prompts_show_layers() {
        let mut session = session(ScriptedBackend::default());
        let mut renderer = RecordingRenderer::default();

        session.handle_command(ChatCommand::Prompts(PromptLayer::Knowledge), &mut renderer);
        assert!(renderer.events[0].contains("SUBJECT CONTEXT"));
        assert!(!renderer.events[0].contains("You are ChamplainGuide"));
    }

    #[test]
    fn quit_stops_loop() {
        let mut session = session(ScriptedBackend::default());
        let mut renderer = RecordingRenderer::default();
        assert_eq!(
            session.handle_command(ChatCommand::Quit, &mut renderer),
            CommandOutcome::Quit
        );
        assert_eq!(
            session.handle_command(ChatCommand::Stats, &mut renderer),
            CommandOutcome::Continue
        );
        assert!(renderer.events[0].contains("Turns: 0"));
    }

    #[test]
    fn load_replays_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.json");
        std::fs::write(
            &path,
            r#"{"version":1,"turns":[{"role":"user","content":"hi"},{"role":"assistant","content":"- MAT-210"}]}"#,
        )
        .unwrap();

        let mut session = session(ScriptedBackend::default());
        let mut renderer = RecordingRenderer::default();
        session.handle_command(
            ChatCommand::LoadTranscript(path.display().to_string()),
            &mut renderer,
        );
        assert_eq!(renderer.events[1..], ["user: hi", "assistant"]);
        assert_eq!(
            renderer.blocks[0],
            [Block::Bullet(vec![Span::Code("MAT-210".to_string())])]
        );
    }
}

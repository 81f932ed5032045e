//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.  Nothing here reads the
//! environment; the API key is handed in by the caller.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::{Anthropic, DEFAULT_API_URL};
use crate::completion::{CompletionClient, DEFAULT_MAX_TOKENS};
use crate::error::Result;
use crate::instructions::InstructionBundle;
use crate::types::Model;

/// Command-line arguments for the champlain-guide tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: claude-sonnet-4-20250514)", "MODEL")]
    pub model: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: 1024)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// API base URL.
    #[arrrg(optional, "API base URL (default: https://api.anthropic.com/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: wait indefinitely)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// YAML instruction bundle.
    #[arrrg(optional, "Instruction bundle YAML file (default: built-in)", "FILE")]
    pub instructions: Option<String>,

    /// Transcript auto-save path.
    #[arrrg(optional, "Save the transcript here after every reply", "FILE")]
    pub transcript: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// Maximum tokens per response.
    pub max_tokens: u32,

    /// Base URL the messages endpoint is resolved against.
    pub base_url: String,

    /// Per-request timeout.  `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Path to persist transcripts automatically after each assistant turn.
    pub transcript_path: Option<PathBuf>,

    /// Instruction bundle file; the built-in bundle when `None`.
    pub instructions_path: Option<PathBuf>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: claude-sonnet-4-20250514
    /// - Max tokens: 1024
    /// - Base URL: the public API
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: DEFAULT_API_URL.to_string(),
            timeout: None,
            use_color: true,
            transcript_path: None,
            instructions_path: None,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the transcript auto-save path.
    pub fn with_transcript_path(mut self, path: Option<PathBuf>) -> Self {
        self.transcript_path = path;
        self
    }

    /// Sets the instruction bundle file.
    pub fn with_instructions_path(mut self, path: Option<PathBuf>) -> Self {
        self.instructions_path = path;
        self
    }

    /// Loads the configured instruction bundle.
    pub fn instruction_bundle(&self) -> Result<InstructionBundle> {
        match &self.instructions_path {
            Some(path) => InstructionBundle::from_file(path),
            None => Ok(InstructionBundle::builtin()),
        }
    }

    /// Builds the completion client for this configuration.
    pub fn completion_client(
        &self,
        api_key: impl Into<String>,
        instructions: InstructionBundle,
    ) -> Result<CompletionClient> {
        let backend = Anthropic::with_options(api_key, Some(&self.base_url), self.timeout)?;
        Ok(CompletionClient::new(backend, instructions)
            .with_model(self.model.clone())
            .with_max_tokens(self.max_tokens))
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            model: args.model.map(Model::from).unwrap_or(defaults.model),
            max_tokens: args.max_tokens.unwrap_or(defaults.max_tokens),
            base_url: args.base_url.unwrap_or(defaults.base_url),
            timeout: args.timeout_secs.map(Duration::from_secs),
            use_color: !args.no_color,
            transcript_path: args.transcript.map(PathBuf::from),
            instructions_path: args.instructions.map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::ClaudeSonnet4_20250514));
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.base_url, "https://api.anthropic.com/v1/");
        assert!(config.timeout.is_none());
        assert!(config.use_color);
        assert!(config.transcript_path.is_none());
        assert!(config.instructions_path.is_none());
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config.model, Model::default());
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(config.use_color);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("claude-haiku-4-5".to_string()),
            max_tokens: Some(512),
            base_url: Some("http://localhost:8080/v1".to_string()),
            timeout_secs: Some(30),
            instructions: Some("physics.yaml".to_string()),
            transcript: Some("chat.json".to_string()),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.model, Model::Known(KnownModel::ClaudeHaiku45));
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.instructions_path, Some(PathBuf::from("physics.yaml")));
        assert_eq!(config.transcript_path, Some(PathBuf::from("chat.json")));
        assert!(!config.use_color);
    }

    #[test]
    fn unknown_model_is_custom() {
        let args = ChatArgs {
            model: Some("my-finetune".to_string()),
            ..ChatArgs::default()
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.model, Model::Custom("my-finetune".to_string()));
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_model(Model::Known(KnownModel::ClaudeSonnet40))
            .with_max_tokens(2048)
            .with_base_url("http://127.0.0.1:9999/")
            .with_timeout(Some(Duration::from_secs(5)))
            .without_color()
            .with_transcript_path(Some(PathBuf::from("transcript.json")))
            .with_instructions_path(Some(PathBuf::from("bundle.yaml")));

        assert_eq!(config.model, Model::Known(KnownModel::ClaudeSonnet40));
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.base_url, "http://127.0.0.1:9999/");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(!config.use_color);
        assert_eq!(
            config.transcript_path,
            Some(PathBuf::from("transcript.json"))
        );
        assert_eq!(config.instructions_path, Some(PathBuf::from("bundle.yaml")));
    }

    #[test]
    fn builds_completion_client() {
        let config = ChatConfig::new()
            .with_base_url("http://127.0.0.1:9999/v1")
            .with_max_tokens(64);
        let bundle = config.instruction_bundle().unwrap();
        let client = config.completion_client("", bundle).unwrap();
        assert_eq!(client.max_tokens(), 64);
        assert_eq!(client.model(), &Model::default());
        assert_eq!(client.instructions(), &InstructionBundle::builtin());
    }

    #[test]
    fn missing_instruction_file_is_an_error() {
        let config =
            ChatConfig::new().with_instructions_path(Some(PathBuf::from("/nonexistent.yaml")));
        assert!(config.instruction_bundle().is_err());
    }
}

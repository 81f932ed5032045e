//! Interactive academic-counselor chat in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Built-in Champlain College CS & Cybersecurity instructions
//! ANTHROPIC_API_KEY=... champlain-guide
//!
//! # Swap in another program's knowledge
//! champlain-guide --instructions physics.yaml
//!
//! # Keep a transcript and disable colors (useful for piping output)
//! champlain-guide --transcript chat.json --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/suggest [n]` - List suggested questions or pre-fill one
//! - `/clear` - Clear conversation history
//! - `/prompts [rules|knowledge]` - Show the instructions
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use champlain_guide::chat::{
    ChatArgs, ChatConfig, ChatSession, CommandOutcome, PlainTextRenderer, Renderer, parse_command,
};

/// Main entry point for the champlain-guide application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("champlain-guide [OPTIONS]");
    let config = ChatConfig::from(args);

    // The only place the environment is consulted; an unset key is sent empty.
    let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
    let instructions = config.instruction_bundle()?;
    let client = config.completion_client(api_key, instructions)?;
    tracing::info!(model = %client.model(), "starting chat");

    let mut session = ChatSession::new(client, &config);
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    println!("ChamplainGuide: 24/7 Course Scheduling Counselor (CS & Cybersecurity)");
    println!("Type /help for commands, /quit to exit\n");
    session.print_welcome(&mut renderer);

    loop {
        let staged = session.take_staged().unwrap_or_default();
        let readline = rl.readline_with_initial("You: ", (&staged, ""));

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    if session.handle_command(cmd, &mut renderer) == CommandOutcome::Quit {
                        println!("Goodbye!");
                        break;
                    }
                    continue;
                }

                if let Err(e) = session.send(line, &mut renderer).await {
                    renderer.print_error(&e.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

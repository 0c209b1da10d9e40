//! CLI channel: stdin/stdout REPL for local testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;
use crate::flow::{Button, ENHANCE_BUTTON, RESET_BUTTON, UserInput};

/// A simple CLI channel that reads from stdin and writes to stdout.
///
/// Buttons are printed as `[/command] label`; typing the command presses it.
#[derive(Default)]
pub struct CliChannel {
    /// Buttons offered by the last reply, so `/skip` knows which stage it skips.
    offered: Arc<Mutex<Vec<Button>>>,
}

impl CliChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Command the user types to press `button`.
fn command_for(button: &Button) -> String {
    match button.data.as_str() {
        RESET_BUTTON => "/start".to_string(),
        ENHANCE_BUTTON => "/enhance".to_string(),
        _ => "/skip".to_string(),
    }
}

/// Map one input line to a user event.
///
/// `/enhance` and `/skip` press the matching button from `offered`; a
/// `/<stage code>` presses that stage's skip button directly. Everything
/// else goes through [`UserInput::from_text`].
fn parse_cli_line(line: &str, offered: &[Button]) -> UserInput {
    match line {
        "/enhance" => return UserInput::Button(ENHANCE_BUTTON.to_string()),
        "/skip" => {
            let data = offered
                .iter()
                .find(|b| b.data != RESET_BUTTON && b.data != ENHANCE_BUTTON)
                .map(|b| b.data.clone())
                .unwrap_or_else(|| "skip".to_string());
            return UserInput::Button(data);
        }
        _ => {}
    }

    if let Some(code) = line.strip_prefix('/') {
        if code.parse::<crate::flow::Stage>().is_ok() && code != RESET_BUTTON {
            return UserInput::Button(code.to_string());
        }
    }

    UserInput::from_text(line)
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let offered = Arc::clone(&self.offered);

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprintln!("Type /start to begin.");
            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let input = match offered.lock() {
                            Ok(buttons) => parse_cli_line(&line, &buttons),
                            Err(_) => UserInput::from_text(&line),
                        };
                        let msg = IncomingMessage::new("cli", "local-user", input);
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let render = response.render;
        for text in &render.messages {
            println!("\n{}", text);
        }
        for button in &render.buttons {
            println!("  [{}] {}", command_for(button), button.label);
        }
        println!();

        if let Ok(mut offered) = self.offered.lock() {
            *offered = render.buttons;
        }
        eprint!("> ");
        Ok(())
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        _metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        let StatusUpdate::Thinking(msg) = status;
        eprintln!("⏳ {}", msg);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

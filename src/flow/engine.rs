//! Stage transitions: moves a conversation one step per user event.

use serde::{Deserialize, Serialize};

use super::stage::Stage;
use super::state::ConversationState;

/// Callback data of the "Start again" button.
pub const RESET_BUTTON: &str = "start";

/// Callback data of the "Perfect my prompt" button.
pub const ENHANCE_BUTTON: &str = "openai";

/// A user event delivered by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UserInput {
    /// The user typed an answer.
    Text(String),
    /// The user pressed a button; carries its callback data.
    Button(String),
}

impl UserInput {
    /// Build an input from typed text, mapping the `/start` and `/cancel`
    /// commands to the reset button.
    pub fn from_text(text: &str) -> Self {
        let command = text
            .split_whitespace()
            .next()
            .and_then(|word| word.strip_prefix('/'))
            .map(|cmd| cmd.split('@').next().unwrap_or(cmd));
        match command {
            Some("start") | Some("cancel") => Self::Button(RESET_BUTTON.to_string()),
            _ => Self::Text(text.to_string()),
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Button(data) if data == RESET_BUTTON)
    }

    pub fn is_enhance(&self) -> bool {
        matches!(self, Self::Button(data) if data == ENHANCE_BUTTON)
    }
}

/// Apply one user event to `state` and return the stage the user is now in.
///
/// - The reset button clears the state from any stage and returns Start.
/// - Text is recorded verbatim for the current stage.
/// - The skip button of a skippable current stage records the skip sentinel.
/// - Finalize never advances; enhancement is triggered elsewhere.
/// - Any other button leaves the state untouched.
pub fn advance(state: &mut ConversationState, input: &UserInput) -> Stage {
    if input.is_reset() {
        tracing::debug!(from = %state.current_stage, "Conversation reset");
        state.reset();
        return Stage::Start;
    }

    let current = state.current_stage;
    let Some(next) = current.next() else {
        return current;
    };

    match input {
        UserInput::Text(text) => state.record(current, text.clone()),
        UserInput::Button(data) if current.is_skippable() && data == current.code() => {
            state.record_skip(current)
        }
        UserInput::Button(data) => {
            tracing::debug!(stage = %current, button = %data, "Ignoring stale button");
            return current;
        }
    }

    state.current_stage = next;
    tracing::debug!(from = %current, to = %next, "Stage advanced");
    next
}

//! Render instructions: what a channel should show after each step.

use super::assembler::CHOOSE_PROMPT;
use super::engine::{ENHANCE_BUTTON, RESET_BUTTON};
use super::stage::Stage;
use crate::error::FlowError;

pub const DRAFT_HEADER: &str = "This is your request in draft form:\n";
pub const ENHANCED_HEADER: &str =
    "This is your prompt enhanced. You can copy it and paste it in ChatGPT.";
pub const EMPTY_SUMMARY_MESSAGE: &str = "Something went wrong. Please try again.";
pub const BANNED_CONTENT_MESSAGE: &str =
    "Your prompt contains banned content and it cannot be processed.";

/// A button offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// Callback data sent back when pressed.
    pub data: String,
}

impl Button {
    pub fn reset() -> Self {
        Self {
            label: "🏠️ Start again".to_string(),
            data: RESET_BUTTON.to_string(),
        }
    }

    pub fn skip(stage: Stage) -> Self {
        Self {
            label: "⏩️ Skip this step".to_string(),
            data: stage.code().to_string(),
        }
    }

    pub fn enhance() -> Self {
        Self {
            label: "🧙‍♂️️ Perfect my prompt".to_string(),
            data: ENHANCE_BUTTON.to_string(),
        }
    }
}

/// Ordered messages to send, with buttons attached to the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderInstruction {
    pub messages: Vec<String>,
    pub buttons: Vec<Button>,
}

impl RenderInstruction {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
            buttons: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append the instruction of `other` after this one.
    pub fn then(mut self, other: RenderInstruction) -> Self {
        self.messages.extend(other.messages);
        self.buttons = other.buttons;
        self
    }
}

/// Buttons available while the user is at `stage`.
pub fn buttons_for(stage: Stage) -> Vec<Button> {
    let mut buttons = Vec::new();
    if stage != Stage::Start {
        buttons.push(Button::reset());
    }
    if stage.is_skippable() {
        buttons.push(Button::skip(stage));
    }
    if stage == Stage::Finalize {
        buttons.push(Button::enhance());
    }
    buttons
}

/// `"Examples: \n- a\n- b"`.
pub fn examples_text(stage: Stage) -> String {
    format!("Examples: \n- {}", stage.examples().join("\n- "))
}

/// The keyboard message alone, for re-offering the current stage's buttons.
pub fn keyboard(stage: Stage) -> RenderInstruction {
    RenderInstruction {
        messages: vec![CHOOSE_PROMPT.to_string()],
        buttons: buttons_for(stage),
    }
}

/// Question screen shown when a stage is entered.
///
/// Start shows the welcome text followed by the Goal question. Finalize has
/// no question screen; see [`draft_screen`].
pub fn stage_screen(stage: Stage) -> RenderInstruction {
    if stage == Stage::Start {
        return RenderInstruction::text(stage.prompt_text().join(". "))
            .then(stage_screen(Stage::Goal));
    }

    RenderInstruction {
        messages: vec![stage.prompt_text().join(". "), examples_text(stage)],
        buttons: Vec::new(),
    }
    .then(keyboard(stage))
}

/// Draft summary shown when the user reaches Finalize.
pub fn draft_screen(summary: &str) -> RenderInstruction {
    RenderInstruction {
        messages: vec![DRAFT_HEADER.to_string(), summary.to_string()],
        buttons: Vec::new(),
    }
    .then(keyboard(Stage::Finalize))
}

/// Result screen after a successful enhancement.
pub fn enhanced_screen(generated: &str) -> RenderInstruction {
    RenderInstruction {
        messages: vec![ENHANCED_HEADER.to_string(), generated.to_string()],
        buttons: vec![Button::reset()],
    }
}

/// User-visible outcome of a flow error.
pub fn error_screen(err: &FlowError) -> RenderInstruction {
    match err {
        FlowError::EmptySummary => RenderInstruction {
            messages: vec![EMPTY_SUMMARY_MESSAGE.to_string()],
            buttons: vec![Button::reset()],
        },
        FlowError::FlaggedContent => RenderInstruction {
            messages: vec![BANNED_CONTENT_MESSAGE.to_string()],
            buttons: vec![Button::reset()],
        },
        FlowError::ModerationFailure(_) | FlowError::EnhancementFailure(_) => RenderInstruction {
            messages: vec![err.to_string()],
            buttons: buttons_for(Stage::Finalize),
        },
    }
}

//! Prompt assembly: folds collected answers into the draft prompt.

use super::stage::SUMMARY_ORDER;
use super::state::{Answers, SKIP_SENTINEL};

/// Instruction shown above the buttons of every question.
///
/// An answer equal to it counts as skipped.
pub const CHOOSE_PROMPT: &str = "Choose an option or enter your answer:";

/// Draft prompt built from a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledPrompt {
    /// One `"{label} {answer}"` line per answered stage.
    pub summary: String,
    /// One suggestion line per skipped stage that has a suggestion.
    pub enhancement: String,
}

impl AssembledPrompt {
    /// An empty summary means nothing usable was collected.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }
}

/// Whether an answer value means "no answer given".
pub fn is_skipped(value: &str) -> bool {
    value == SKIP_SENTINEL || value == CHOOSE_PROMPT
}

/// Build the summary and enhancement texts from `answers`.
///
/// Lines follow the fixed summary order regardless of how `answers` was
/// filled. Stages without an answer contribute nothing.
pub fn assemble(answers: &Answers) -> AssembledPrompt {
    let mut assembled = AssembledPrompt::default();

    for stage in SUMMARY_ORDER {
        let Some(value) = answers.get(&stage) else {
            continue;
        };
        if !is_skipped(value) {
            if let Some(label) = stage.summary_label() {
                assembled.summary.push_str(&format!("{label} {value}\n"));
            }
        } else if let Some(suggestion) = stage.skip_suggestion() {
            assembled.enhancement.push_str(&format!("{suggestion}\n"));
        }
    }

    tracing::debug!(
        summary_len = assembled.summary.len(),
        enhancement_len = assembled.enhancement.len(),
        "Prompt assembled"
    );
    assembled
}

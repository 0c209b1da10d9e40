//! Per-user conversation record.

use std::collections::BTreeMap;

use super::stage::Stage;

/// Answer recorded for a stage the user chose to skip.
pub const SKIP_SENTINEL: &str = "None";

/// Collected answers keyed by stage.
///
/// Iterates in stage order, which is also the order the user answers in.
pub type Answers = BTreeMap<Stage, String>;

/// State of one user's walk through the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Stage whose answer the next input provides.
    pub current_stage: Stage,
    /// Answers collected so far.
    pub answers: Answers,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every answer and go back to the welcome stage.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.current_stage = Stage::Start;
    }

    /// Leave the welcome stage for the first question.
    ///
    /// The welcome screen already carries the Goal prompt, so no answer is
    /// recorded for Start. No-op on any other stage.
    pub fn open_form(&mut self) {
        if self.current_stage == Stage::Start {
            self.current_stage = Stage::Goal;
        }
    }

    /// Insert or overwrite the answer for `stage`.
    pub fn record(&mut self, stage: Stage, answer: impl Into<String>) {
        self.answers.insert(stage, answer.into());
    }

    /// Record the skip sentinel for `stage`.
    pub fn record_skip(&mut self, stage: Stage) {
        self.record(stage, SKIP_SENTINEL);
    }

    pub fn answer(&self, stage: Stage) -> Option<&str> {
        self.answers.get(&stage).map(String::as_str)
    }

    /// Whether nothing has happened in this session yet.
    pub fn is_fresh(&self) -> bool {
        self.current_stage == Stage::Start && self.answers.is_empty()
    }
}

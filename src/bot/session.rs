//! One conversation step: apply a user event and decide what to show.

use crate::error::FlowError;
use crate::flow::render::{
    draft_screen, enhanced_screen, error_screen, keyboard, stage_screen,
};
use crate::flow::{
    ConversationState, RESET_BUTTON, RenderInstruction, Stage, UserInput, advance, assemble,
    perfect_prompt,
};
use crate::llm::PromptService;

/// Whether handling `input` will call the LLM service.
pub fn wants_enhancement(state: &ConversationState, input: &UserInput) -> bool {
    state.current_stage == Stage::Finalize && input.is_enhance()
}

/// Apply `input` to `state` and return what the user should see next.
///
/// A session that has seen nothing yet shows the welcome screen whatever the
/// input was.
pub async fn respond_to(
    state: &mut ConversationState,
    input: &UserInput,
    service: &dyn PromptService,
) -> RenderInstruction {
    if wants_enhancement(state, input) {
        return match perfect_prompt(service, &state.answers).await {
            Ok(generated) => enhanced_screen(&generated),
            Err(err) => {
                tracing::warn!("Enhancement failed: {}", err);
                if matches!(err, FlowError::EmptySummary) {
                    state.reset();
                }
                error_screen(&err)
            }
        };
    }

    let reset = UserInput::Button(RESET_BUTTON.to_string());
    let input = if state.is_fresh() && !input.is_reset() {
        &reset
    } else {
        input
    };

    let previous = state.current_stage;
    let stage = advance(state, input);

    match stage {
        Stage::Start => {
            state.open_form();
            stage_screen(Stage::Start)
        }
        _ if stage == previous => keyboard(stage),
        Stage::Finalize => {
            let draft = assemble(&state.answers);
            if draft.is_empty() {
                tracing::warn!("Reached the draft with an empty summary, resetting");
                state.reset();
                error_screen(&FlowError::EmptySummary)
            } else {
                draft_screen(&draft.summary)
            }
        }
        _ => {
            tracing::info!(stage = %stage, "Stage entered");
            stage_screen(stage)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::flow::render::{BANNED_CONTENT_MESSAGE, DRAFT_HEADER, EMPTY_SUMMARY_MESSAGE, ENHANCED_HEADER};
    use crate::flow::{CHOOSE_PROMPT, ENHANCE_BUTTON};

    #[derive(Default)]
    struct StubService {
        flagged: bool,
        moderation_down: bool,
        enhancement_down: bool,
        calls: AtomicUsize,
    }

    fn unavailable() -> LlmError {
        LlmError::RequestFailed {
            provider: "openai".into(),
            reason: "503 Service Unavailable".into(),
        }
    }

    #[async_trait]
    impl PromptService for StubService {
        fn model_name(&self) -> &str {
            "stub"
        }

        async fn moderate(&self, _prompt: &str) -> Result<bool, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.moderation_down {
                return Err(unavailable());
            }
            Ok(self.flagged)
        }

        async fn enhance(
            &self,
            _instruction: &str,
            prompt: &str,
            _enhancement: &str,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.enhancement_down {
                return Err(unavailable());
            }
            Ok(format!("Enhanced: {prompt}"))
        }
    }

    fn text(s: &str) -> UserInput {
        UserInput::Text(s.to_string())
    }

    fn button(s: &str) -> UserInput {
        UserInput::Button(s.to_string())
    }

    async fn step(state: &mut ConversationState, input: UserInput) -> RenderInstruction {
        respond_to(state, &input, &StubService::default()).await
    }

    /// Answer every question up to the draft, skipping optional ones when `skip` is set.
    async fn walk_to_draft(state: &mut ConversationState, skip: bool) -> RenderInstruction {
        step(state, button(RESET_BUTTON)).await;
        let mut last = RenderInstruction::default();
        while state.current_stage != Stage::Finalize {
            let stage = state.current_stage;
            let input = if skip && stage.is_skippable() {
                button(stage.code())
            } else {
                text(&format!("answer for {stage}"))
            };
            last = step(state, input).await;
        }
        last
    }

    #[tokio::test]
    async fn fresh_session_shows_welcome_for_any_input() {
        let mut state = ConversationState::new();
        let screen = step(&mut state, text("hello")).await;
        assert!(screen.messages[0].starts_with("🤖️ Welcome!"));
        assert_eq!(state.current_stage, Stage::Goal);
        assert!(state.answers.is_empty());
    }

    #[tokio::test]
    async fn answer_moves_to_next_question() {
        let mut state = ConversationState::new();
        step(&mut state, button(RESET_BUTTON)).await;
        let screen = step(&mut state, text("Learn Excel")).await;
        assert!(screen.messages[0].contains("Persona & Style"));
        assert_eq!(state.current_stage, Stage::Persona);
        assert_eq!(state.answer(Stage::Goal), Some("Learn Excel"));
    }

    #[tokio::test]
    async fn stale_button_reoffers_keyboard() {
        let mut state = ConversationState::new();
        step(&mut state, button(RESET_BUTTON)).await;
        let screen = step(&mut state, button("tool")).await;
        assert_eq!(screen.messages, vec![CHOOSE_PROMPT]);
        assert_eq!(state.current_stage, Stage::Goal);
    }

    #[tokio::test]
    async fn reaching_finalize_shows_draft() {
        let mut state = ConversationState::new();
        let screen = walk_to_draft(&mut state, true).await;
        assert_eq!(screen.messages[0], DRAFT_HEADER);
        assert!(screen.messages[1].starts_with("My goal is: answer for goal\n"));
        let data: Vec<&str> = screen.buttons.iter().map(|b| b.data.as_str()).collect();
        assert_eq!(data, vec!["start", ENHANCE_BUTTON]);
    }

    #[tokio::test]
    async fn empty_draft_resets() {
        let mut state = ConversationState::new();
        step(&mut state, button(RESET_BUTTON)).await;
        for stage in [Stage::Goal, Stage::Persona, Stage::Task, Stage::Whom] {
            assert_eq!(state.current_stage, stage);
            step(&mut state, text("None")).await;
        }
        let mut last = RenderInstruction::default();
        while state.current_stage != Stage::Start {
            let code = state.current_stage.code();
            last = step(&mut state, button(code)).await;
        }
        assert_eq!(last.messages, vec![EMPTY_SUMMARY_MESSAGE]);
        assert!(state.is_fresh());
    }

    #[tokio::test]
    async fn enhance_at_finalize_calls_service() {
        let mut state = ConversationState::new();
        walk_to_draft(&mut state, false).await;

        let svc = StubService::default();
        let screen = respond_to(&mut state, &button(ENHANCE_BUTTON), &svc).await;
        assert_eq!(screen.messages[0], ENHANCED_HEADER);
        assert!(screen.messages[1].starts_with("Enhanced: My goal is: answer for goal"));
        assert_eq!(svc.calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.current_stage, Stage::Finalize);
    }

    #[tokio::test]
    async fn flagged_prompt_stays_at_finalize() {
        let mut state = ConversationState::new();
        walk_to_draft(&mut state, false).await;

        let svc = StubService {
            flagged: true,
            ..Default::default()
        };
        let screen = respond_to(&mut state, &button(ENHANCE_BUTTON), &svc).await;
        assert_eq!(screen.messages, vec![BANNED_CONTENT_MESSAGE]);
        assert_eq!(svc.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.current_stage, Stage::Finalize);
    }

    /// A failed backend call shows the error with both draft buttons, keeps
    /// the draft, and a later press against a healthy backend succeeds.
    async fn assert_failure_keeps_draft(svc: StubService, expected: &str) {
        let mut state = ConversationState::new();
        walk_to_draft(&mut state, false).await;
        let answers = state.answers.clone();

        let screen = respond_to(&mut state, &button(ENHANCE_BUTTON), &svc).await;
        assert_eq!(screen.messages.len(), 1);
        assert!(screen.messages[0].starts_with(expected), "{:?}", screen.messages);
        assert!(screen.messages[0].contains("503 Service Unavailable"));
        let data: Vec<&str> = screen.buttons.iter().map(|b| b.data.as_str()).collect();
        assert_eq!(data, vec![RESET_BUTTON, ENHANCE_BUTTON]);
        assert_eq!(state.current_stage, Stage::Finalize);
        assert_eq!(state.answers, answers);

        let healthy = StubService::default();
        let retry = respond_to(&mut state, &button(ENHANCE_BUTTON), &healthy).await;
        assert_eq!(retry.messages[0], ENHANCED_HEADER);
        assert!(retry.messages[1].starts_with("Enhanced: My goal is: answer for goal"));
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.answers, answers);
    }

    #[tokio::test]
    async fn moderation_failure_keeps_draft_for_retry() {
        let svc = StubService {
            moderation_down: true,
            ..Default::default()
        };
        assert_failure_keeps_draft(svc, "Moderation failed").await;
    }

    #[tokio::test]
    async fn enhancement_failure_keeps_draft_for_retry() {
        let svc = StubService {
            enhancement_down: true,
            ..Default::default()
        };
        assert_failure_keeps_draft(svc, "Enhancement failed").await;
    }

    #[tokio::test]
    async fn enhance_before_finalize_does_nothing() {
        let mut state = ConversationState::new();
        step(&mut state, button(RESET_BUTTON)).await;
        let svc = StubService::default();
        assert!(!wants_enhancement(&state, &button(ENHANCE_BUTTON)));
        respond_to(&mut state, &button(ENHANCE_BUTTON), &svc).await;
        assert_eq!(svc.calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.current_stage, Stage::Goal);
    }

    #[tokio::test]
    async fn text_at_finalize_reoffers_keyboard() {
        let mut state = ConversationState::new();
        walk_to_draft(&mut state, false).await;
        let answers = state.answers.clone();
        let screen = step(&mut state, text("more")).await;
        assert_eq!(screen.messages, vec![CHOOSE_PROMPT]);
        assert_eq!(state.answers, answers);
    }
}

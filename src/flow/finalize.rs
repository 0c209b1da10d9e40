//! Finalization: moderate, then enhance, the assembled draft.

use super::assembler::assemble;
use super::state::Answers;
use crate::error::FlowError;
use crate::llm::{ENHANCEMENT_INSTRUCTION, PromptService};

/// Turn the collected answers into an enhanced prompt.
///
/// Moderation runs first; a flagged draft never reaches the enhancement
/// call. Nothing is retried.
pub async fn perfect_prompt(
    service: &dyn PromptService,
    answers: &Answers,
) -> Result<String, FlowError> {
    let draft = assemble(answers);
    if draft.is_empty() {
        return Err(FlowError::EmptySummary);
    }

    let flagged = service
        .moderate(&draft.summary)
        .await
        .map_err(FlowError::ModerationFailure)?;
    if flagged {
        tracing::info!("Draft prompt flagged by moderation");
        return Err(FlowError::FlaggedContent);
    }

    let generated = service
        .enhance(ENHANCEMENT_INSTRUCTION, &draft.summary, &draft.enhancement)
        .await
        .map_err(FlowError::EnhancementFailure)?;

    tracing::info!(chars = generated.len(), "Prompt enhanced");
    Ok(generated)
}

//! Fixed instructions sent to the text-generation backend.

/// System directive for rewriting a draft prompt.
pub const ENHANCEMENT_INSTRUCTION: &str = "\
Your objective is to refine a draft prompt provided by the user. \
Your task is to optimize the prompt for clarity, completeness, and effectiveness, ensuring that it is \
perfectly understandable by ChatGPT. If the draft prompt lacks essential information, your role is to fill in \
the gaps appropriately. The final output should be a single paragraph, not exceeding 500 words, and formatted \
in plain text. The audience for the enhanced prompt is ChatGPT itself, so the language should be tailored to \
what the model can understand best. Please adhere strictly to these guidelines to ensure the highest quality \
output. Don't answer the question directly. Your task is to generate a prompt that ChatGPT can use to answer \
the question. Think step by step. The draft prompt will be enclosed within angle brackets <>.";

/// Enclose the draft in the delimiters the instruction refers to, so the
/// model treats it as data rather than as a request to carry out.
pub fn wrap_draft(prompt: &str) -> String {
    format!("<{prompt}>")
}

/// Build the system preamble: the instruction, then the gap-filling hints.
pub fn enhancement_preamble(instruction: &str, enhancement: &str) -> String {
    let hints = enhancement.trim();
    if hints.is_empty() {
        instruction.to_string()
    } else {
        format!("{instruction}\n\n{hints}")
    }
}

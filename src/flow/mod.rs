//! Conversation flow: the fixed question sequence that builds a prompt.
//!
//! The user answers one question per stage. Answers accumulate in a
//! `ConversationState`; once the last question is answered they are
//! assembled into a draft prompt, which can then be moderated and enhanced.

pub mod assembler;
pub mod engine;
pub mod finalize;
pub mod render;
pub mod stage;
pub mod state;

pub use assembler::{AssembledPrompt, CHOOSE_PROMPT, assemble};
pub use engine::{ENHANCE_BUTTON, RESET_BUTTON, UserInput, advance};
pub use finalize::perfect_prompt;
pub use render::{Button, RenderInstruction};
pub use stage::{SUMMARY_ORDER, Stage};
pub use state::{Answers, ConversationState, SKIP_SENTINEL};

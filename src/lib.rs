//! Prompt Enhancer Bot: builds a ChatGPT prompt through a guided conversation.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod flow;
pub mod llm;

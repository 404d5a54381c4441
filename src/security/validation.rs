//! Request input validation
//!
//! Lengths are counted in characters, not bytes.

use crate::error::RouterError;
use crate::types::Message;

/// Upper bounds on request payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_input_chars: usize,
    pub max_system_prompt_chars: usize,
    pub max_chat_messages: usize,
}

impl Limits {
    pub const DEFAULT: Limits = Limits {
        max_input_chars: 32_000,
        max_system_prompt_chars: 10_000,
        max_chat_messages: 100,
    };
}

impl Default for Limits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn check_length(field: &str, text: &str, max: usize) -> Result<(), RouterError> {
    let len = text.chars().count();
    if len == 0 {
        return Err(RouterError::Validation(format!("{} must not be empty", field)));
    }
    if len > max {
        return Err(RouterError::Validation(format!(
            "{} is too long ({} characters, at most {})",
            field, len, max
        )));
    }
    Ok(())
}

/// User input for a single turn: 1..=32000 characters
pub fn validate_input(input: &str) -> Result<(), RouterError> {
    check_length("input", input, Limits::DEFAULT.max_input_chars)
}

/// Agent system prompt: 1..=10000 characters
pub fn validate_system_prompt(prompt: &str) -> Result<(), RouterError> {
    check_length("systemPrompt", prompt, Limits::DEFAULT.max_system_prompt_chars)
}

/// Raw chat transcript: 1..=100 messages, each 1..=32000 characters
pub fn validate_history(messages: &[Message]) -> Result<(), RouterError> {
    let limits = Limits::DEFAULT;
    if messages.is_empty() {
        return Err(RouterError::Validation("messages must not be empty".to_string()));
    }
    if messages.len() > limits.max_chat_messages {
        return Err(RouterError::Validation(format!(
            "too many messages ({}, at most {})",
            messages.len(),
            limits.max_chat_messages
        )));
    }
    for (i, msg) in messages.iter().enumerate() {
        check_length(&format!("messages[{}].content", i), &msg.content, limits.max_input_chars)?;
    }
    Ok(())
}

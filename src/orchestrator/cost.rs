//! Token and cost estimation

use serde::{Deserialize, Serialize};

use crate::orchestrator::catalog::Model;
use crate::types::Message;

/// Tokens attributed to each prior message in the conversation
pub const TOKENS_PER_HISTORY_MESSAGE: u64 = 200;

/// Upper bound on the expected completion length
pub const MAX_ESTIMATED_OUTPUT_TOKENS: u64 = 2000;

/// Token counts, either estimated or reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

fn with_expected_output(input_tokens: u64) -> TokenUsage {
    let output_tokens = (input_tokens * 2).min(MAX_ESTIMATED_OUTPUT_TOKENS);
    TokenUsage { input: input_tokens, output: output_tokens }
}

/// Rough token estimate (about 4 characters per token) for a request
pub fn estimate_tokens(input: &str, message_count: usize) -> TokenUsage {
    let chars = input.chars().count() as u64;
    with_expected_output(chars.div_ceil(4) + message_count as u64 * TOKENS_PER_HISTORY_MESSAGE)
}

/// Same estimate over a full transcript whose text is known
pub fn estimate_transcript_tokens(messages: &[Message]) -> TokenUsage {
    let chars: u64 = messages.iter().map(|m| m.content.chars().count() as u64).sum();
    with_expected_output(chars.div_ceil(4))
}

/// USD cost of `input_tokens` + `output_tokens` at the model's rates
pub fn estimate_cost(input_tokens: u64, output_tokens: u64, model: &Model) -> f64 {
    (input_tokens as f64 / 1000.0) * model.cost_per_1k_input
        + (output_tokens as f64 / 1000.0) * model.cost_per_1k_output
}

/// USD cost of a usage record
pub fn usage_cost(usage: TokenUsage, model: &Model) -> f64 {
    estimate_cost(usage.input, usage.output, model)
}

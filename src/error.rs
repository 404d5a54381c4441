//! Domain errors
//!
//! I/O and provider paths use `anyhow`; these are the conditions callers
//! are expected to match on (the HTTP layer maps them to status codes).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    /// A model catalog must hold at least one model
    #[error("model catalog is empty")]
    EmptyCatalog,

    /// The classifier was handed no agents to choose from
    #[error("no agents available for classification")]
    NoAgents,

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("budget exceeded: estimated ${estimated} with ${remaining} left today")]
    BudgetExceeded {
        estimated: rust_decimal::Decimal,
        remaining: rust_decimal::Decimal,
    },

    #[error("agent not found: {0}")]
    AgentNotFound(String),
}

//! OurArk - cost-aware LLM routing library
//!
//! - Complexity-tiered model routing over a fixed OpenRouter catalog
//! - Keyword-based agent classification for the master agent
//! - Budget tracking with exact decimal arithmetic
//! - Agent execution against OpenRouter
//! - HTTP API with per-client rate limiting
//!
//! # Example
//!
//! ```
//! use ourark::orchestrator::{classify_task_for_agent, route_to_model};
//! use ourark::orchestrator::registry::builtin_agents;
//!
//! let decision = route_to_model("Hallo!", 0, None, None);
//! assert_eq!(decision.model.id, "gpt-4o-mini");
//!
//! let agent = classify_task_for_agent("Bitte debug meinen Code", builtin_agents()).unwrap();
//! assert_eq!(agent.agent_id, "agent-nova");
//! ```

pub mod types;
pub mod error;
pub mod orchestrator;
pub mod agent;
pub mod config;
pub mod security;
pub mod server;
pub mod cli;

// Re-export commonly used types for convenience
pub use agent::{AgentExecutor, CompletionProvider, ExecutionResult, OpenRouterClient};
pub use config::Config;
pub use error::RouterError;
pub use orchestrator::{
    classify_task_for_agent, route_to_model, AgentClassifier, AgentDefinition, AgentRegistry,
    BudgetManager, ComplexityTier, Model, ModelCatalog, ModelRouter, RoutingDecision,
};
pub use security::{delete_api_key, get_api_key, set_api_key};
pub use server::{start as start_server, ServerState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - LLM router and agent dispatcher", NAME, VERSION)
}

/// Truncate to at most `max_bytes` without splitting a UTF-8 character
pub fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

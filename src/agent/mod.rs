//! Agent module - LLM provider access and task execution

pub mod executor;
pub mod llm;

use anyhow::{Context, Result};
use std::sync::Arc;

pub use executor::{AgentExecutor, DispatchResult, ExecuteError, ExecutionResult};
pub use llm::{Completion, CompletionProvider, CompletionRequest, OpenRouterClient, ProviderError};

use crate::config::Config;
use crate::orchestrator::{AgentClassifier, BudgetManager, ModelRouter};

/// Build an executor wired to OpenRouter from configuration
///
/// Fails when no API key is available.
pub fn executor_from_config(config: &Config, budget: BudgetManager) -> Result<AgentExecutor> {
    let client = OpenRouterClient::from_config(&config.openrouter)?;
    executor_with_provider(config, Arc::new(client), budget)
}

/// Build an executor around any completion provider
pub fn executor_with_provider(
    config: &Config,
    provider: Arc<dyn CompletionProvider>,
    budget: BudgetManager,
) -> Result<AgentExecutor> {
    let router = ModelRouter::from_config(&config.routing).context("Invalid routing configuration")?;
    let classifier =
        AgentClassifier::from_config(&config.classifier.rules).context("Invalid classifier rules")?;

    Ok(AgentExecutor::new(provider)
        .with_router(router)
        .with_classifier(classifier)
        .with_budget(budget)
        .with_history_window(config.routing.history_window)
        .with_max_tokens(config.openrouter.max_tokens)
        .with_default_model(config.routing.default_model.as_str()))
}

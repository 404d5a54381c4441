//! Agent task execution
//!
//! Routes a request to a model, checks the budget, calls the completion
//! provider and records what the call cost.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::llm::{CompletionProvider, CompletionRequest, ProviderError};
use crate::error::RouterError;
use crate::orchestrator::budget::BudgetManager;
use crate::orchestrator::classifier::{AgentClassifier, Classification};
use crate::orchestrator::cost::{usage_cost, TokenUsage};
use crate::orchestrator::router::{ModelRouter, AUTO_MODEL};
use crate::orchestrator::AgentDefinition;
use crate::security::validation;
use crate::types::Message;

/// Why an execution did not produce a completion
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Outcome of one agent task
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub task_id: String,
    pub agent_id: String,
    pub content: String,
    /// Display name of the routed model
    pub model: String,
    /// Catalog id of the routed model
    pub model_id: String,
    pub usage: TokenUsage,
    pub cost: f64,
    /// Wall-clock milliseconds spent in the provider call
    pub duration: u64,
    pub routing_reason: String,
    pub created_at: chrono::DateTime<Utc>,
}

/// Result of classify-then-execute
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub classification: Classification,
    pub result: ExecutionResult,
}

/// Runs agent tasks against a completion provider
#[derive(Clone)]
pub struct AgentExecutor {
    router: ModelRouter,
    classifier: AgentClassifier,
    budget: BudgetManager,
    provider: Arc<dyn CompletionProvider>,
    history_window: usize,
    max_tokens: Option<u32>,
    /// Last fallback of the model hint chain
    default_model: String,
}

impl AgentExecutor {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            router: ModelRouter::new(),
            classifier: AgentClassifier::builtin(),
            budget: BudgetManager::new(),
            provider,
            history_window: 20,
            max_tokens: None,
            default_model: AUTO_MODEL.to_string(),
        }
    }

    pub fn with_router(mut self, router: ModelRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_classifier(mut self, classifier: AgentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_budget(mut self, budget: BudgetManager) -> Self {
        self.budget = budget;
        self
    }

    /// Number of prior messages forwarded to the provider
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Model used when neither the caller nor the agent names one
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    pub fn classifier(&self) -> &AgentClassifier {
        &self.classifier
    }

    pub fn budget(&self) -> &BudgetManager {
        &self.budget
    }

    /// Run `input` as a task for `agent`
    ///
    /// The model is the explicit preference, else the agent's preferred
    /// model, else the configured default (`auto` unless set). Routing sees the full history length;
    /// only the last `history_window` messages are sent.
    pub async fn execute(
        &self,
        agent: &AgentDefinition,
        input: &str,
        history: &[Message],
        preferred_model: Option<&str>,
    ) -> Result<ExecutionResult, ExecuteError> {
        validation::validate_input(input)?;
        validation::validate_system_prompt(&agent.system_prompt)?;

        let model_hint = preferred_model
            .or(agent.preferred_model.as_deref())
            .unwrap_or(self.default_model.as_str());
        let routing = self.router.route(input, history.len(), Some(model_hint), None);

        let estimated = Decimal::from_f64_retain(routing.estimated_cost).unwrap_or_default();
        if !self.budget.can_afford(estimated) {
            warn!("Budget exceeded for agent {} (est. ${:.6})", agent.id, routing.estimated_cost);
            return Err(RouterError::BudgetExceeded {
                estimated,
                remaining: self.budget.remaining_today(),
            }
            .into());
        }

        let skip = history.len().saturating_sub(self.history_window);
        let mut messages = Vec::with_capacity(history.len() - skip + 2);
        messages.push(Message::system(agent.system_prompt.as_str()));
        messages.extend(history[skip..].iter().cloned());
        messages.push(Message::user(input));

        let started = Instant::now();
        let completion = self
            .provider
            .complete(CompletionRequest {
                model: routing.model.open_router_id.clone(),
                messages,
                max_tokens: self.max_tokens,
            })
            .await?;
        let duration = started.elapsed().as_millis() as u64;

        let cost = usage_cost(completion.usage, &routing.model);
        self.budget.record_spend(cost);

        info!(
            "Agent {} answered via {} in {}ms ({} in / {} out, ${:.6})",
            agent.id, routing.model.id, duration, completion.usage.input, completion.usage.output, cost
        );

        Ok(ExecutionResult {
            task_id: format!("task-{}", uuid::Uuid::new_v4()),
            agent_id: agent.id.clone(),
            content: completion.content,
            model: routing.model.name.clone(),
            model_id: routing.model.id.clone(),
            usage: completion.usage,
            cost,
            duration,
            routing_reason: routing.reason,
            created_at: Utc::now(),
        })
    }

    /// Classify `input` to an agent, then execute it there
    pub async fn dispatch(
        &self,
        input: &str,
        agents: &[AgentDefinition],
        history: &[Message],
    ) -> Result<DispatchResult, ExecuteError> {
        let classification = self.classifier.classify(input, agents)?;
        let agent = agents
            .iter()
            .find(|a| a.id == classification.agent_id)
            .ok_or_else(|| RouterError::AgentNotFound(classification.agent_id.clone()))?;

        info!("Dispatching to {}: {}", agent.id, classification.reason);
        let result = self.execute(agent, input, history, None).await?;
        Ok(DispatchResult { classification, result })
    }
}

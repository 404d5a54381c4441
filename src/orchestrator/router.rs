//! Cost-optimized model router
//!
//! Picks the cheapest catalog model whose quality fits the estimated task
//! complexity.

use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::RouterError;
use crate::orchestrator::catalog::{Model, ModelCatalog};
use crate::orchestrator::complexity::{ComplexitySignals, ComplexityTier};
use crate::orchestrator::cost::{estimate_cost, estimate_tokens, TokenUsage};

/// Sentinel for "let the router decide"
pub const AUTO_MODEL: &str = "auto";

/// Outcome of model selection for one request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub model: Model,
    pub reason: String,
    /// Estimated USD cost, derived from the token estimate
    pub estimated_cost: f64,
    pub confidence: f64,
    /// `None` when the model was selected manually
    pub complexity: Option<ComplexityTier>,
    pub estimated_tokens: TokenUsage,
}

fn reason_for(tier: ComplexityTier, model: &Model) -> String {
    match tier {
        ComplexityTier::Trivial => format!("Simple request → {} (fast & cheap)", model.name),
        ComplexityTier::Simple => format!("Standard task → {} (good price/performance)", model.name),
        ComplexityTier::Moderate => format!("Medium complexity → {}", model.name),
        ComplexityTier::Complex => format!("Complex task → {} (high quality)", model.name),
        ComplexityTier::Expert => format!("Expert task → {} (best quality)", model.name),
    }
}

/// Model router over an immutable catalog and keyword table
#[derive(Debug, Clone, Default)]
pub struct ModelRouter {
    catalog: ModelCatalog,
    signals: ComplexitySignals,
}

impl ModelRouter {
    /// Router over the built-in catalog and keyword groups
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(catalog: ModelCatalog, signals: ComplexitySignals) -> Self {
        Self { catalog, signals }
    }

    /// Router using the keyword overrides from configuration
    pub fn from_config(config: &crate::config::RoutingConfig) -> Result<Self, RouterError> {
        let signals = ComplexitySignals::from_overrides(&config.complexity_patterns)?;
        Ok(Self::with_parts(ModelCatalog::builtin(), signals))
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Estimate the complexity tier of a request
    pub fn classify_complexity(&self, input: &str, message_count: usize) -> ComplexityTier {
        self.signals.classify(input, message_count)
    }

    /// Select a model for `input`
    ///
    /// A `preferred_model` naming a catalog entry wins outright. Unknown
    /// names and `"auto"` fall through to automatic routing. `task_type`
    /// narrows candidates to models with a matching strength tag when any
    /// exist.
    pub fn route(
        &self,
        input: &str,
        message_count: usize,
        preferred_model: Option<&str>,
        task_type: Option<&str>,
    ) -> RoutingDecision {
        let tokens = estimate_tokens(input, message_count);

        if let Some(preferred) = preferred_model.filter(|p| !p.is_empty() && *p != AUTO_MODEL) {
            match self.catalog.find(preferred) {
                Some(model) => {
                    debug!("Manual model selection: {}", model.id);
                    return RoutingDecision {
                        model: model.clone(),
                        reason: format!("Manually selected: {}", model.name),
                        estimated_cost: estimate_cost(tokens.input, tokens.output, model),
                        confidence: 1.0,
                        complexity: None,
                        estimated_tokens: tokens,
                    };
                }
                None => warn!("Preferred model '{}' is not in the catalog, routing automatically", preferred),
            }
        }

        let complexity = self.signals.classify(input, message_count);
        let accepted = complexity.accepted_qualities();

        let mut candidates: Vec<&Model> = self
            .catalog
            .models()
            .iter()
            .filter(|m| accepted.contains(&m.quality))
            .collect();

        if let Some(hint) = task_type.filter(|t| !t.is_empty()) {
            let matched: Vec<&Model> = candidates
                .iter()
                .copied()
                .filter(|m| m.has_strength(hint))
                .collect();
            if !matched.is_empty() {
                candidates = matched;
            } else {
                debug!("No candidate has strength '{}', keeping quality filter", hint);
            }
        }

        // min_by keeps the first of equal elements, so catalog order breaks ties
        let chosen = candidates
            .into_iter()
            .min_by(|a, b| a.cost_per_1k_input.total_cmp(&b.cost_per_1k_input))
            .unwrap_or_else(|| self.catalog.default_model());

        let decision = RoutingDecision {
            model: chosen.clone(),
            reason: reason_for(complexity, chosen),
            estimated_cost: estimate_cost(tokens.input, tokens.output, chosen),
            confidence: complexity.confidence(),
            complexity: Some(complexity),
            estimated_tokens: tokens,
        };

        debug!(
            "Routed {} request ({} msgs) to {} (est. ${:.6})",
            complexity, message_count, decision.model.id, decision.estimated_cost
        );
        decision
    }
}

static DEFAULT_ROUTER: LazyLock<ModelRouter> = LazyLock::new(ModelRouter::new);

/// Route with the built-in catalog and keyword groups
pub fn route_to_model(
    input: &str,
    message_count: usize,
    preferred_model: Option<&str>,
    task_type: Option<&str>,
) -> RoutingDecision {
    DEFAULT_ROUTER.route(input, message_count, preferred_model, task_type)
}

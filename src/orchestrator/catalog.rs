//! Static model catalog
//!
//! The six models the router can pick from, with OpenRouter pricing
//! (USD per 1k tokens).

use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

use crate::error::RouterError;

/// Relative response latency of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTier {
    Fast,
    Medium,
    Slow,
}

/// General capability rating, used to gate models per complexity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Basic,
    Good,
    Excellent,
    Frontier,
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityTier::Basic => write!(f, "basic"),
            QualityTier::Good => write!(f, "good"),
            QualityTier::Excellent => write!(f, "excellent"),
            QualityTier::Frontier => write!(f, "frontier"),
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    /// Name sent to the OpenRouter gateway
    pub open_router_id: String,
    pub name: String,
    pub provider: String,
    pub cost_per_1k_input: f64,
    pub cost_per_1k_output: f64,
    /// Maximum context size in tokens
    pub max_tokens: u32,
    pub strengths: Vec<String>,
    pub speed: SpeedTier,
    pub quality: QualityTier,
}

impl Model {
    #[allow(clippy::too_many_arguments)]
    fn builtin(
        id: &str,
        open_router_id: &str,
        name: &str,
        provider: &str,
        cost_per_1k_input: f64,
        cost_per_1k_output: f64,
        max_tokens: u32,
        strengths: &[&str],
        speed: SpeedTier,
        quality: QualityTier,
    ) -> Self {
        Self {
            id: id.to_string(),
            open_router_id: open_router_id.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
            cost_per_1k_input,
            cost_per_1k_output,
            max_tokens,
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
            speed,
            quality,
        }
    }

    /// Whether any strength tag contains `hint` as a substring
    pub fn has_strength(&self, hint: &str) -> bool {
        self.strengths.iter().any(|s| s.contains(hint))
    }
}

static BUILTIN_MODELS: LazyLock<Vec<Model>> = LazyLock::new(|| {
    vec![
        Model::builtin(
            "gpt-4o-mini", "openai/gpt-4o-mini", "GPT-4o Mini", "OpenAI",
            0.00015, 0.0006, 128_000,
            &["schnell", "guenstig", "einfache-aufgaben", "uebersetzung", "zusammenfassung"],
            SpeedTier::Fast, QualityTier::Good,
        ),
        Model::builtin(
            "claude-3.5-haiku", "anthropic/claude-3.5-haiku", "Claude 3.5 Haiku", "Anthropic",
            0.0008, 0.004, 200_000,
            &["schnell", "code", "analyse", "instruktionen"],
            SpeedTier::Fast, QualityTier::Good,
        ),
        Model::builtin(
            "gpt-4o", "openai/gpt-4o", "GPT-4o", "OpenAI",
            0.0025, 0.01, 128_000,
            &["allrounder", "kreativ", "reasoning", "code", "multimodal"],
            SpeedTier::Medium, QualityTier::Excellent,
        ),
        Model::builtin(
            "claude-3.5-sonnet", "anthropic/claude-3.5-sonnet", "Claude 3.5 Sonnet", "Anthropic",
            0.003, 0.015, 200_000,
            &["code", "analyse", "langer-kontext", "instruktionen", "reasoning"],
            SpeedTier::Medium, QualityTier::Excellent,
        ),
        Model::builtin(
            "claude-sonnet-4", "anthropic/claude-sonnet-4", "Claude Sonnet 4", "Anthropic",
            0.003, 0.015, 200_000,
            &["code", "reasoning", "planung", "architektur", "komplexe-aufgaben"],
            SpeedTier::Medium, QualityTier::Frontier,
        ),
        Model::builtin(
            "mistral-large", "mistralai/mistral-large-latest", "Mistral Large", "Mistral",
            0.002, 0.006, 128_000,
            &["mehrsprachig", "code", "reasoning", "europa"],
            SpeedTier::Medium, QualityTier::Excellent,
        ),
    ]
});

/// An ordered, non-empty, immutable set of models
///
/// Catalog order matters: it breaks cost ties during routing.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Arc<[Model]>,
}

impl ModelCatalog {
    /// Build a catalog from an explicit model list
    pub fn new(models: Vec<Model>) -> Result<Self, RouterError> {
        if models.is_empty() {
            return Err(RouterError::EmptyCatalog);
        }
        Ok(Self { models: models.into() })
    }

    /// The built-in catalog
    pub fn builtin() -> Self {
        Self { models: BUILTIN_MODELS.as_slice().into() }
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// First model in catalog order, used when no candidate survives filtering
    pub fn default_model(&self) -> &Model {
        // Non-empty by construction
        &self.models[0]
    }

    /// Look up a model by catalog id only
    pub fn find(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Look up a model by catalog id or OpenRouter id
    pub fn get(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id || m.open_router_id == id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Look up a built-in model by catalog id or OpenRouter id
pub fn get_model_by_id(id: &str) -> Option<&'static Model> {
    BUILTIN_MODELS.iter().find(|m| m.id == id || m.open_router_id == id)
}

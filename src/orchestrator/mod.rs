//! Model routing and agent dispatch

pub mod agent_types;
pub mod budget;
pub mod catalog;
pub mod classifier;
pub mod complexity;
pub mod cost;
pub mod registry;
pub mod router;

// Re-export commonly used types
pub use agent_types::{AgentDefinition, AgentStatus, AgentTemplate};
pub use budget::BudgetManager;
pub use catalog::{get_model_by_id, Model, ModelCatalog, QualityTier, SpeedTier};
pub use classifier::{classify_task_for_agent, AgentClassifier, Classification, ClassifierRule};
pub use complexity::{classify_complexity, ComplexitySignals, ComplexityTier};
pub use cost::{estimate_cost, estimate_tokens, TokenUsage};
pub use registry::AgentRegistry;
pub use router::{route_to_model, ModelRouter, RoutingDecision, AUTO_MODEL};

//! Agent definitions
//!
//! Agents are specialised personas (system prompt + capability tags) that
//! the classifier assigns requests to.

use serde::{Deserialize, Serialize};

/// Availability of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Online,
    Busy,
    Offline,
    Learning,
    Error,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Online => write!(f, "online"),
            AgentStatus::Busy => write!(f, "busy"),
            AgentStatus::Offline => write!(f, "offline"),
            AgentStatus::Learning => write!(f, "learning"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

fn default_max_concurrent_tasks() -> u32 {
    3
}

/// An agent the classifier can assign work to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub description: String,
    pub system_prompt: String,
    /// Capability tags matched against classifier rules
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Model id hint, `"auto"` or absent to let the router decide
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_model: Option<String>,
    /// Coordinator agent, never assigned work by keyword rules
    #[serde(default, alias = "ismaster")]
    pub is_master: bool,
    #[serde(default)]
    pub is_built_in: bool,
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: u32,
}

impl AgentDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: AgentStatus::Online,
            description: String::new(),
            system_prompt: system_prompt.into(),
            capabilities: Vec::new(),
            preferred_model: None,
            is_master: false,
            is_built_in: false,
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.capabilities = capabilities.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_preferred_model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }

    pub fn as_master(mut self) -> Self {
        self.is_master = true;
        self
    }

    pub fn is_offline(&self) -> bool {
        self.status == AgentStatus::Offline
    }

    /// Non-master and not offline
    pub fn is_assignable(&self) -> bool {
        !self.is_master && !self.is_offline()
    }

    pub fn has_any_capability<S: AsRef<str>>(&self, wanted: &[S]) -> bool {
        self.capabilities
            .iter()
            .any(|c| wanted.iter().any(|w| w.as_ref() == c))
    }
}

/// Starting point for a user-created agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub system_prompt: String,
    pub capabilities: Vec<String>,
    pub suggested_model: String,
}

impl AgentTemplate {
    /// Create an agent from this template
    pub fn instantiate(&self, id: impl Into<String>, name: impl Into<String>) -> AgentDefinition {
        let mut agent = AgentDefinition::new(id, name, self.system_prompt.clone())
            .with_description(self.description.clone())
            .with_preferred_model(self.suggested_model.clone());
        agent.capabilities = self.capabilities.clone();
        agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignable() {
        let agent = AgentDefinition::new("a", "A", "prompt");
        assert!(agent.is_assignable());
        assert!(!agent.clone().as_master().is_assignable());
        assert!(!agent.with_status(AgentStatus::Offline).is_assignable());
    }

    #[test]
    fn test_busy_agent_is_still_assignable() {
        let agent = AgentDefinition::new("a", "A", "prompt").with_status(AgentStatus::Busy);
        assert!(agent.is_assignable());
    }

    #[test]
    fn test_capability_intersection() {
        let agent = AgentDefinition::new("a", "A", "p").with_capabilities(&["coding", "debugging"]);
        assert!(agent.has_any_capability(&["debugging", "translation"]));
        assert!(!agent.has_any_capability(&["translation"]));
        assert!(!agent.has_any_capability::<&str>(&[]));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let agent: AgentDefinition = toml::from_str(
            r#"
            id = "agent-lex"
            name = "Lex"
            systemPrompt = "Du bist Lex."
            capabilities = ["translation"]
            "#,
        )
        .unwrap();
        assert_eq!(agent.status, AgentStatus::Online);
        assert!(!agent.is_master);
        assert_eq!(agent.max_concurrent_tasks, 3);
        assert!(agent.preferred_model.is_none());
    }

    #[test]
    fn test_instantiate_template() {
        let template = AgentTemplate {
            id: "tpl".into(),
            name: "Translator".into(),
            description: "Translates".into(),
            icon: "languages".into(),
            system_prompt: "Translate.".into(),
            capabilities: vec!["translation".into()],
            suggested_model: "gpt-4o-mini".into(),
        };
        let agent = template.instantiate("agent-1", "Babel");
        assert_eq!(agent.name, "Babel");
        assert_eq!(agent.capabilities, vec!["translation".to_string()]);
        assert_eq!(agent.preferred_model.as_deref(), Some("gpt-4o-mini"));
        assert!(!agent.is_built_in);
    }
}

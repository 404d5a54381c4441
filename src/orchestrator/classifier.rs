//! Keyword-based agent classifier
//!
//! The master agent's dispatch step: pick the specialised agent whose
//! capabilities fit a request.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use crate::error::RouterError;
use crate::orchestrator::agent_types::AgentDefinition;

/// Rule as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierRuleConfig {
    pub patterns: Vec<String>,
    pub capabilities: Vec<String>,
}

/// Keyword patterns paired with the capabilities they call for
#[derive(Debug, Clone)]
pub struct ClassifierRule {
    patterns: Vec<Regex>,
    capabilities: Vec<String>,
}

impl ClassifierRule {
    pub fn new<S: AsRef<str>>(patterns: &[S], capabilities: &[S]) -> Result<Self, RouterError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| RouterError::InvalidPattern {
                        pattern: p.as_ref().to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            capabilities: capabilities.iter().map(|c| c.as_ref().to_string()).collect(),
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }
}

const DEFAULT_RULES: &[(&str, &[&str])] = &[
    (
        "code|programmier|implement|debug|refactor|typescript|react|api|function|class|bug",
        &["coding", "code-review", "debugging"],
    ),
    (
        "text|schreib|artikel|blog|content|marketing|seo|post|email|newsletter",
        &["content-creation", "copywriting", "social-media"],
    ),
    (
        "analys|daten|report|zusammenfass|recherch|statistik|vergleich",
        &["research", "data-analysis", "reporting"],
    ),
    (
        "support|kunde|faq|antwort|beschwerde|hilfe|problem",
        &["customer-support", "communication"],
    ),
    (
        "strateg|plan|business|markt|entscheid|budget|roi|okr",
        &["strategy", "planning", "consulting"],
    ),
    ("uebersetz|translat|sprach|englisch|deutsch", &["translation"]),
];

static DEFAULT_CLASSIFIER: LazyLock<AgentClassifier> = LazyLock::new(|| {
    let rules = DEFAULT_RULES
        .iter()
        .map(|(pattern, caps)| ClassifierRule::new(&[*pattern], *caps))
        .collect::<Result<Vec<_>, _>>()
        .expect("built-in classifier rules are valid");
    AgentClassifier { rules }
});

/// Chosen agent and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub agent_id: String,
    pub reason: String,
}

/// Ordered rule table, evaluated first-match-wins
#[derive(Debug, Clone)]
pub struct AgentClassifier {
    rules: Vec<ClassifierRule>,
}

impl AgentClassifier {
    /// Built-in rule table (coding, content, analysis, support, strategy, translation)
    pub fn builtin() -> Self {
        DEFAULT_CLASSIFIER.clone()
    }

    pub fn with_rules(rules: Vec<ClassifierRule>) -> Self {
        Self { rules }
    }

    /// Rules from configuration; an empty list keeps the built-in table
    pub fn from_config(rules: &[ClassifierRuleConfig]) -> Result<Self, RouterError> {
        if rules.is_empty() {
            return Ok(Self::builtin());
        }
        let rules = rules
            .iter()
            .map(|r| ClassifierRule::new(r.patterns.as_slice(), r.capabilities.as_slice()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    /// Pick the agent best suited for `input`
    ///
    /// Only the first matching rule is consulted. When it finds no
    /// assignable agent, or nothing matches, the first assignable agent is
    /// used, then the first agent of any kind.
    pub fn classify(&self, input: &str, agents: &[AgentDefinition]) -> Result<Classification, RouterError> {
        let first = agents.first().ok_or(RouterError::NoAgents)?;
        let lower = input.to_lowercase();

        if let Some(rule) = self.rules.iter().find(|r| r.matches(&lower)) {
            let matched = agents
                .iter()
                .find(|a| a.is_assignable() && a.has_any_capability(rule.capabilities()));
            if let Some(agent) = matched {
                debug!("Classified request for agent {}", agent.id);
                return Ok(Classification {
                    agent_id: agent.id.clone(),
                    reason: format!("Task fits {} ({})", agent.name, agent.description),
                });
            }
            debug!("Rule {:?} matched but no agent is available", rule.capabilities());
        }

        let fallback = agents.iter().find(|a| a.is_assignable()).unwrap_or(first);
        Ok(Classification {
            agent_id: fallback.id.clone(),
            reason: format!("General request routed to {}", fallback.name),
        })
    }
}

impl Default for AgentClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Classify with the built-in rule table
pub fn classify_task_for_agent(input: &str, agents: &[AgentDefinition]) -> Result<Classification, RouterError> {
    DEFAULT_CLASSIFIER.classify(input, agents)
}

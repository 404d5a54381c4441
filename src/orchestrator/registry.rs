//! Agent registry
//!
//! Built-in agents and templates, merged with agents from configuration.

use std::sync::LazyLock;

use crate::orchestrator::agent_types::{AgentDefinition, AgentTemplate};

const METATRON_PROMPT: &str = "Du bist Metatron, der Master Agent von OurArk. Deine Aufgabe:
1. Analysiere Benutzer-Anfragen und bestimme welcher Agent am besten geeignet ist
2. Zerlege komplexe Aufgaben in Sub-Tasks und verteile sie an spezialisierte Agenten
3. Waehle fuer jeden Task das kosteneffizienteste LLM-Modell
4. Koordiniere die Ergebnisse und praesentiere sie zusammengefuehrt

Antworte immer strukturiert mit:
- ANALYSE: Was der User will
- PLAN: Welche Agenten/Modelle eingesetzt werden
- AUSFUEHRUNG: Die eigentliche Antwort
- KOSTEN: Geschaetzte Token/Kosten-Zusammenfassung";

const ARIA_PROMPT: &str = "Du bist Aria, der Content & Marketing Agent von OurArk.
Du erstellst hochwertige Texte: Blog-Posts, Social Media Content, Marketing-Texte, E-Mails, Produktbeschreibungen.
Stil: Professionell, kreativ, SEO-optimiert. Sprache: Deutsch (de-DE) wenn nicht anders angegeben.
Formatiere Ausgaben mit Markdown. Fuer laengere Texte nutze Zwischenueberschriften.";

const NOVA_PROMPT: &str = "Du bist Nova, der Code & Development Agent von OurArk.
Du hilfst bei: Code schreiben, Code Review, Debugging, Architektur-Entscheidungen, Refactoring.
Regeln:
- Schreibe immer typsicheren Code
- Nutze moderne Patterns
- Erklaere komplexe Loesungen kurz
- Gib Code immer in Fenced Code Blocks mit Sprach-Tag aus";

const ATLAS_PROMPT: &str = "Du bist Atlas, der Daten & Analyse Agent von OurArk.
Du analysierst Daten, erstellst Reports, machst Recherchen und fasst Informationen zusammen.
Regeln:
- Praesentiere Daten in Tabellen wenn moeglich
- Nutze Zahlen und Fakten
- Sei praezise und quellenorientiert
- Erstelle klare Zusammenfassungen mit Key-Findings";

const ECHO_PROMPT: &str = "Du bist Echo, der Support & Kommunikation Agent von OurArk.
Du hilfst bei Kundenanfragen, erstellst FAQ-Antworten, formulierst Support-E-Mails.
Regeln:
- Freundlich und hilfsbereit
- Loesung-orientiert
- Kurze, klare Antworten
- Eskaliere bei komplexen Problemen an andere Agenten";

const SAGE_PROMPT: &str = "Du bist Sage, der Strategie & Planungs Agent von OurArk.
Du hilfst bei strategischen Entscheidungen, Business-Planung, Marktanalyse.
Regeln:
- Denke in Frameworks (SWOT, Porter, OKR, etc.)
- Praesentiere Pro/Contra bei Entscheidungen
- Gib konkrete, umsetzbare Empfehlungen
- Beruecksichtige Kosten und ROI";

fn builtin_agent(
    id: &str,
    name: &str,
    description: &str,
    prompt: &str,
    capabilities: &[&str],
    preferred_model: &str,
    max_concurrent_tasks: u32,
) -> AgentDefinition {
    let mut agent = AgentDefinition::new(id, name, prompt)
        .with_description(description)
        .with_capabilities(capabilities)
        .with_preferred_model(preferred_model);
    agent.is_built_in = true;
    agent.max_concurrent_tasks = max_concurrent_tasks;
    agent
}

static BUILTIN_AGENTS: LazyLock<Vec<AgentDefinition>> = LazyLock::new(|| {
    vec![
        builtin_agent(
            "agent-metatron", "Metatron",
            "Master Agent - coordinates all agents, distributes tasks, picks models",
            METATRON_PROMPT,
            &["task-routing", "agent-coordination", "cost-optimization", "planning"],
            "claude-sonnet-4", 10,
        )
        .as_master(),
        builtin_agent(
            "agent-aria", "Aria",
            "Content & Marketing - copy, articles, social media, SEO",
            ARIA_PROMPT,
            &["content-creation", "seo", "social-media", "copywriting"],
            "gpt-4o", 5,
        ),
        builtin_agent(
            "agent-nova", "Nova",
            "Code & Development - programming, review, debugging, architecture",
            NOVA_PROMPT,
            &["coding", "code-review", "debugging", "architecture"],
            "claude-3.5-sonnet", 3,
        ),
        builtin_agent(
            "agent-atlas", "Atlas",
            "Data & Analysis - research, data analysis, reports, summaries",
            ATLAS_PROMPT,
            &["research", "data-analysis", "reporting", "summarization"],
            "gpt-4o-mini", 5,
        ),
        builtin_agent(
            "agent-echo", "Echo",
            "Support & Communication - answers, FAQ, customer service",
            ECHO_PROMPT,
            &["customer-support", "faq", "communication", "email"],
            "gpt-4o-mini", 8,
        ),
        builtin_agent(
            "agent-sage", "Sage",
            "Strategy & Planning - business planning, consulting, decision support",
            SAGE_PROMPT,
            &["strategy", "planning", "consulting", "decision-support"],
            "claude-3.5-sonnet", 3,
        ),
    ]
});

fn template(
    id: &str,
    name: &str,
    description: &str,
    icon: &str,
    system_prompt: &str,
    capabilities: &[&str],
    suggested_model: &str,
) -> AgentTemplate {
    AgentTemplate {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        system_prompt: system_prompt.to_string(),
        capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        suggested_model: suggested_model.to_string(),
    }
}

static AGENT_TEMPLATES: LazyLock<Vec<AgentTemplate>> = LazyLock::new(|| {
    vec![
        template(
            "tpl-blank", "Blank agent", "Start from scratch and define everything yourself",
            "bot", "Du bist ein hilfreicher Assistent. ", &[], "auto",
        ),
        template(
            "tpl-translator", "Translator", "Translates text between languages", "languages",
            "Du bist ein professioneller Uebersetzer. Uebersetze Texte praezise und natuerlich klingend.
Behalte den Ton und Stil des Originals bei. Wenn keine Zielsprache angegeben ist, uebersetze zwischen Deutsch und Englisch.",
            &["translation"], "gpt-4o-mini",
        ),
        template(
            "tpl-social-media", "Social Media Manager", "Creates posts for every platform", "share2",
            "Du bist ein Social Media Manager. Erstelle plattform-spezifische Posts:
- Instagram: Visuell, Hashtags, Emojis
- LinkedIn: Professionell, Thought Leadership
- Twitter/X: Kurz, praegnant, Thread-faehig
- TikTok: Trendy, jung, Hook-basiert
Passe Laenge und Ton an die jeweilige Plattform an.",
            &["social-media", "content-creation"], "gpt-4o-mini",
        ),
        template(
            "tpl-code-reviewer", "Code Reviewer", "Reviews code for quality, security and performance", "code",
            "Du bist ein erfahrener Code Reviewer. Pruefe Code auf:
1. Bugs und logische Fehler
2. Sicherheitsluecken (OWASP Top 10)
3. Performance-Probleme
4. Code-Stil und Best Practices
5. Typsicherheit
Formatiere dein Review mit Severity-Levels: CRITICAL, WARNING, INFO, SUGGESTION.",
            &["code-review", "security", "performance"], "claude-3.5-sonnet",
        ),
    ]
});

/// The six built-in agents, master first
pub fn builtin_agents() -> &'static [AgentDefinition] {
    &BUILTIN_AGENTS
}

pub fn agent_templates() -> &'static [AgentTemplate] {
    &AGENT_TEMPLATES
}

pub fn get_agent_by_id<'a>(agents: &'a [AgentDefinition], id: &str) -> Option<&'a AgentDefinition> {
    agents.iter().find(|a| a.id == id)
}

pub fn get_master_agent(agents: &[AgentDefinition]) -> Option<&AgentDefinition> {
    agents.iter().find(|a| a.is_master)
}

/// Ordered set of agents available to the classifier
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentDefinition>,
}

impl AgentRegistry {
    /// Built-in agents only
    pub fn builtin() -> Self {
        Self { agents: BUILTIN_AGENTS.clone() }
    }

    /// Built-in agents plus `custom`; a custom agent sharing a built-in id
    /// replaces it in place, others are appended in order
    pub fn with_custom(custom: &[AgentDefinition]) -> Self {
        let mut registry = Self::builtin();
        for agent in custom {
            registry.upsert(agent.clone());
        }
        registry
    }

    pub fn upsert(&mut self, agent: AgentDefinition) {
        match self.agents.iter_mut().find(|a| a.id == agent.id) {
            Some(existing) => *existing = agent,
            None => self.agents.push(agent),
        }
    }

    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }

    pub fn get(&self, id: &str) -> Option<&AgentDefinition> {
        get_agent_by_id(&self.agents, id)
    }

    pub fn master(&self) -> Option<&AgentDefinition> {
        get_master_agent(&self.agents)
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::catalog::get_model_by_id;

    #[test]
    fn test_builtin_agents() {
        let agents = builtin_agents();
        assert_eq!(agents.len(), 6);
        assert_eq!(agents[0].id, "agent-metatron");
        assert!(agents[0].is_master);
        assert_eq!(agents.iter().filter(|a| a.is_master).count(), 1);
        assert!(agents.iter().all(|a| a.is_built_in));
    }

    #[test]
    fn test_preferred_models_are_in_catalog() {
        for agent in builtin_agents() {
            let model = agent.preferred_model.as_deref().unwrap();
            assert!(get_model_by_id(model).is_some(), "{} prefers unknown model {}", agent.id, model);
        }
    }

    #[test]
    fn test_lookup_helpers() {
        let agents = builtin_agents();
        assert_eq!(get_agent_by_id(agents, "agent-nova").unwrap().name, "Nova");
        assert!(get_agent_by_id(agents, "agent-unknown").is_none());
        assert_eq!(get_master_agent(agents).unwrap().name, "Metatron");
    }

    #[test]
    fn test_custom_agents_replace_and_append() {
        let nova = AgentDefinition::new("agent-nova", "Nova 2", "Neuer Prompt")
            .with_capabilities(&["coding"]);
        let lex = AgentDefinition::new("agent-lex", "Lex", "Uebersetze.")
            .with_capabilities(&["translation"]);
        let registry = AgentRegistry::with_custom(&[nova, lex]);

        assert_eq!(registry.agents().len(), 7);
        assert_eq!(registry.agents()[2].name, "Nova 2");
        assert_eq!(registry.agents()[6].id, "agent-lex");
        assert_eq!(registry.master().unwrap().id, "agent-metatron");
    }

    #[test]
    fn test_templates() {
        let templates = agent_templates();
        assert_eq!(templates.len(), 4);
        let translator = templates.iter().find(|t| t.id == "tpl-translator").unwrap();
        assert_eq!(translator.capabilities, vec!["translation".to_string()]);
    }
}

//! Agent classification against built-in and hand-built agent lists

use ourark::orchestrator::registry::{builtin_agents, get_master_agent};
use ourark::orchestrator::{classify_task_for_agent, AgentDefinition, AgentStatus};
use ourark::RouterError;

fn content_team() -> Vec<AgentDefinition> {
    vec![
        AgentDefinition::new("agent-master", "Metatron", "Koordinator").as_master(),
        AgentDefinition::new("agent-coder", "Nova", "Code")
            .with_description("Code & Development")
            .with_capabilities(&["coding"]),
        AgentDefinition::new("agent-writer", "Aria", "Texte")
            .with_description("Content & Marketing")
            .with_capabilities(&["content-creation", "seo"]),
    ]
}

#[test]
fn scenario_blogpost_goes_to_content_agent() {
    let agents = content_team();
    let result = classify_task_for_agent("Schreib einen Blogpost über nachhaltige Mode", &agents).unwrap();
    assert_eq!(result.agent_id, "agent-writer");
    assert!(result.reason.contains("Aria"));
    assert!(result.reason.contains("Content & Marketing"));
}

#[test]
fn scenario_only_master_online_falls_back_to_master() {
    let agents = vec![
        AgentDefinition::new("agent-master", "Metatron", "Koordinator").as_master(),
        AgentDefinition::new("agent-a", "A", "p")
            .with_capabilities(&["coding"])
            .with_status(AgentStatus::Offline),
        AgentDefinition::new("agent-b", "B", "p")
            .with_capabilities(&["research"])
            .with_status(AgentStatus::Offline),
    ];
    let result = classify_task_for_agent("Wie geht es dir heute?", &agents).unwrap();
    assert_eq!(result.agent_id, "agent-master");
}

#[test]
fn busy_agents_remain_assignable() {
    let agents = vec![
        AgentDefinition::new("m", "Master", "p").as_master(),
        AgentDefinition::new("n", "Nova", "p")
            .with_capabilities(&["debugging"])
            .with_status(AgentStatus::Busy),
    ];
    assert_eq!(classify_task_for_agent("Hilf beim Debugging", &agents).unwrap().agent_id, "n");
}

#[test]
fn result_is_always_in_the_list() {
    let inputs = [
        "Hallo",
        "Refactor the React component",
        "Schreib eine Email an alle Kunden",
        "Vergleich der Quartalszahlen",
        "Übersetze ins Englische",
        "",
    ];
    let lists = [builtin_agents().to_vec(), content_team()];
    for agents in &lists {
        for input in inputs {
            let result = classify_task_for_agent(input, agents).unwrap();
            assert!(agents.iter().any(|a| a.id == result.agent_id), "{}", input);
        }
    }
}

#[test]
fn classification_is_idempotent() {
    let agents = builtin_agents();
    for input in ["Erstelle einen Businessplan", "Ein Kunde hat ein Problem", "Guten Morgen"] {
        assert_eq!(
            classify_task_for_agent(input, agents).unwrap(),
            classify_task_for_agent(input, agents).unwrap()
        );
    }
}

#[test]
fn general_requests_skip_the_builtin_master() {
    let agents = builtin_agents();
    assert_eq!(get_master_agent(agents).unwrap().id, "agent-metatron");
    let result = classify_task_for_agent("Guten Morgen zusammen", agents).unwrap();
    assert_eq!(result.agent_id, "agent-aria");
}

#[test]
fn empty_agent_list_is_rejected() {
    assert!(matches!(classify_task_for_agent("Hallo", &[]), Err(RouterError::NoAgents)));
}

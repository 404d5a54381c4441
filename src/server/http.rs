//! HTTP request handlers

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::agent::{CompletionRequest, ExecuteError, ProviderError};
use crate::error::RouterError;
use crate::orchestrator::cost::{estimate_transcript_tokens, usage_cost};
use crate::orchestrator::registry::agent_templates;
use crate::orchestrator::{Model, AUTO_MODEL};
use crate::security::validation;
use crate::server::ServerState;
use crate::types::{Message, Role};

/// Shorthands accepted by `/api/chat` besides catalog and OpenRouter ids
const MODEL_ALIASES: &[(&str, &str)] = &[("claude-3.5", "anthropic/claude-3.5-sonnet")];

const ID_AUTO: &str = "auto";

/// Status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub name: String,
    pub version: String,
    pub models: usize,
    pub agents: usize,
    pub api_key_configured: bool,
    pub budget: crate::orchestrator::budget::BudgetSummary,
}

/// Routing preview request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub input: String,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub preferred_model: Option<String>,
    #[serde(default)]
    pub task_type: Option<String>,
}

/// Classification preview request
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub input: String,
}

/// Agent execution request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// Agent id, or `auto` to let the classifier pick
    pub agent_id: String,
    pub input: String,
    /// Replaces the agent's own system prompt
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<Message>,
    #[serde(default)]
    pub preferred_model: Option<String>,
}

/// Raw chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Empty or missing means the configured default model
    #[serde(default)]
    pub model: String,
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": error, "details": details }),
        None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
}

fn invalid_json(rejection: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, "Invalid request", Some(rejection.body_text()))
}

fn missing_api_key() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "OpenRouter API key not configured", None)
}

fn router_error_response(err: &RouterError) -> Response {
    match err {
        RouterError::Validation(msg) => {
            error_response(StatusCode::BAD_REQUEST, "Invalid request", Some(msg.clone()))
        }
        RouterError::BudgetExceeded { .. } => {
            error_response(StatusCode::PAYMENT_REQUIRED, "Budget exceeded", Some(err.to_string()))
        }
        RouterError::AgentNotFound(id) => {
            error_response(StatusCode::NOT_FOUND, "Agent not found", Some(id.clone()))
        }
        RouterError::NoAgents | RouterError::EmptyCatalog | RouterError::InvalidPattern { .. } => {
            error!("Router failure: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
        }
    }
}

fn provider_error_response(err: &ProviderError) -> Response {
    error!("OpenRouter error: {}", err);
    match err {
        ProviderError::Status { status, .. } => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "AI model request failed", "status": status })),
        )
            .into_response(),
        _ => error_response(StatusCode::BAD_GATEWAY, "AI model request failed", None),
    }
}

fn execute_error_response(err: &ExecuteError) -> Response {
    match err {
        ExecuteError::Router(e) => router_error_response(e),
        ExecuteError::Provider(e) => provider_error_response(e),
    }
}

/// Status handler
pub async fn status_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
        name: crate::NAME.to_string(),
        version: crate::VERSION.to_string(),
        models: state.router.catalog().len(),
        agents: state.registry.agents().len(),
        api_key_configured: state.provider.is_some(),
        budget: state.budget.summary(),
    })
}

/// Model catalog
pub async fn models_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(json!({ "models": state.router.catalog().models() }))
}

/// Registered agents
pub async fn agents_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(json!({ "agents": state.registry.agents() }))
}

/// Built-in agent templates
pub async fn templates_handler() -> impl IntoResponse {
    Json(json!({ "templates": agent_templates() }))
}

/// Routing preview, no provider call
pub async fn route_handler(
    State(state): State<ServerState>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return invalid_json(rejection),
    };
    if let Err(e) = validation::validate_input(&req.input) {
        return router_error_response(&e);
    }

    let preferred = req
        .preferred_model
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(state.config.routing.default_model.as_str());
    let decision = state.router.route(
        &req.input,
        req.message_count,
        Some(preferred),
        req.task_type.as_deref(),
    );
    (StatusCode::OK, Json(decision)).into_response()
}

/// Classification preview over the registered agents
pub async fn classify_handler(
    State(state): State<ServerState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return invalid_json(rejection),
    };
    if let Err(e) = validation::validate_input(&req.input) {
        return router_error_response(&e);
    }

    match state.classifier.classify(&req.input, state.registry.agents()) {
        Ok(classification) => (StatusCode::OK, Json(classification)).into_response(),
        Err(e) => router_error_response(&e),
    }
}

/// Execute a task on an agent
pub async fn execute_handler(
    State(state): State<ServerState>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Response {
    let Some(executor) = state.executor.as_ref() else {
        return missing_api_key();
    };
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return invalid_json(rejection),
    };
    if let Err(e) = validation::validate_input(&req.input) {
        return router_error_response(&e);
    }

    let agents = state.registry.agents();
    let classification = if req.agent_id == ID_AUTO {
        match state.classifier.classify(&req.input, agents) {
            Ok(c) => Some(c),
            Err(e) => return router_error_response(&e),
        }
    } else {
        None
    };
    let agent_id = classification
        .as_ref()
        .map(|c| c.agent_id.as_str())
        .unwrap_or(req.agent_id.as_str());

    let Some(agent) = state.registry.get(agent_id) else {
        return router_error_response(&RouterError::AgentNotFound(agent_id.to_string()));
    };
    let mut agent = agent.clone();
    if let Some(prompt) = req.system_prompt {
        agent.system_prompt = prompt;
    }

    info!("Executing task on agent {}", agent.id);
    match executor
        .execute(&agent, &req.input, &req.conversation_history, req.preferred_model.as_deref())
        .await
    {
        Ok(result) => {
            let mut body = match serde_json::to_value(&result) {
                Ok(v) => v,
                Err(e) => {
                    error!("Failed to serialize execution result: {}", e);
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None);
                }
            };
            if let (Some(c), Some(obj)) = (classification, body.as_object_mut()) {
                obj.insert("classification".to_string(), json!(c));
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => execute_error_response(&e),
    }
}

/// Resolve the `model` field of a chat request
///
/// An empty model falls back to the configured default. `auto` routes on
/// the last user message; catalog ids, OpenRouter ids and aliases map to
/// catalog entries; anything else is passed through.
fn resolve_chat_model(state: &ServerState, model: &str, messages: &[Message]) -> (String, Option<Model>) {
    let catalog = state.router.catalog();
    let model = if model.is_empty() { state.config.routing.default_model.as_str() } else { model };

    if model == AUTO_MODEL {
        let input = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let decision = state.router.route(input, messages.len().saturating_sub(1), None, None);
        return (decision.model.open_router_id.clone(), Some(decision.model));
    }

    if let Some(found) = catalog.get(model) {
        return (found.open_router_id.clone(), Some(found.clone()));
    }

    if let Some((_, target)) = MODEL_ALIASES.iter().find(|(alias, _)| *alias == model) {
        let known = catalog.get(target).cloned();
        return (target.to_string(), known);
    }

    (model.to_string(), None)
}

/// Raw chat completion
pub async fn chat_handler(
    State(state): State<ServerState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Some(provider) = state.provider.as_ref() else {
        return missing_api_key();
    };
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return invalid_json(rejection),
    };
    if let Err(e) = validation::validate_history(&req.messages) {
        return router_error_response(&e);
    }

    let (model_id, model) = resolve_chat_model(&state, &req.model, &req.messages);

    if let Some(model) = &model {
        let estimated = usage_cost(estimate_transcript_tokens(&req.messages), model);
        let estimated = Decimal::from_f64_retain(estimated).unwrap_or_default();
        if !state.budget.can_afford(estimated) {
            warn!("Budget exceeded for chat on {}", model.id);
            return router_error_response(&RouterError::BudgetExceeded {
                estimated,
                remaining: state.budget.remaining_today(),
            });
        }
    }

    let request = CompletionRequest {
        model: model_id.clone(),
        messages: req.messages,
        max_tokens: state.config.openrouter.max_tokens,
    };

    match provider.complete(request).await {
        Ok(completion) => {
            let cost = model.as_ref().map(|m| usage_cost(completion.usage, m)).unwrap_or(0.0);
            state.budget.record_spend(cost);
            (
                StatusCode::OK,
                Json(json!({
                    "content": completion.content,
                    "model": completion.model.unwrap_or(model_id),
                    "usage": completion.usage,
                    "cost": cost,
                })),
            )
                .into_response()
        }
        Err(e) => provider_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::{Completion, MockCompletionProvider};
    use crate::config::Config;
    use crate::orchestrator::TokenUsage;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(provider: Option<MockCompletionProvider>) -> axum::Router {
        app_with_config(Config::default(), provider)
    }

    fn app_with_config(config: Config, provider: Option<MockCompletionProvider>) -> axum::Router {
        let provider = provider.map(|p| Arc::new(p) as Arc<dyn crate::agent::CompletionProvider>);
        crate::server::app(ServerState::new(config, provider).unwrap())
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn reply(content: &str) -> Completion {
        Completion {
            content: content.to_string(),
            model: Some("openai/gpt-4o-mini".to_string()),
            usage: TokenUsage { input: 100, output: 50 },
        }
    }

    #[tokio::test]
    async fn test_status_and_models() {
        let app = app_with(None);
        let response = app.clone().oneshot(get("/api/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-ratelimit-remaining"));
        let body = json_body(response).await;
        assert_eq!(body["models"], 6);
        assert_eq!(body["apiKeyConfigured"], false);

        let body = json_body(app.oneshot(get("/api/models")).await.unwrap()).await;
        assert_eq!(body["models"][0]["id"], "gpt-4o-mini");
        assert_eq!(body["models"][0]["openRouterId"], "openai/gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_agents_and_templates() {
        let app = app_with(None);
        let body = json_body(app.clone().oneshot(get("/api/agents")).await.unwrap()).await;
        assert_eq!(body["agents"].as_array().unwrap().len(), 6);
        assert_eq!(body["agents"][0]["isMaster"], true);

        let body = json_body(app.oneshot(get("/api/agents/templates")).await.unwrap()).await;
        assert_eq!(body["templates"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_route_preview() {
        let app = app_with(None);
        let response = app
            .oneshot(post(
                "/api/route",
                json!({"input": "Entwirf ein System Design fuer die Plattform", "messageCount": 3}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["complexity"], "expert");
        assert_eq!(body["model"]["id"], "mistral-large");
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let app = app_with(None);
        let response = app.clone().oneshot(post("/api/route", json!({"text": "x"}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid request");

        let response = app.oneshot(post("/api/agents/classify", json!({"input": ""}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_classify_preview() {
        let app = app_with(None);
        let response = app
            .oneshot(post("/api/agents/classify", json!({"input": "Schreib einen Blog Artikel"})))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["agentId"], "agent-aria");
    }

    #[tokio::test]
    async fn test_execute_without_key_is_500() {
        let app = app_with(None);
        let response = app
            .oneshot(post("/api/agents/execute", json!({"agentId": "agent-nova", "input": "Hallo"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_execute_auto_classifies() {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .withf(|req| req.model == "anthropic/claude-3.5-sonnet" && req.messages[0].content == "Eigener Prompt")
            .times(1)
            .returning(|_| Ok(reply("Erledigt")));

        let app = app_with(Some(provider));
        let response = app
            .oneshot(post(
                "/api/agents/execute",
                json!({"agentId": "auto", "input": "Refactor diese Funktion", "systemPrompt": "Eigener Prompt"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["content"], "Erledigt");
        assert_eq!(body["agentId"], "agent-nova");
        assert_eq!(body["modelId"], "claude-3.5-sonnet");
        assert_eq!(body["classification"]["agentId"], "agent-nova");
        assert_eq!(body["usage"]["input"], 100);
    }

    #[tokio::test]
    async fn test_execute_unknown_agent_is_404() {
        let mut provider = MockCompletionProvider::new();
        provider.expect_complete().never();
        let app = app_with(Some(provider));
        let response = app
            .oneshot(post("/api/agents/execute", json!({"agentId": "agent-nobody", "input": "Hallo"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_execute_over_budget_is_402() {
        let mut provider = MockCompletionProvider::new();
        provider.expect_complete().never();
        let mut config = Config::default();
        config.budget.daily_limit = 0.0;
        let app = app_with_config(config, Some(provider));
        let response = app
            .oneshot(post("/api/agents/execute", json!({"agentId": "agent-echo", "input": "Hallo"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_502() {
        let mut provider = MockCompletionProvider::new();
        provider.expect_complete().returning(|_| {
            Err(ProviderError::Status {
                status: 401,
                body: "bad key".to_string(),
            })
        });
        let app = app_with(Some(provider));
        let response = app
            .oneshot(post(
                "/api/chat",
                json!({"model": "gpt-4o", "messages": [{"role": "user", "content": "Hallo"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["status"], 401);
    }

    #[tokio::test]
    async fn test_chat_resolves_alias_and_passthrough() {
        let mut provider = MockCompletionProvider::new();
        let mut seq = mockall::Sequence::new();
        provider
            .expect_complete()
            .withf(|req| req.model == "anthropic/claude-3.5-sonnet")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(reply("a")));
        provider
            .expect_complete()
            .withf(|req| req.model == "meta-llama/llama-3-70b")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(Completion {
                    content: "b".to_string(),
                    model: None,
                    usage: TokenUsage::default(),
                })
            });

        let app = app_with(Some(provider));
        let messages = json!([{"role": "user", "content": "Hallo"}]);
        let response = app
            .clone()
            .oneshot(post("/api/chat", json!({"model": "claude-3.5", "messages": messages.clone()})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await["cost"].as_f64().unwrap() > 0.0);

        let response = app
            .oneshot(post("/api/chat", json!({"model": "meta-llama/llama-3-70b", "messages": messages})))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["model"], "meta-llama/llama-3-70b");
        assert_eq!(body["cost"], 0.0);
    }

    #[tokio::test]
    async fn test_chat_auto_routes_on_last_user_message() {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .withf(|req| req.model == "openai/gpt-4o-mini" && req.messages.len() == 2)
            .returning(|_| Ok(reply("Hi")));

        let app = app_with(Some(provider));
        let response = app
            .oneshot(post(
                "/api/chat",
                json!({"model": "auto", "messages": [
                    {"role": "system", "content": "Sei kurz."},
                    {"role": "user", "content": "Hallo"}
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chat_rejects_bad_role_and_empty_list() {
        let mut provider = MockCompletionProvider::new();
        provider.expect_complete().never();
        let app = app_with(Some(provider));

        let response = app
            .clone()
            .oneshot(post("/api/chat", json!({"model": "gpt-4o", "messages": [{"role": "tool", "content": "x"}]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post("/api/chat", json!({"model": "gpt-4o", "messages": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_default_model_applies_to_preview_and_chat() {
        let mut config = Config::default();
        config.routing.default_model = "gpt-4o".to_string();
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .withf(|req| req.model == "openai/gpt-4o")
            .times(1)
            .returning(|_| Ok(reply("Hi")));
        let app = app_with_config(config, Some(provider));

        let body = json_body(app.clone().oneshot(post("/api/route", json!({"input": "Hallo"}))).await.unwrap()).await;
        assert_eq!(body["model"]["id"], "gpt-4o");

        let response = app
            .oneshot(post("/api/chat", json!({"messages": [{"role": "user", "content": "Hallo"}]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chat_budget_estimate_scales_with_input() {
        let mut config = Config::default();
        config.budget.daily_limit = 0.001;
        let mut provider = MockCompletionProvider::new();
        provider.expect_complete().times(1).returning(|_| Ok(reply("Hi")));
        let app = app_with_config(config, Some(provider));

        let response = app
            .oneshot(post(
                "/api/chat",
                json!({"model": "gpt-4o", "messages": [{"role": "user", "content": "Hallo"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_allowlist_and_security_headers() {
        let app = app_with(None);
        let request = |origin: &str| {
            Request::builder()
                .uri("/api/status")
                .header("origin", origin)
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(request("https://evil.example")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert!(!headers.contains_key("access-control-allow-origin"));
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
        assert!(!headers.contains_key("strict-transport-security"));

        let response = app.oneshot(request("https://ourark.io")).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "https://ourark.io");
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }

    #[tokio::test]
    async fn test_hsts_when_enabled() {
        let mut config = Config::default();
        config.server.hsts = true;
        let response = app_with_config(config, None).oneshot(get("/api/status")).await.unwrap();
        assert_eq!(
            response.headers()["strict-transport-security"],
            "max-age=63072000; includeSubDomains; preload"
        );
    }

    #[tokio::test]
    async fn test_chat_rate_limit() {
        let mut config = Config::default();
        config.server.chat_rate_limit = 1;
        let mut provider = MockCompletionProvider::new();
        provider.expect_complete().times(1).returning(|_| Ok(reply("ok")));
        let app = app_with_config(config, Some(provider));

        let body = json!({"model": "gpt-4o-mini", "messages": [{"role": "user", "content": "Hallo"}]});
        let first = app.clone().oneshot(post("/api/chat", body.clone())).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["x-ratelimit-remaining"], "0");

        let second = app.oneshot(post("/api/chat", body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_body(second).await["error"], "Too Many Requests");
    }
}

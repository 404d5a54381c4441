//! HTTP API server
//!
//! JSON endpoints for routing previews, agent listing and classification,
//! agent execution and raw chat.

pub mod http;
pub mod rate_limit;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::agent::{self, AgentExecutor, CompletionProvider, OpenRouterClient};
use crate::config::{Config, ServerConfig};
use crate::orchestrator::{AgentClassifier, AgentRegistry, BudgetManager, ModelRouter};
use rate_limit::RateLimits;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub router: Arc<ModelRouter>,
    pub classifier: Arc<AgentClassifier>,
    pub registry: Arc<AgentRegistry>,
    pub budget: BudgetManager,
    /// Absent when no API key is configured
    pub provider: Option<Arc<dyn CompletionProvider>>,
    pub executor: Option<AgentExecutor>,
    pub limits: RateLimits,
}

impl ServerState {
    /// Build state from configuration around an optional provider
    pub fn new(config: Config, provider: Option<Arc<dyn CompletionProvider>>) -> Result<Self> {
        let router = ModelRouter::from_config(&config.routing).context("Invalid routing configuration")?;
        let classifier =
            AgentClassifier::from_config(&config.classifier.rules).context("Invalid classifier rules")?;
        let registry = AgentRegistry::with_custom(&config.agents);
        let budget = BudgetManager::from_config(&config.budget);
        let limits = RateLimits::from_config(&config.server);

        let executor = match &provider {
            Some(p) => Some(agent::executor_with_provider(&config, p.clone(), budget.clone())?),
            None => None,
        };

        Ok(Self {
            config: Arc::new(config),
            router: Arc::new(router),
            classifier: Arc::new(classifier),
            registry: Arc::new(registry),
            budget,
            provider,
            executor,
            limits,
        })
    }
}

const HSTS: &str = "max-age=63072000; includeSubDomains; preload";

/// CORS restricted to the configured origins, with credentials
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .max_age(Duration::from_secs(86400))
}

/// Build the application router
pub fn app(state: ServerState) -> Router {
    let cors = cors_layer(&state.config.server);
    let hsts = state.config.server.hsts.then(|| HeaderValue::from_static(HSTS));

    Router::new()
        .route("/api/status", get(http::status_handler))
        .route("/api/models", get(http::models_handler))
        .route("/api/route", post(http::route_handler))
        .route("/api/agents", get(http::agents_handler))
        .route("/api/agents/templates", get(http::templates_handler))
        .route("/api/agents/classify", post(http::classify_handler))
        .route("/api/agents/execute", post(http::execute_handler))
        .route("/api/chat", post(http::chat_handler))
        .layer(middleware::from_fn_with_state(
            state.limits.clone(),
            rate_limit::rate_limit_middleware,
        ))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-dns-prefetch-control"),
            HeaderValue::from_static("on"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ))
        .layer(SetResponseHeaderLayer::overriding(header::STRICT_TRANSPORT_SECURITY, hsts))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start(host: &str, port: u16) -> Result<()> {
    let config = Config::load()?;

    let provider: Option<Arc<dyn CompletionProvider>> = match OpenRouterClient::from_config(&config.openrouter) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("No OpenRouter API key available, execution endpoints disabled: {}", e);
            None
        }
    };
    let has_provider = provider.is_some();

    let state = ServerState::new(config, provider)?;
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("     OurArk Router Starting");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("✓ Models:  {}", state.router.catalog().len());
    println!("✓ Agents:  {}", state.registry.agents().len());
    if has_provider {
        println!("✓ OpenRouter API key found");
    } else {
        println!("⚠ No API key: /api/chat and /api/agents/execute will return 500");
        println!("  Set OPENROUTER_API_KEY or run: ourark config --set-api-key YOUR_KEY");
    }
    println!();
    println!("🚀 Listening on http://{}", addr);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

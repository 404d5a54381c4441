//! Configuration management
//!
//! Manages gateway settings, routing tables, budget limits, server limits
//! and user-defined agents.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::orchestrator::agent_types::AgentDefinition;
use crate::orchestrator::classifier::ClassifierRuleConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// OpenRouter API settings
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    /// Model routing settings
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Budget limits
    #[serde(default)]
    pub budget: BudgetConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Agent classifier rules
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Agents added to (or replacing) the built-in ones
    #[serde(default)]
    pub agents: Vec<AgentDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// API key is stored in keyring, this is just a reference
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as `HTTP-Referer`
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Sent as `X-Title`
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Completion length cap, unset to let the provider decide
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_referer() -> String {
    "https://ourark.io".to_string()
}

fn default_title() -> String {
    "OurArk AI Workspace".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            referer: default_referer(),
            title: default_title(),
            timeout_secs: default_timeout_secs(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Model used when a request does not name one (`auto` routes)
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Prior messages forwarded to the provider
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Replacement keyword patterns per complexity tier
    #[serde(default)]
    pub complexity_patterns: HashMap<String, Vec<String>>,
}

fn default_model() -> String {
    crate::orchestrator::AUTO_MODEL.to_string()
}

fn default_history_window() -> usize {
    20
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            history_window: default_history_window(),
            complexity_patterns: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Daily spending limit in USD
    #[serde(default = "default_daily_limit")]
    pub daily_limit: f64,
    /// Monthly spending limit in USD
    #[serde(default = "default_monthly_limit")]
    pub monthly_limit: f64,
}

fn default_daily_limit() -> f64 {
    1.0
}

fn default_monthly_limit() -> f64 {
    10.0
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            monthly_limit: default_monthly_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests per window to chat routes (`/api/chat`)
    #[serde(default = "default_chat_rate_limit")]
    pub chat_rate_limit: u32,
    /// Requests per window to every other API route
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
    /// Origins allowed to make credentialed cross-origin requests
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Send `Strict-Transport-Security` (enable behind TLS in production)
    #[serde(default)]
    pub hsts: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_chat_rate_limit() -> u32 {
    20
}

fn default_api_rate_limit() -> u32 {
    60
}

fn default_rate_window_secs() -> u64 {
    60
}

fn default_allowed_origins() -> Vec<String> {
    [
        "https://ourark.io",
        "https://www.ourark.io",
        "http://localhost:3000",
        "http://localhost:3001",
    ]
    .iter()
    .map(|o| o.to_string())
    .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            chat_rate_limit: default_chat_rate_limit(),
            api_rate_limit: default_api_rate_limit(),
            rate_window_secs: default_rate_window_secs(),
            allowed_origins: default_allowed_origins(),
            hsts: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Replaces the built-in rule table when non-empty
    #[serde(default)]
    pub rules: Vec<ClassifierRuleConfig>,
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Config path has no parent")?;
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "ourark", "ourark")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Configuration ({})", config_path()?.display());
    println!();
    println!("  OpenRouter:     {}", config.openrouter.base_url);
    println!("  API key:        {}", if crate::security::keyring::has_api_key() { "set" } else { "not set" });
    println!("  Default model:  {}", config.routing.default_model);
    println!("  History window: {} messages", config.routing.history_window);
    println!("  Budget:         ${}/day, ${}/month", config.budget.daily_limit, config.budget.monthly_limit);
    println!("  Server:         {}:{}", config.server.host, config.server.port);
    println!(
        "  Rate limits:    chat {}/{}s, api {}/{}s",
        config.server.chat_rate_limit,
        config.server.rate_window_secs,
        config.server.api_rate_limit,
        config.server.rate_window_secs
    );
    println!("  CORS origins:   {}", config.server.allowed_origins.join(", "));
    println!("  Custom agents:  {}", config.agents.len());
    println!(
        "  Classifier:     {}",
        if config.classifier.rules.is_empty() { "built-in rules".to_string() } else { format!("{} custom rules", config.classifier.rules.len()) }
    );

    Ok(())
}

/// Set API key
pub fn set_api_key(key: &str) -> Result<()> {
    crate::security::keyring::set_api_key(key)?;
    println!("API key stored securely.");
    Ok(())
}

/// Set daily budget limit
pub fn set_daily_limit(limit: f64) -> Result<()> {
    if !(limit.is_finite() && limit >= 0.0) {
        anyhow::bail!("Budget limit must be a non-negative amount");
    }
    let mut config = Config::load()?;
    config.budget.daily_limit = limit;
    config.save()?;
    println!("Daily budget limit set to ${}", limit);
    Ok(())
}

/// Set monthly budget limit
pub fn set_monthly_limit(limit: f64) -> Result<()> {
    if !(limit.is_finite() && limit >= 0.0) {
        anyhow::bail!("Budget limit must be a non-negative amount");
    }
    let mut config = Config::load()?;
    config.budget.monthly_limit = limit;
    config.save()?;
    println!("Monthly budget limit set to ${}", limit);
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

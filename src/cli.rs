//! CLI interface for ourark

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::orchestrator::registry::agent_templates;
use crate::orchestrator::{AgentClassifier, AgentRegistry, BudgetManager, ModelRouter};

#[derive(Parser)]
#[command(name = "ourark")]
#[command(about = "Cost-aware LLM model router and agent dispatcher for OpenRouter", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which model a request would be routed to
    Route {
        /// Request text
        input: String,
        /// Number of prior messages in the conversation
        #[arg(short = 'n', long, default_value = "0")]
        messages: usize,
        /// Catalog id of a model to force, or "auto"
        #[arg(short, long)]
        model: Option<String>,
        /// Strength tag to prefer (e.g. "code")
        #[arg(short, long)]
        task_type: Option<String>,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which agent a request would be dispatched to
    Classify {
        /// Request text
        input: String,
        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the model catalog
    Models,
    /// List registered agents
    Agents {
        /// List agent templates instead
        #[arg(long)]
        templates: bool,
    },
    /// Run a request through an agent
    Ask {
        /// Request text
        input: String,
        /// Agent id, or "auto" to classify
        #[arg(short, long, default_value = "auto")]
        agent: String,
        /// Catalog id of a model to force
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Start the HTTP API server
    Serve {
        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,
    },
    /// Configure the router
    Config {
        /// Set OpenRouter API key
        #[arg(long)]
        set_api_key: Option<String>,
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set daily budget limit (USD)
        #[arg(long)]
        set_daily_limit: Option<f64>,
        /// Set monthly budget limit (USD)
        #[arg(long)]
        set_monthly_limit: Option<f64>,
        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Route { input, messages, model, task_type, json } => {
            let config = Config::load()?;
            let router = ModelRouter::from_config(&config.routing).context("Invalid routing configuration")?;
            let preferred = model.or_else(|| Some(config.routing.default_model.clone()));
            let decision = router.route(&input, messages, preferred.as_deref(), task_type.as_deref());

            if json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                println!("Model:      {} ({})", decision.model.name, decision.model.open_router_id);
                println!("Reason:     {}", decision.reason);
                if let Some(tier) = decision.complexity {
                    println!("Complexity: {}", tier);
                }
                println!("Confidence: {:.2}", decision.confidence);
                println!(
                    "Estimate:   ${:.6} ({} in / {} out tokens)",
                    decision.estimated_cost, decision.estimated_tokens.input, decision.estimated_tokens.output
                );
            }
        }
        Commands::Classify { input, json } => {
            let config = Config::load()?;
            let classifier =
                AgentClassifier::from_config(&config.classifier.rules).context("Invalid classifier rules")?;
            let registry = AgentRegistry::with_custom(&config.agents);
            let classification = classifier.classify(&input, registry.agents())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&classification)?);
            } else {
                println!("Agent:  {}", classification.agent_id);
                println!("Reason: {}", classification.reason);
            }
        }
        Commands::Models => {
            let router = ModelRouter::new();
            println!("{:<20} {:<10} {:<10} {:>10} {:>10}  {}", "ID", "QUALITY", "SPEED", "$/1k in", "$/1k out", "STRENGTHS");
            for model in router.catalog().models() {
                println!(
                    "{:<20} {:<10} {:<10} {:>10} {:>10}  {}",
                    model.id,
                    model.quality.to_string(),
                    format!("{:?}", model.speed).to_lowercase(),
                    model.cost_per_1k_input,
                    model.cost_per_1k_output,
                    model.strengths.join(", ")
                );
            }
        }
        Commands::Agents { templates } => {
            if templates {
                for template in agent_templates() {
                    println!("{} {} ({})", template.icon, template.name, template.id);
                    println!("    {}", template.description);
                    println!("    capabilities: {}", template.capabilities.join(", "));
                }
            } else {
                let config = Config::load()?;
                let registry = AgentRegistry::with_custom(&config.agents);
                for agent in registry.agents() {
                    let marker = if agent.is_master { " [master]" } else { "" };
                    println!("{} ({}){} - {}", agent.name, agent.id, marker, agent.status);
                    println!("    {}", agent.description);
                    println!("    capabilities: {}", agent.capabilities.join(", "));
                }
            }
        }
        Commands::Ask { input, agent, model } => {
            ask(&input, &agent, model.as_deref()).await?;
        }
        Commands::Serve { port, host } => {
            let config = Config::load()?;
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            crate::server::start(&host, port).await?;
        }
        Commands::Config { set_api_key, show, set_daily_limit, set_monthly_limit, reset } => {
            if let Some(key) = set_api_key {
                crate::config::set_api_key(&key)?;
            } else if let Some(limit) = set_daily_limit {
                crate::config::set_daily_limit(limit)?;
            } else if let Some(limit) = set_monthly_limit {
                crate::config::set_monthly_limit(limit)?;
            } else if reset {
                crate::config::reset_config()?;
            } else if show {
                crate::config::show_config()?;
            } else {
                println!("Configuration options:");
                println!("  --set-api-key <KEY>        Store the OpenRouter API key");
                println!("  --show                     Show current configuration");
                println!("  --set-daily-limit <USD>    Set the daily budget");
                println!("  --set-monthly-limit <USD>  Set the monthly budget");
                println!("  --reset                    Reset configuration to defaults");
            }
        }
    }

    Ok(())
}

async fn ask(input: &str, agent_id: &str, model: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let budget = BudgetManager::from_config(&config.budget);
    let executor = crate::agent::executor_from_config(&config, budget)
        .context("Cannot reach OpenRouter. Set OPENROUTER_API_KEY or run 'ourark config --set-api-key YOUR_KEY'")?;
    let registry = AgentRegistry::with_custom(&config.agents);

    let result = if agent_id == "auto" && model.is_none() {
        let dispatched = executor.dispatch(input, registry.agents(), &[]).await?;
        eprintln!("→ {}", dispatched.classification.reason);
        dispatched.result
    } else {
        let chosen = if agent_id == "auto" {
            let classification = executor.classifier().classify(input, registry.agents())?;
            eprintln!("→ {}", classification.reason);
            classification.agent_id
        } else {
            agent_id.to_string()
        };
        let agent = registry
            .get(&chosen)
            .ok_or(crate::error::RouterError::AgentNotFound(chosen.clone()))?;
        executor.execute(agent, input, &[], model).await?
    };

    println!("{}", result.content);
    eprintln!();
    eprintln!(
        "[{} via {} | {} in / {} out tokens | ${:.6} | {}ms]",
        result.agent_id, result.model, result.usage.input, result.usage.output, result.cost, result.duration
    );
    Ok(())
}

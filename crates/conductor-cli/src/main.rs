mod config;

use anyhow::bail;
use clap::{Parser, Subcommand};
use conductor_agent::{
    completion_from_config, ready_retriever, AutoAgent, AutomationAgent, CodeReviewAgent,
    HttpAutomationTrigger, HttpCodeReviewer, HttpRetriever, RagAgent, RetrieverFactory,
};
use conductor_core::{CancellationToken, ConductorError, Retriever, RunContext};
use conductor_memory::KeywordIndex;
use conductor_orchestrator::{AgentOrchestrator, OrchestratorSettings};
use config::{ConductorConfig, RetrievalConfig};
use futures_util::FutureExt;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conductor", about = "Conductor: multi-agent task orchestrator")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "conductor.toml")]
    config: PathBuf,

    /// Deadline for the whole command, in seconds (overrides config)
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered agents
    Agents,
    /// Run one agent on a task
    Run { agent: String, task: String },
    /// Run several agents concurrently, one `agent=task` pair each
    Multi {
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },
    /// Run the composite workflow on a task
    Workflow { task: String },
}

/// Split `agent=task` at the first `=`.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((agent, task)) if !agent.trim().is_empty() && !task.trim().is_empty() => {
            Ok((agent.trim().to_string(), task.trim().to_string()))
        }
        _ => Err(format!("expected AGENT=TASK, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ConductorConfig::load(&cli.config).await?;
    config.apply_env(|key| std::env::var(key).ok())?;
    if let Some(timeout) = cli.timeout {
        config.run_timeout_secs = Some(timeout);
    }

    let orchestrator = build_orchestrator(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            on_interrupt.cancel();
        }
    });
    let ctx = orchestrator.default_context().with_cancellation(cancel);

    let output = match cli.command {
        Commands::Agents => serde_json::to_value(orchestrator.list_agents())?,
        Commands::Run { agent, task } => {
            serde_json::to_value(orchestrator.run_one_with(&agent, &task, &ctx).await?)?
        }
        Commands::Multi { assignments } => {
            let mut tasks = HashMap::new();
            for (agent, task) in assignments {
                if tasks.insert(agent.clone(), task).is_some() {
                    bail!("agent '{agent}' given more than one task");
                }
            }
            serde_json::to_value(orchestrator.run_many_with(tasks, &ctx).await?)?
        }
        Commands::Workflow { task } => {
            serde_json::to_value(orchestrator.run_workflow_with(&task, &ctx).await?)?
        }
    };

    debug!(monitor = %orchestrator.monitor().to_json(), "Agent monitor");
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Register every agent the config supports. Optional workflow stages whose
/// backing service is not configured are disabled.
fn build_orchestrator(config: &ConductorConfig) -> anyhow::Result<AgentOrchestrator> {
    let completion = completion_from_config(config.model.clone())?;
    info!(
        provider = %config.model.provider,
        model = %config.model.model_id,
        "Model configured"
    );

    let mut roles = config.workflow.clone();
    let review_key = config
        .code_review
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty());
    if roles.code_review.is_some() && review_key.is_none() {
        warn!("No code review API key configured, code review stage disabled");
        roles.code_review = None;
    }
    let missing = config.n8n.missing();
    if roles.automation.is_some() && !missing.is_empty() {
        warn!(missing = %missing.join(", "), "n8n not configured, automation stage disabled");
        roles.automation = None;
    }

    let settings = OrchestratorSettings {
        max_steps: config.agents.max_steps,
        options: config.model.completion_options(),
        run_timeout: config.run_timeout_secs.map(Duration::from_secs),
        roles: roles.clone(),
    };
    let mut orchestrator = AgentOrchestrator::new(completion, settings);

    let planner = roles.planner.clone();
    orchestrator.register(planner, |init| Ok(Box::new(AutoAgent::new(init))))?;

    let (vector, index) = retrieval_sources(&config.retrieval);
    let top_k = config.agents.retrieval_top_k;
    orchestrator.register(roles.retrieval.clone(), |init| {
        Ok(Box::new(RagAgent::new(init, vector, index).with_top_k(top_k)))
    })?;

    if let (Some(name), Some(key)) = (&roles.code_review, review_key) {
        let reviewer = Arc::new(HttpCodeReviewer::new(config.code_review.url.clone(), key));
        orchestrator.register(name.clone(), |init| {
            Ok(Box::new(CodeReviewAgent::new(init, reviewer)))
        })?;
    }

    if let Some(name) = &roles.automation {
        let trigger = Arc::new(HttpAutomationTrigger::new(config.n8n.webhook_id.clone()));
        orchestrator.register(name.clone(), |init| {
            Ok(Box::new(AutomationAgent::new(init, &config.n8n, trigger)?))
        })?;
    }

    Ok(orchestrator)
}

/// Vector and index sources for the retrieval agent. Without a retrieval
/// service the vector source stays empty and the keyword index is the only
/// source of context.
fn retrieval_sources(retrieval: &RetrievalConfig) -> (RetrieverFactory, RetrieverFactory) {
    let vector: Arc<dyn Retriever> = match &retrieval.url {
        Some(url) => Arc::new(HttpRetriever::new(url.clone())),
        None => {
            info!("No retrieval service configured, using the keyword index only");
            Arc::new(KeywordIndex::new())
        }
    };
    (
        ready_retriever(vector),
        keyword_index(retrieval.index_dir.clone()),
    )
}

/// Keyword index built on first use, loading `dir` when one is configured.
fn keyword_index(dir: Option<PathBuf>) -> RetrieverFactory {
    Arc::new(move || {
        let dir = dir.clone();
        async move {
            let index = KeywordIndex::new();
            if let Some(dir) = dir {
                index.load_dir(&dir).await?;
            }
            Ok::<Arc<dyn Retriever>, ConductorError>(Arc::new(index))
        }
        .boxed()
    })
}

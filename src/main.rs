// src/main.rs
// Vega - conversational code assistant

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vega::agent::Agent;
use vega::config::VegaConfig;
use vega::http::create_shared_client;
use vega::llm::OpenAiClient;
use vega::repl::Repl;
use vega::server::{AppState, create_router};
use vega::session::SessionStore;

#[derive(Parser)]
#[command(name = "vega")]
#[command(about = "Conversational code assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve,

    /// Run the interactive REPL (default)
    Repl,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn build_agent(config: &VegaConfig) -> Arc<Agent> {
    let backend = Arc::new(OpenAiClient::new(create_shared_client(), &config.llm));
    let store = Arc::new(SessionStore::new(config.memory.window_size));
    Arc::new(Agent::new(backend, store))
}

async fn run_server(config: VegaConfig) -> Result<()> {
    let agent = build_agent(&config);
    let state = AppState {
        agent,
        model: config.llm.model.clone(),
    };

    let app = create_router(state);
    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Vega API listening on http://{}", bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_repl(config: VegaConfig) -> Result<()> {
    let agent = build_agent(&config);
    Repl::new(agent)?.run().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = VegaConfig::from_env();
    config.validate()?;

    match cli.command {
        Some(Commands::Serve) => {
            init_tracing("vega=info,tower_http=info");
            info!("Starting Vega (model: {})", config.llm.model);
            run_server(config).await
        }
        Some(Commands::Repl) | None => {
            // Keep the interactive surface quiet by default
            init_tracing("warn");
            run_repl(config).await
        }
    }
}

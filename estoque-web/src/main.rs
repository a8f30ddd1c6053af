use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use estoque_agents::ReasoningPolicy;
use estoque_web::config::AppConfig;
use estoque_web::gateway::OpenAIClientFactory;
use estoque_web::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "estoque-web")]
#[command(about = "Estoque GPT - ask questions about a SQLite inventory database")]
struct Args {
    /// Path to configuration file (defaults to ./estoque.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if config.api_key().is_empty() {
        tracing::warn!(
            env = %config.openai.api_key_env,
            "No OpenAI API key configured; questions will fail until one is set"
        );
    }

    let source = config.policy_source()?;
    tracing::info!(source = %source, "Loading reasoning policy");
    let policy = ReasoningPolicy::load(&source, config.openai.max_retries)
        .await
        .with_context(|| format!("Failed to load reasoning policy from {}", source))?;

    let factory = Arc::new(OpenAIClientFactory::from_config(&config));
    let state = AppState::new(&config, factory, Arc::new(policy))
        .context("Failed to compile page templates")?;
    let state = web::Data::new(state);

    tracing::info!(
        working_dir = %config.storage.working_dir.display(),
        uploads_dir = %config.storage.uploads_path().display(),
        "Serving databases"
    );

    let bind_addr = config.server.bind_addr();
    let max_upload_bytes = config.server.max_upload_bytes();
    tracing::info!("Starting Estoque GPT at http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .wrap(Logger::default())
            .configure(estoque_web::configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}

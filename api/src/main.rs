mod api_handlers;
mod config;
mod database;
mod error;
mod query;
mod request_logging;
mod validation;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::ServerConfig;
use database::types::{DOCUMENT_COLUMN, TV_SHOWS_TABLE};
use database::Database;
use poem::{listener::TcpListener, Server};
use query::{build_select, QueryFeatures};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tvshows-api")]
#[command(about = "TV shows REST API with query-string filtering")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Print how a list query string is translated, without a database
    Translate {
        /// Raw query string, e.g. 'weight[gte]=60&sort=-rating.average'
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if it exists
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve => serve_command().await,
        Commands::Translate { query } => translate_command(&query),
    }
}

async fn serve_command() -> Result<()> {
    let config = ServerConfig::from_env()?;

    let database = Database::new(&config.database_url)
        .await
        .with_context(|| format!("Database initialization failed at {}", config.database_url))?;
    tracing::info!("Database initialized at {}", config.database_url);

    let addr = config.listen_addr();
    tracing::info!(
        environment = %config.environment,
        "Starting TV shows API server on {}",
        addr
    );

    let app = api_handlers::build_app(Arc::new(database));
    Server::new(TcpListener::bind(&addr))
        .run(app)
        .await
        .context("Server terminated")
}

fn translate_command(query: &str) -> Result<()> {
    let features = QueryFeatures::parse(query)?;
    let sql = build_select(TV_SHOWS_TABLE, DOCUMENT_COLUMN, &features)?;
    let output = serde_json::json!({
        "features": features,
        "sql": sql,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

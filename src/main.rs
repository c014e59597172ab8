//! accord - automated two-party mediation backend
//!
//! A Rust backend implementing the turn-taking coordinator for an
//! AI-mediated conversation between two parties who never see each
//! other directly.

mod api;
mod coordinator;
mod mediator;
mod prompt;
mod store;

use api::{create_router, AppState};
use coordinator::Coordinator;
use mediator::{ChatCompletionMediator, LoggingMediator, MediatorConfig, MediatorService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accord=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let db_path = std::env::var("ACCORD_DB_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.accord/accord.db")
    });

    let port: u16 = std::env::var("ACCORD_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize store
    tracing::info!(path = %db_path, "Opening store");
    let store = Store::open(&db_path)?;

    // Initialize mediator backend
    let mediator_config = MediatorConfig::from_env();
    if mediator_config.api_key.is_none() {
        tracing::warn!("No mediator API key configured. Set MEDIATOR_API_KEY.");
    }
    let backend = Arc::new(ChatCompletionMediator::new(&mediator_config)?);
    tracing::info!(model = %backend.model_id(), "Mediator backend initialized");
    let mediator: Arc<dyn MediatorService> = Arc::new(LoggingMediator::new(backend));

    // Create application state
    let state = AppState::new(Coordinator::new(store, mediator));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("accord server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

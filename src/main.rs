use std::sync::Arc;

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use interview_bot::bot::InterviewBot;
use interview_bot::channels::{ChannelManager, CliChannel};
use interview_bot::config::{BotConfig, StoreBackend};
use interview_bot::interview::sessions::spawn_pruning_task;
use interview_bot::interview::{
    CatalogHandle, InterviewRouteState, NavigationEngine, SessionManager, TemplateCatalog,
    interview_routes,
};
use interview_bot::store::{JsonFileStore, LibSqlStore, ResponseStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env()?;

    eprintln!("📋 Interview Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Templates: {}", config.templates_dir.display());

    // ── Template catalog ────────────────────────────────────────────────
    let catalog = match TemplateCatalog::load_dir(&config.templates_dir).await {
        Ok(load) => {
            for rejected in &load.rejected {
                eprintln!("   Skipped template: {}", rejected);
            }
            load.catalog
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not read templates directory; starting with no templates");
            TemplateCatalog::new()
        }
    };
    eprintln!("   Loaded {} template(s): {}", catalog.len(), catalog.names().join(", "));

    // ── Response store ──────────────────────────────────────────────────
    let store: Arc<dyn ResponseStore> = match config.store {
        StoreBackend::Files => {
            eprintln!("   Responses: {}", config.responses_dir.display());
            Arc::new(JsonFileStore::new(&config.responses_dir))
        }
        StoreBackend::LibSql => {
            eprintln!("   Database: {}", config.db_path.display());
            let store = LibSqlStore::new_local(&config.db_path)
                .await
                .with_context(|| format!("opening database at {}", config.db_path.display()))?;
            Arc::new(store)
        }
    };

    // ── Sessions ────────────────────────────────────────────────────────
    let engine = Arc::new(NavigationEngine::new(CatalogHandle::new(catalog), store));
    let sessions = Arc::new(SessionManager::new(engine));

    let _pruning_handle = config.session_idle_timeout.map(|idle| {
        eprintln!("   Session idle timeout: {}s", idle.as_secs());
        let interval = idle.min(std::time::Duration::from_secs(600));
        spawn_pruning_task(Arc::clone(&sessions), idle, interval)
    });

    // ── HTTP server ─────────────────────────────────────────────────────
    let app = interview_routes(InterviewRouteState {
        sessions: Arc::clone(&sessions),
        templates_dir: Some(config.templates_dir.clone()),
    })
    .layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .with_context(|| format!("binding HTTP port {}", config.http_port))?;
    eprintln!("   HTTP API: http://0.0.0.0:{}/api/messages", config.http_port);
    tokio::spawn(async move {
        tracing::info!(port = config.http_port, "HTTP server started");
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "HTTP server stopped");
        }
    });

    // ── Channels ────────────────────────────────────────────────────────
    if !config.cli_enabled {
        eprintln!("   Channels: http\n");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Ctrl+C received, shutting down...");
        return Ok(());
    }

    let mut channels = ChannelManager::new();
    channels.add(Box::new(CliChannel::new()));
    eprintln!("   Channels: http, cli");
    eprintln!("   Type a template name to begin.\n");

    InterviewBot::new(channels, sessions).run().await?;
    Ok(())
}

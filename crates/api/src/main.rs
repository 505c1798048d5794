use sobremesa_api::config::AppConfig;
use sobremesa_api::state::AppState;
use sobremesa_core::events::{ContentEvent, EventBus};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .json()
        .init();

    tracing::info!(site = %config.site_name, dataset = %config.dataset, "Starting Sobremesa server");

    let store = sobremesa_api::build_store(&config).await?;
    let event_bus = EventBus::new(config.event_bus_capacity);
    tokio::spawn(log_revalidations(event_bus.clone()));

    let state = AppState::new(store, config.clone(), event_bus);
    let app = sobremesa_api::build_app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Log the cache tags each committed mutation invalidates.
async fn log_revalidations(bus: EventBus) {
    let mut rx = bus.subscribe();
    loop {
        match rx.recv().await {
            Ok(ContentEvent::Mutation(event)) => tracing::info!(
                document_id = %event.document_id,
                doc_type = %event.doc_type,
                tags = ?event.revalidate_tags,
                "revalidate"
            ),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "revalidation logger lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}

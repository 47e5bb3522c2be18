use parley_ai::HttpBackendFactory;
use parley_server::{AppState, config::ServerConfig, error::StartupError, serve};
use rootcause::prelude::ResultExt;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> parley_core::Result<(), StartupError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().context(StartupError::Config)?;
    tracing::info!(
        bind_address = %config.bind_address,
        default_model = %config.llm.default_model,
        timeout_secs = config.llm.request_timeout_seconds,
        clean_responses = config.llm.clean_responses,
        "Loaded configuration"
    );

    let backends =
        HttpBackendFactory::new(config.llm.request_timeout()).context(StartupError::HttpClient)?;
    let state = Arc::new(AppState::new(&config, Arc::new(backends)));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .context(StartupError::Bind {
            address: config.bind_address.clone(),
        })?;

    serve(listener, state, shutdown_signal())
        .await
        .context(StartupError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C, graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MedTrack application
///
/// Builds the record store and services from the environment, optionally seeds the demo
/// hospital and pharmacy, and serves the REST API until Ctrl-C.
///
/// # Environment Variables
/// - `MEDTRACK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDTRACK_FRONTEND_URL`, `MEDTRACK_TOKEN_TTL_MINUTES`, `MEDTRACK_TOKEN_KEY_PEM`,
///   `MEDTRACK_SEED_DEMO`: see `api_rest::startup`
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medtrack_run=info".parse()?)
                .add_directive("medtrack_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("MEDTRACK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let state = api_rest::startup::state_from_env()?;
    tracing::info!(
        frontend = state.cfg.frontend_url(),
        "++ Starting MedTrack REST on {}",
        rest_addr
    );

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, api_rest::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("MedTrack stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

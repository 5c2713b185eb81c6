use std::future::IntoFuture;
use std::sync::Arc;

use adaptogen_runner::RunnerConfig;
use adaptogen_store::{RedisStore, ResultCache};
use anyhow::Context;

use adaptogen_server::{
    api::{build_app, AppState},
    lifecycle,
    orchestrator::Orchestrator,
    scheduler::JobRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = adaptogen_core::load_app_config()?;
    lifecycle::init_tracing(&config.log_level)?;
    tracing::debug!(?config, "loaded configuration");

    let store = RedisStore::connect(&config.redis_url)
        .await
        .context("failed to connect to redis")?;
    let registry = JobRegistry::start()
        .await
        .context("failed to start job scheduler")?;
    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        ResultCache::new(store),
        RunnerConfig::from_app_config(&config),
    ));

    let app = build_app(AppState {
        orchestrator: Arc::clone(&orchestrator),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "server listening");

    // In-flight requests and command runs are abandoned once a signal arrives.
    let signal = tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.context("server error")?;
            return Ok(());
        }
        signal = lifecycle::shutdown_signal() => signal,
    };

    tracing::info!(signal, "received shutdown signal, shutting down");
    orchestrator.shutdown().await;
    Ok(())
}

//! Progress API HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, the token verifier and the HTTP routers,
//! then starts the API server and (optionally) the bootstrap server.
use anyhow::Context;
use progress_api::app::{AppState, build_bootstrap_router, build_router};
use progress_api::config::ApiConfig;
use progress_api::observability;
use progress_api::store::ProgressStore;
use progress_api::store::memory::InMemoryStore;
use progress_authz::ActorTokenVerifier;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env_or_yaml().context("progress api config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: ApiConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("progress-api");
    let state = build_state(config.clone());
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state.clone());

    let bootstrap_task = if config.bootstrap.enabled {
        let bootstrap_addr = config.bootstrap.bind_addr;
        let bootstrap_app = build_bootstrap_router(state.clone());
        Some(tokio::spawn(async move {
            tracing::info!(%bootstrap_addr, "bootstrap listener starting");
            match tokio::net::TcpListener::bind(bootstrap_addr).await {
                Ok(listener) => {
                    let _ = axum::serve(listener, bootstrap_app.into_make_service()).await;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to bind bootstrap listener");
                }
            }
        }))
    } else {
        None
    };

    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        backend = state.store.backend_name(),
        keys = state.verifier.key_count(),
        "progress api listening"
    );
    if state.verifier.key_count() == 0 {
        tracing::warn!("no verification keys configured; every bearer token will be rejected");
    }
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    if let Some(task) = &bootstrap_task {
        task.abort();
    }
    let _ = metrics_task.await;
    if let Some(task) = bootstrap_task {
        let _ = task.await;
    }
    Ok(())
}

fn build_state(config: ApiConfig) -> AppState {
    let store: Arc<dyn ProgressStore> = Arc::new(InMemoryStore::new());
    AppState {
        store,
        verifier: ActorTokenVerifier::new(
            config.auth.issuer,
            config.auth.audience,
            config.auth.leeway_secs,
            config.auth.keys,
        ),
        bootstrap_enabled: config.bootstrap.enabled,
        bootstrap_token: config.bootstrap.token,
    }
}

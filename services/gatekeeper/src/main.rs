//! Gatekeeper HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, the session and policy clients, and the document
//! store into the router, then serves until shutdown.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use gatekeeper::app::{AppState, build_router};
use gatekeeper::auth::policy::PolicyClient;
use gatekeeper::auth::session::SessionServiceClient;
use gatekeeper::config::GatekeeperConfig;
use gatekeeper::observability;
use gatekeeper::store::memory::InMemoryDocumentStore;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatekeeperConfig::from_env_or_yaml().context("gatekeeper config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: GatekeeperConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    observability::init_observability("gatekeeper");
    let state = build_state(&config)?;
    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        session_url = %config.session_url,
        policy_url = %config.policy_url,
        role_source = ?config.role_source,
        credential_source = ?config.credential_source,
        "gatekeeper listening"
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {
            tracing::info!("shutdown signal received");
        }
    }
    Ok(())
}

fn build_state(config: &GatekeeperConfig) -> anyhow::Result<AppState> {
    let client = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .connect_timeout(config.upstream_timeout)
        .build()
        .context("build upstream http client")?;
    let sessions = Arc::new(SessionServiceClient::new(
        client.clone(),
        &config.session_url,
        config.session_api_key.clone(),
        config.role_source,
    ));
    Ok(AppState {
        sessions: sessions.clone(),
        issuer: sessions,
        gate: Arc::new(PolicyClient::new(client, &config.policy_url)),
        documents: Arc::new(InMemoryDocumentStore::seeded()),
        credentials: config.credential_policy(),
        cors_origins: config.cors_origins.clone().into(),
    })
}

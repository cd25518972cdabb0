use crate::config::MultiSearchConfig;
use crate::keys::KeyStore;
use crate::routes;
use crate::transport::{self, TransportHandle};
use anyhow::Result;
use axum::Extension;
use ms_llm::Dispatcher;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub transport: TransportHandle,
}

pub fn key_store(cfg: &MultiSearchConfig) -> KeyStore {
    let store = KeyStore::new(cfg.keys_path());
    if cfg.keys.env_overrides {
        store
    } else {
        store.without_env()
    }
}

/// Build the dispatcher backed by the on-disk key store.
pub fn build_dispatcher(cfg: &MultiSearchConfig) -> (Dispatcher, KeyStore) {
    let store = key_store(cfg);
    let http = ms_llm::build_http_client(cfg.request_timeout());
    let dispatcher = Dispatcher::new(http, Arc::new(store.clone()));
    (dispatcher, store)
}

pub fn app(state: Arc<AppState>) -> axum::Router {
    routes::router()
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

#[tracing::instrument(level = "info", skip_all)]
pub async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = MultiSearchConfig::load(config_path).await?;
    let (dispatcher, store) = build_dispatcher(&cfg);
    let (transport, router) = transport::spawn(Arc::new(dispatcher));
    let state = Arc::new(AppState { transport });

    let addr: SocketAddr = cfg
        .server
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind {:?}: {e}", cfg.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {addr}: {e}"))?;
    tracing::info!(%addr, keys = %store.path().display(), "multisearch listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;

    router.abort();
    Ok(())
}

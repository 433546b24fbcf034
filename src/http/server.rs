use crate::config::Config;
use crate::http::*;
use crate::models::{DynStore, Store};
use crate::notify::{DynNotifier, LogNotifier};
use anyhow::Context;
use axum::Router;
use sqlx::PgPool;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Serve the API on `config.port` until Ctrl+C.
pub async fn serve(config: Config, db: PgPool) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));

    let api_context = ApiContext {
        notifier: Arc::new(LogNotifier::new(config.mail_from.clone())) as DynNotifier,
        config: Arc::new(config),
        store: Arc::new(Store::new(db)) as DynStore,
    };

    let app = api_router(api_context);

    log::info!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("error running HTTP server")
}

pub(crate) fn api_router(api_context: ApiContext) -> Router {
    Router::new()
        .merge(users::router())
        .merge(profiles::router())
        .merge(articles::router())
        // Enables logging. Use `RUST_LOG=tower_http=debug`
        .layer(TraceLayer::new_for_http())
        .with_state(api_context)
}

async fn shutdown_signal() {
    // In-flight requests are allowed to finish once this resolves.
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutting down"),
        Err(e) => log::error!("failed to listen for shutdown signal: {}", e),
    }
}

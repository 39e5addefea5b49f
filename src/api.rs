//! HTTP front end for the query service

use crate::core::rate::RateView;
use crate::query::RateQueryService;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct AppState {
    pub query: RateQueryService,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    query_errors: u64,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/exchange_rates", get(list_exchange_rates))
        .route("/exchange_rates/{currency}", get(get_exchange_rate))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Lists today's rates for all currencies.
async fn list_exchange_rates(State(state): State<Arc<AppState>>) -> Json<Vec<RateView>> {
    Json(state.query.get_all_today().await)
}

/// Today's rate for one currency, or `{}` when there is none.
async fn get_exchange_rate(
    State(state): State<Arc<AppState>>,
    Path(currency): Path<String>,
) -> Response {
    match state.query.get_one(&currency).await {
        Some(view) => Json(view).into_response(),
        None => Json(json!({})).into_response(),
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        query_errors: state.query.metrics().errors(),
    })
}

pub async fn serve(listen_addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    info!("Serving exchange rates on http://{}", listen_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

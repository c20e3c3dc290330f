//! HTTP server exposing the stats as JSON, an HTML widget and an embed script.

use crate::config::WidgetConfig;
use crate::stats::StatsAggregator;
use crate::widget::{generate_embed_script, generate_widget_html, Theme, WidgetOptions};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, Method},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<StatsAggregator>,
    pub widget: WidgetConfig,
    /// Public base URL of this service, without a trailing slash.
    pub public_url: String,
    /// Widget auto-reload interval, normally the cache TTL.
    pub refresh_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct ThemeQuery {
    theme: Option<String>,
}

impl AppState {
    /// The requested theme, or the configured default when absent or unknown.
    fn resolve_theme(&self, query: &ThemeQuery) -> Theme {
        match query.theme.as_deref().map(str::parse::<Theme>) {
            Some(Ok(theme)) => theme,
            Some(Err(e)) => {
                debug!("{}, using {}", e, self.widget.default_theme);
                self.widget.default_theme
            }
            None => self.widget.default_theme,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/api/stats", get(get_stats))
        .route("/widget", get(get_widget))
        .route("/embed.js", get(get_embed_script))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Listening on {} (widget at {}/widget)",
        listener.local_addr().context("Failed to read local address")?,
        state.public_url
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tracing::instrument(skip_all)]
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let result = state.stats.fetch_stats().await;

    (
        [
            ("x-stats-source", result.source.as_str()),
            (header::CACHE_CONTROL.as_str(), "no-cache"),
        ],
        Json(result.snapshot),
    )
}

#[tracing::instrument(skip_all)]
async fn get_widget(
    State(state): State<AppState>,
    Query(query): Query<ThemeQuery>,
) -> impl IntoResponse {
    let options = WidgetOptions {
        title: state.widget.title.clone(),
        theme: state.resolve_theme(&query),
        refresh_seconds: Some(state.refresh_seconds),
    };
    let snapshot = state.stats.get_stats().await;

    Html(generate_widget_html(&snapshot, &options))
}

#[tracing::instrument(skip_all)]
async fn get_embed_script(
    State(state): State<AppState>,
    Query(query): Query<ThemeQuery>,
) -> impl IntoResponse {
    let theme = state.resolve_theme(&query);
    let script = generate_embed_script(&state.public_url, theme, &state.widget.title);

    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        script,
    )
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// Web server: Axum JSON API over the two plots.
//
// The context is loaded once before the server starts and shared read-only
// across handlers, so requests never touch the database.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::context::AppContext;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(ctx: AppContext, port: u16, bind: &str) -> Result<()> {
    let state = AppState { ctx: Arc::new(ctx) };
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("OEWG ternary API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/settings", get(handlers::settings::get_settings))
        .route("/api/items", get(handlers::items::get_item_plot))
        .route("/api/centroids", get(handlers::centroids::get_centroid_plot))
        .route("/api/countries", get(handlers::countries::list_countries))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check, always 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

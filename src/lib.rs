pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::handlers::inquiries::{
    create_inquiry, get_inquiry, list_inquiries, update_inquiry_status,
};
use crate::middleware::auth_middleware;
use crate::services::AuditLogger;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub audit: AuditLogger,
}

pub fn create_app(state: AppState) -> Router {
    let cors_origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(cors_origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/inquiries",
            Router::new()
                .route("/", get(list_inquiries).post(create_inquiry))
                .route("/:id", get(get_inquiry).patch(update_inquiry_status))
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

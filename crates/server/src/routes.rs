use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::{PvzService, Storage};

use crate::openapi;

pub mod auth;
pub mod pvz;

/// Shared handler state; the storage backend is chosen at startup.
#[derive(Clone)]
pub struct AppState {
    pub svc: PvzService<dyn Storage>,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .route("/dummyLogin", post(auth::dummy_login))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let pvz_routes = Router::new()
        .route("/pvz", post(pvz::create_pvz).get(pvz::list_pvz))
        .route("/receptions", post(pvz::create_reception))
        .route("/products", post(pvz::create_product))
        .route("/pvz/:pvz_id/close_last_reception", post(pvz::close_last_reception))
        .route("/pvz/:pvz_id/delete_last_product", post(pvz::delete_last_product));

    public
        .merge(pvz_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

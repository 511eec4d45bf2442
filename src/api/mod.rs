use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub mod proposals;

/// Public HTTP surface: health check, proposal lookup and uploaded photos.
///
/// The presentation page is served from another origin, so any origin may read.
pub fn router(upload_dir: &Path) -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/proposal", proposals::router())
        .nest("/api/proposal", proposals::router())
        .nest_service(
            "/uploads",
            ServiceBuilder::new().service(ServeDir::new(upload_dir)),
        )
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET])
                .allow_origin(Any),
        )
}

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: "Valentine Bot",
    })
}

use super::handlers::{admin, comments};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];
    let cors = if allowed_origins == "*" {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
            CorsLayer::new()
                .allow_methods(methods)
                .allow_origin(Any)
                .allow_headers(Any)
        } else {
            tracing::info!("CORS enabled for origins: {:?}", origins);
            CorsLayer::new()
                .allow_methods(methods)
                .allow_origin(origins)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route(
            "/api/comments/:entity/:entity_id",
            get(comments::list_thread).post(comments::post_comment),
        )
        .route(
            "/api/comments/:entity/:entity_id/count",
            get(comments::count_comments),
        )
        .route(
            "/api/comments/:entity/:entity_id/last",
            get(comments::last_comment),
        )
        .route(
            "/api/comment/:id",
            put(comments::edit_comment).delete(admin::delete_comment),
        )
        .layer(cors)
        .with_state(state)
}

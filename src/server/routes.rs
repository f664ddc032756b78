//! Route table

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::middleware::logging::log_request;
use crate::protocol::handlers;
use crate::server::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/files/read", post(handlers::read_file))
        .route("/api/files/write", post(handlers::write_file))
        .route("/api/files/list", post(handlers::list_directory))
        .route("/api/files/tree", post(handlers::directory_tree))
        .route("/api/files/mkdir", post(handlers::make_directory))
        .route("/api/files/delete", post(handlers::delete_path))
        .route("/api/files/move", post(handlers::move_path))
        .route("/api/files/copy", post(handlers::copy_path))
        .route("/api/files/info", post(handlers::path_info))
        .route("/api/files/search", post(handlers::search_files))
        .route("/api/files/search_content", post(handlers::search_content))
        .route("/api/hub/states", get(handlers::hub_states))
        .route("/api/hub/states/:entity_id", get(handlers::hub_state))
        .route(
            "/api/hub/services/:domain/:service",
            post(handlers::hub_call_service),
        )
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

// src/server/mod.rs
// HTTP front end for the agent

pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::agent::Agent;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    pub model: String,
}

/// Create the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/clear", post(handlers::clear_memory))
        .route("/memory", post(handlers::get_memory))
        .route("/stats", get(handlers::get_stats))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use axum::{Router, routing::get};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::query_engine::QueryEngine;

pub mod handlers;
pub mod models;

pub fn create_router(query_engine: Arc<QueryEngine>, static_dir: impl AsRef<Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(handlers::search_handler))
        .route("/titles", get(handlers::titles_handler))
        .route("/works/:id", get(handlers::work_handler))
        .with_state(query_engine)
        // everything else is the UI
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(CatchPanicLayer::custom(models::panic_response))
        .layer(cors)
}

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;

use crate::handlers::{self, download, upload};
use crate::middleware::{log_request, set_request_id};
use crate::AppState;

/// Build the router with the request pipeline installed in front of every
/// route, fallback included: correlation ID first, then request logging.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(upload::MAX_UPLOAD_BYTES)),
        )
        .route("/download", get(download::download))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(set_request_id))
                .layer(middleware::from_fn(log_request)),
        )
        .with_state(state)
}

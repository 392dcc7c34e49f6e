use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    health_handler, job_results_handler, job_status_handler, model_stats_handler,
    start_batch_handler, submit_batch_handler, upload_get_handler, upload_put_handler,
};
use crate::presentation::state::AppState;

/// Frame documents are small; audio goes through the upload routes, which stream.
const FRAME_BODY_LIMIT: usize = 16 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let uploads = Router::new()
        .route(
            "/api/v1/uploads/{*path}",
            put(upload_put_handler).get(upload_get_handler),
        )
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/v1/batch",
            post(submit_batch_handler).layer(DefaultBodyLimit::max(FRAME_BODY_LIMIT)),
        )
        .route("/api/v1/batch/{job_id}", get(job_status_handler))
        .route("/api/v1/batch/{job_id}/start", post(start_batch_handler))
        .route("/api/v1/batch/{job_id}/results", get(job_results_handler))
        .route("/api/v1/models/stats", get(model_stats_handler))
        .merge(uploads)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::documents::{handlers as documents, validation::MAX_FILE_SIZE};
use crate::jobs::handlers as jobs;
use crate::state::AppState;

/// Two PDFs at the size limit plus multipart framing.
const UPLOAD_BODY_LIMIT: usize = 2 * MAX_FILE_SIZE + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/upload",
            post(documents::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/evaluate", post(jobs::handle_evaluate))
        .route("/result", get(jobs::handle_get_result))
        .route("/queue/status", get(jobs::handle_queue_status))
        .with_state(state)
}

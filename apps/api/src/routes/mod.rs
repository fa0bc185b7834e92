pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::jobs::handlers as jobs;
use crate::matches::handlers as matches;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Candidates
        .route("/api/v1/candidates/upload", post(resumes::handle_upload))
        .route("/api/v1/candidates", get(resumes::handle_list_candidates))
        .route(
            "/api/v1/candidates/:id",
            get(resumes::handle_get_candidate).delete(resumes::handle_delete_candidate),
        )
        // Job postings
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Matches
        .route(
            "/api/v1/matches",
            get(matches::handle_list_matches).post(matches::handle_create_match),
        )
        .route(
            "/api/v1/matches/:id",
            get(matches::handle_get_match).delete(matches::handle_delete_match),
        )
        .route(
            "/api/v1/matches/:id/cover-letter",
            post(matches::handle_cover_letter),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

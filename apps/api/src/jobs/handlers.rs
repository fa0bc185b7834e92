use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::errors::{ApiJson, ApiPath, AppError};
use crate::models::job::{JobPosting, JobPostingInput};
use crate::state::AppState;

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<JobPostingInput>,
) -> Result<(StatusCode, Json<JobPosting>), AppError> {
    input.validate()?;
    let job = state.store.insert_job(input).await?;
    info!("Created job posting {} ({} at {})", job.id, job.title, job.company);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    Ok(Json(state.store.list_jobs().await?))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<JobPosting>, AppError> {
    let job = state
        .store
        .get_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(job))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<JobPostingInput>,
) -> Result<Json<JobPosting>, AppError> {
    input.validate()?;
    let job = state
        .store
        .update_job(id, input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_job(id).await? {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

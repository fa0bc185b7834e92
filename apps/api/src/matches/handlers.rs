use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::{ApiJson, ApiPath, ApiQuery, AppError};
use crate::matches::service::{create_match, draft_letter, CoverLetter};
use crate::models::job_match::MatchResult;
use crate::state::AppState;
use crate::store::MatchFilter;

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub candidate_id: i64,
    pub job_id: i64,
}

/// POST /api/v1/matches
pub async fn handle_create_match(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchResult>), AppError> {
    let created = create_match(
        state.store.as_ref(),
        &state.llm,
        req.candidate_id,
        req.job_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/matches?candidate_id=&job_id=
pub async fn handle_list_matches(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<MatchFilter>,
) -> Result<Json<Vec<MatchResult>>, AppError> {
    Ok(Json(state.store.list_matches(filter).await?))
}

/// GET /api/v1/matches/:id
pub async fn handle_get_match(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MatchResult>, AppError> {
    let found = state
        .store
        .get_match(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {id} not found")))?;
    Ok(Json(found))
}

/// DELETE /api/v1/matches/:id
pub async fn handle_delete_match(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_match(id).await? {
        return Err(AppError::NotFound(format!("Match {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/matches/:id/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CoverLetter>, AppError> {
    Ok(Json(draft_letter(state.store.as_ref(), &state.llm, id).await?))
}

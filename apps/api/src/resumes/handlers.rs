use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::errors::{ApiPath, AppError};
use crate::extraction::DocumentKind;
use crate::models::candidate::CandidateProfile;
use crate::resumes::ingest::submit_resume;
use crate::state::AppState;

/// Multipart field carrying the resume file.
const RESUME_FIELD: &str = "resume";

/// POST /api/v1/candidates/upload
///
/// Accepts a `.pdf`, `.docx` or `.txt` resume and returns the stored profile.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<CandidateProfile>), AppError> {
    let mut multipart = multipart?;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        // Reject unsupported extensions before buffering the body.
        let kind = DocumentKind::from_file_name(&file_name)?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Error reading file: {e}")))?;

        info!("Received resume '{file_name}' ({} bytes)", data.len());
        upload = Some((data, kind));
        break;
    }

    let (data, kind) =
        upload.ok_or_else(|| AppError::InvalidInput("No resume file provided".to_string()))?;

    let profile = submit_resume(state.store.as_ref(), &state.llm, data, kind).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateProfile>>, AppError> {
    Ok(Json(state.store.list_candidates().await?))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CandidateProfile>, AppError> {
    let candidate = state
        .store
        .get_candidate(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
    Ok(Json(candidate))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_candidate(id).await? {
        return Err(AppError::NotFound(format!("Candidate {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

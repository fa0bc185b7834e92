use bytes::Bytes;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::{extract_text_blocking, DocumentKind};
use crate::llm_client::StructuredClient;
use crate::models::candidate::{CandidateProfile, NewCandidateProfile};
use crate::store::Store;

/// Extracts, parses and persists one resume.
///
/// Nothing is stored unless every stage succeeds: text extraction, the
/// completion round trip, required-key validation and record typing.
pub async fn submit_resume(
    store: &dyn Store,
    llm: &StructuredClient,
    file_bytes: Bytes,
    kind: DocumentKind,
) -> Result<CandidateProfile, AppError> {
    let size = file_bytes.len();
    let text = extract_text_blocking(file_bytes, kind).await?;
    info!(
        "Extracted {} characters from {size}-byte {kind} resume",
        text.len()
    );

    let output = llm.extract_profile(&text).await?;
    let profile = NewCandidateProfile::from_structured(&output)?;

    let created = store.insert_candidate(profile).await?;
    info!("Created candidate profile {} ({})", created.id, created.name);
    Ok(created)
}

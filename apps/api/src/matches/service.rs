use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::StructuredClient;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;
use crate::models::job_match::{MatchResult, NewMatchResult};
use crate::models::typed_field;
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct CoverLetter {
    pub match_id: i64,
    pub cover_letter: String,
}

/// Scores a candidate against a job and stores the result.
///
/// Not idempotent: every call inserts a new match, even for a pair that was
/// already scored.
pub async fn create_match(
    store: &dyn Store,
    llm: &StructuredClient,
    candidate_id: i64,
    job_id: i64,
) -> Result<MatchResult, AppError> {
    info!("Matching candidate {candidate_id} against job {job_id}");
    let (candidate, job) = load_pair(store, candidate_id, job_id).await?;
    let (candidate_json, job_json) = serialize_pair(&candidate, &job)?;

    let output = llm.score_match(&candidate_json, &job_json).await?;
    let new_match = NewMatchResult::from_structured(candidate.id, job.id, &output)?;

    let created = store.insert_match(new_match).await?;
    info!(
        "Created match {} with score {}",
        created.id, created.match_score
    );
    Ok(created)
}

/// Drafts a cover letter for an existing match. The letter is not stored.
pub async fn draft_letter(
    store: &dyn Store,
    llm: &StructuredClient,
    match_id: i64,
) -> Result<CoverLetter, AppError> {
    let job_match = store
        .get_match(match_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {match_id} not found")))?;

    let (candidate, job) = load_pair(store, job_match.candidate_id, job_match.job_id).await?;
    let (candidate_json, job_json) = serialize_pair(&candidate, &job)?;

    let output = llm.draft_cover_letter(&candidate_json, &job_json).await?;
    let cover_letter: String = typed_field(&output, "cover_letter")?;

    info!("Drafted cover letter for match {match_id}");
    Ok(CoverLetter {
        match_id,
        cover_letter,
    })
}

async fn load_pair(
    store: &dyn Store,
    candidate_id: i64,
    job_id: i64,
) -> Result<(CandidateProfile, JobPosting), AppError> {
    let candidate = store
        .get_candidate(candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
    let job = store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok((candidate, job))
}

fn serialize_pair(
    candidate: &CandidateProfile,
    job: &JobPosting,
) -> Result<(serde_json::Value, serde_json::Value), AppError> {
    let candidate = serde_json::to_value(candidate).context("Failed to serialize candidate")?;
    let job = serde_json::to_value(job).context("Failed to serialize job")?;
    Ok((candidate, job))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::stub::StubCompletion;
    use crate::llm_client::LlmError;
    use crate::models::candidate::NewCandidateProfile;
    use crate::models::job::JobPostingInput;
    use crate::store::{MatchFilter, MemoryStore};

    const MATCH_RESPONSE: &str =
        r#"{"match_score": 72, "missing_skills": ["Kubernetes"], "summary": "Solid fit", "notes": "x"}"#;

    async fn seeded_store() -> (MemoryStore, i64, i64) {
        let store = MemoryStore::new();
        let candidate = store
            .insert_candidate(NewCandidateProfile {
                name: "Jane Doe".to_string(),
                skills: vec!["Python".to_string(), "AWS".to_string()],
                education: vec![],
                work_experience: vec![],
            })
            .await
            .unwrap();
        let job = store
            .insert_job(JobPostingInput {
                title: "Platform Engineer".to_string(),
                company: "Acme".to_string(),
                required_skills: vec!["AWS".to_string(), "Kubernetes".to_string()],
                description: "Run the platform".to_string(),
            })
            .await
            .unwrap();
        (store, candidate.id, job.id)
    }

    fn client_replying(reply: &str) -> (Arc<StubCompletion>, StructuredClient) {
        let stub = Arc::new(StubCompletion::replying(reply));
        (stub.clone(), StructuredClient::new(stub))
    }

    #[tokio::test]
    async fn test_create_match_persists_result() {
        let (store, candidate_id, job_id) = seeded_store().await;
        let (stub, llm) = client_replying(MATCH_RESPONSE);

        let created = create_match(&store, &llm, candidate_id, job_id).await.unwrap();

        assert_eq!(created.candidate_id, candidate_id);
        assert_eq!(created.job_id, job_id);
        assert_eq!(created.match_score, 72);
        assert_eq!(created.missing_skills, vec!["Kubernetes"]);
        assert_eq!(store.get_match(created.id).await.unwrap(), Some(created));

        let prompts = stub.prompts();
        assert!(prompts[0].contains("\"name\": \"Jane Doe\""));
        assert!(prompts[0].contains("\"title\": \"Platform Engineer\""));
    }

    #[tokio::test]
    async fn test_create_match_twice_creates_two_records() {
        let (store, candidate_id, job_id) = seeded_store().await;
        let (stub, llm) = client_replying(MATCH_RESPONSE);

        let first = create_match(&store, &llm, candidate_id, job_id).await.unwrap();
        let second = create_match(&store, &llm, candidate_id, job_id).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(stub.calls(), 2);
        let all = store.list_matches(MatchFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found_without_model_call() {
        let (store, _candidate_id, _job_id) = seeded_store().await;
        let (stub, llm) = client_replying(MATCH_RESPONSE);

        let err = create_match(&store, &llm, 1, 999).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref msg) if msg.contains("999")));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_candidate_is_not_found() {
        let (store, _candidate_id, job_id) = seeded_store().await;
        let (stub, llm) = client_replying(MATCH_RESPONSE);

        let err = create_match(&store, &llm, 404, job_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_summary_not_persisted() {
        let (store, candidate_id, job_id) = seeded_store().await;
        let (_stub, llm) = client_replying(r#"{"match_score": 72, "missing_skills": []}"#);

        let err = create_match(&store, &llm, candidate_id, job_id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Llm(LlmError::SchemaViolation { key: "summary", .. })
        ));
        assert!(store
            .list_matches(MatchFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_score_not_persisted() {
        let (store, candidate_id, job_id) = seeded_store().await;
        let (_stub, llm) =
            client_replying(r#"{"match_score": 140, "missing_skills": [], "summary": "?"}"#);

        let err = create_match(&store, &llm, candidate_id, job_id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidRecord(_)));
        assert!(store
            .list_matches(MatchFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_draft_letter_returns_text() {
        let (store, candidate_id, job_id) = seeded_store().await;
        let (_stub, scorer) = client_replying(MATCH_RESPONSE);
        let created = create_match(&store, &scorer, candidate_id, job_id)
            .await
            .unwrap();

        let (stub, writer) =
            client_replying("```json\n{\"cover_letter\": \"Dear Acme,\\nI am excited...\"}\n```");
        let letter = draft_letter(&store, &writer, created.id).await.unwrap();

        assert_eq!(letter.match_id, created.id);
        assert_eq!(letter.cover_letter, "Dear Acme,\nI am excited...");
        assert!(stub.prompts()[0].contains("professional cover letter"));
        // Letters are returned, never stored as matches.
        assert_eq!(
            store.list_matches(MatchFilter::default()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_draft_letter_unknown_match() {
        let (store, _, _) = seeded_store().await;
        let (stub, llm) = client_replying(r#"{"cover_letter": "x"}"#);

        let err = draft_letter(&store, &llm, 77).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_draft_letter_non_string_rejected() {
        let (store, candidate_id, job_id) = seeded_store().await;
        let (_stub, scorer) = client_replying(MATCH_RESPONSE);
        let created = create_match(&store, &scorer, candidate_id, job_id)
            .await
            .unwrap();

        let (_stub, writer) = client_replying(r#"{"cover_letter": ["para one", "para two"]}"#);
        let err = draft_letter(&store, &writer, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRecord(_)));
    }
}

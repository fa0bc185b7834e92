//! Record storage for candidates, job postings and matches.
//!
//! `AppState` carries an `Arc<dyn Store>`: `PgStore` when `DATABASE_URL` is
//! configured, `MemoryStore` otherwise (and in tests). Every insert is one
//! atomic write that allocates a fresh id; nothing here deduplicates.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::candidate::{CandidateProfile, NewCandidateProfile};
use crate::models::job::{JobPosting, JobPostingInput};
use crate::models::job_match::{MatchResult, NewMatchResult};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Optional filters for listing matches.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct MatchFilter {
    pub candidate_id: Option<i64>,
    pub job_id: Option<i64>,
}

impl MatchFilter {
    pub fn accepts(&self, m: &MatchResult) -> bool {
        self.candidate_id.map_or(true, |id| m.candidate_id == id)
            && self.job_id.map_or(true, |id| m.job_id == id)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_candidate(
        &self,
        profile: NewCandidateProfile,
    ) -> Result<CandidateProfile, AppError>;
    async fn get_candidate(&self, id: i64) -> Result<Option<CandidateProfile>, AppError>;
    async fn list_candidates(&self) -> Result<Vec<CandidateProfile>, AppError>;
    /// Also removes the candidate's matches. Returns false if absent.
    async fn delete_candidate(&self, id: i64) -> Result<bool, AppError>;

    async fn insert_job(&self, job: JobPostingInput) -> Result<JobPosting, AppError>;
    async fn get_job(&self, id: i64) -> Result<Option<JobPosting>, AppError>;
    async fn list_jobs(&self) -> Result<Vec<JobPosting>, AppError>;
    async fn update_job(
        &self,
        id: i64,
        job: JobPostingInput,
    ) -> Result<Option<JobPosting>, AppError>;
    /// Also removes the job's matches. Returns false if absent.
    async fn delete_job(&self, id: i64) -> Result<bool, AppError>;

    /// Fails with `NotFound` if either side of the pairing no longer exists.
    async fn insert_match(&self, m: NewMatchResult) -> Result<MatchResult, AppError>;
    async fn get_match(&self, id: i64) -> Result<Option<MatchResult>, AppError>;
    async fn list_matches(&self, filter: MatchFilter) -> Result<Vec<MatchResult>, AppError>;
    async fn delete_match(&self, id: i64) -> Result<bool, AppError>;
}

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::AppError;
use crate::models::candidate::{CandidateProfile, NewCandidateProfile};
use crate::models::job::{JobPosting, JobPostingInput};
use crate::models::job_match::{MatchResult, NewMatchResult};
use crate::store::{MatchFilter, Store};

#[derive(Default)]
struct Tables {
    next_id: i64,
    candidates: BTreeMap<i64, CandidateProfile>,
    jobs: BTreeMap<i64, JobPosting>,
    matches: BTreeMap<i64, MatchResult>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Records vanish on restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("memory store lock poisoned")))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_candidate(
        &self,
        profile: NewCandidateProfile,
    ) -> Result<CandidateProfile, AppError> {
        let mut tables = self.tables()?;
        let id = tables.allocate_id();
        let record = CandidateProfile {
            id,
            name: profile.name,
            skills: profile.skills,
            education: profile.education,
            work_experience: profile.work_experience,
            created_at: Utc::now(),
        };
        tables.candidates.insert(id, record.clone());
        Ok(record)
    }

    async fn get_candidate(&self, id: i64) -> Result<Option<CandidateProfile>, AppError> {
        Ok(self.tables()?.candidates.get(&id).cloned())
    }

    async fn list_candidates(&self) -> Result<Vec<CandidateProfile>, AppError> {
        Ok(self.tables()?.candidates.values().cloned().collect())
    }

    async fn delete_candidate(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables()?;
        let removed = tables.candidates.remove(&id).is_some();
        tables.matches.retain(|_, m| m.candidate_id != id);
        Ok(removed)
    }

    async fn insert_job(&self, job: JobPostingInput) -> Result<JobPosting, AppError> {
        let mut tables = self.tables()?;
        let id = tables.allocate_id();
        let now = Utc::now();
        let record = JobPosting {
            id,
            title: job.title,
            company: job.company,
            required_skills: job.required_skills,
            description: job.description,
            created_at: now,
            updated_at: now,
        };
        tables.jobs.insert(id, record.clone());
        Ok(record)
    }

    async fn get_job(&self, id: i64) -> Result<Option<JobPosting>, AppError> {
        Ok(self.tables()?.jobs.get(&id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<JobPosting>, AppError> {
        Ok(self.tables()?.jobs.values().cloned().collect())
    }

    async fn update_job(
        &self,
        id: i64,
        job: JobPostingInput,
    ) -> Result<Option<JobPosting>, AppError> {
        let mut tables = self.tables()?;
        let Some(existing) = tables.jobs.get_mut(&id) else {
            return Ok(None);
        };
        existing.title = job.title;
        existing.company = job.company;
        existing.required_skills = job.required_skills;
        existing.description = job.description;
        existing.updated_at = Utc::now();
        Ok(Some(existing.clone()))
    }

    async fn delete_job(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables()?;
        let removed = tables.jobs.remove(&id).is_some();
        tables.matches.retain(|_, m| m.job_id != id);
        Ok(removed)
    }

    async fn insert_match(&self, m: NewMatchResult) -> Result<MatchResult, AppError> {
        let mut tables = self.tables()?;
        if !tables.candidates.contains_key(&m.candidate_id) {
            return Err(AppError::NotFound(format!(
                "Candidate {} not found",
                m.candidate_id
            )));
        }
        if !tables.jobs.contains_key(&m.job_id) {
            return Err(AppError::NotFound(format!("Job {} not found", m.job_id)));
        }

        let id = tables.allocate_id();
        let record = MatchResult {
            id,
            candidate_id: m.candidate_id,
            job_id: m.job_id,
            match_score: m.match_score,
            missing_skills: m.missing_skills,
            summary: m.summary,
            created_at: Utc::now(),
        };
        tables.matches.insert(id, record.clone());
        Ok(record)
    }

    async fn get_match(&self, id: i64) -> Result<Option<MatchResult>, AppError> {
        Ok(self.tables()?.matches.get(&id).cloned())
    }

    async fn list_matches(&self, filter: MatchFilter) -> Result<Vec<MatchResult>, AppError> {
        Ok(self
            .tables()?
            .matches
            .values()
            .filter(|m| filter.accepts(m))
            .cloned()
            .collect())
    }

    async fn delete_match(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables()?.matches.remove(&id).is_some())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::errors::AppError;
use crate::models::candidate::{
    CandidateProfile, Education, NewCandidateProfile, WorkExperience,
};
use crate::models::job::{JobPosting, JobPostingInput};
use crate::models::job_match::{MatchResult, NewMatchResult};
use crate::store::{MatchFilter, Store};

const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(FromRow)]
struct CandidateRow {
    id: i64,
    name: String,
    skills: Json<Vec<String>>,
    education: Json<Vec<Education>>,
    work_experience: Json<Vec<WorkExperience>>,
    created_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateProfile {
    fn from(row: CandidateRow) -> Self {
        CandidateProfile {
            id: row.id,
            name: row.name,
            skills: row.skills.0,
            education: row.education.0,
            work_experience: row.work_experience.0,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct JobRow {
    id: i64,
    title: String,
    company: String,
    required_skills: Json<Vec<String>>,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<JobRow> for JobPosting {
    fn from(row: JobRow) -> Self {
        JobPosting {
            id: row.id,
            title: row.title,
            company: row.company,
            required_skills: row.required_skills.0,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct MatchRow {
    id: i64,
    candidate_id: i64,
    job_id: i64,
    match_score: i32,
    missing_skills: Json<Vec<String>>,
    summary: String,
    created_at: DateTime<Utc>,
}

impl From<MatchRow> for MatchResult {
    fn from(row: MatchRow) -> Self {
        MatchResult {
            id: row.id,
            candidate_id: row.candidate_id,
            job_id: row.job_id,
            match_score: row.match_score,
            missing_skills: row.missing_skills.0,
            summary: row.summary,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_candidate(
        &self,
        profile: NewCandidateProfile,
    ) -> Result<CandidateProfile, AppError> {
        let row: CandidateRow = sqlx::query_as(
            r#"
            INSERT INTO candidate_profiles (name, skills, education, work_experience)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&profile.name)
        .bind(Json(&profile.skills))
        .bind(Json(&profile.education))
        .bind(Json(&profile.work_experience))
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted candidate profile {}", row.id);
        Ok(row.into())
    }

    async fn get_candidate(&self, id: i64) -> Result<Option<CandidateProfile>, AppError> {
        let row: Option<CandidateRow> =
            sqlx::query_as("SELECT * FROM candidate_profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn list_candidates(&self) -> Result<Vec<CandidateProfile>, AppError> {
        let rows: Vec<CandidateRow> =
            sqlx::query_as("SELECT * FROM candidate_profiles ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_candidate(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM candidate_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_job(&self, job: JobPostingInput) -> Result<JobPosting, AppError> {
        let row: JobRow = sqlx::query_as(
            r#"
            INSERT INTO job_postings (title, company, required_skills, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&job.title)
        .bind(&job.company)
        .bind(Json(&job.required_skills))
        .bind(&job.description)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted job posting {}", row.id);
        Ok(row.into())
    }

    async fn get_job(&self, id: i64) -> Result<Option<JobPosting>, AppError> {
        let row: Option<JobRow> = sqlx::query_as("SELECT * FROM job_postings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_jobs(&self) -> Result<Vec<JobPosting>, AppError> {
        let rows: Vec<JobRow> = sqlx::query_as("SELECT * FROM job_postings ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_job(
        &self,
        id: i64,
        job: JobPostingInput,
    ) -> Result<Option<JobPosting>, AppError> {
        let row: Option<JobRow> = sqlx::query_as(
            r#"
            UPDATE job_postings
            SET title = $2, company = $3, required_skills = $4, description = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&job.title)
        .bind(&job.company)
        .bind(Json(&job.required_skills))
        .bind(&job.description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_job(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM job_postings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_match(&self, m: NewMatchResult) -> Result<MatchResult, AppError> {
        let row: MatchRow = sqlx::query_as(
            r#"
            INSERT INTO job_matches (candidate_id, job_id, match_score, missing_skills, summary)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(m.candidate_id)
        .bind(m.job_id)
        .bind(m.match_score)
        .bind(Json(&m.missing_skills))
        .bind(&m.summary)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // The candidate or job was deleted while the model was scoring.
            let orphaned = matches!(
                &e,
                sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
            );
            if orphaned {
                AppError::NotFound(format!(
                    "Candidate {} or job {} no longer exists",
                    m.candidate_id, m.job_id
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        info!(
            "Inserted match {} (candidate {}, job {}, score {})",
            row.id, row.candidate_id, row.job_id, row.match_score
        );
        Ok(row.into())
    }

    async fn get_match(&self, id: i64) -> Result<Option<MatchResult>, AppError> {
        let row: Option<MatchRow> = sqlx::query_as("SELECT * FROM job_matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_matches(&self, filter: MatchFilter) -> Result<Vec<MatchResult>, AppError> {
        let rows: Vec<MatchRow> = sqlx::query_as(
            r#"
            SELECT * FROM job_matches
            WHERE ($1::BIGINT IS NULL OR candidate_id = $1)
              AND ($2::BIGINT IS NULL OR job_id = $2)
            ORDER BY id
            "#,
        )
        .bind(filter.candidate_id)
        .bind(filter.job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_match(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM job_matches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::typed_field;

pub const MAX_MATCH_SCORE: i64 = 100;

/// A scored candidate/job pairing, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatchResult {
    pub candidate_id: i64,
    pub job_id: i64,
    pub match_score: i32,
    pub missing_skills: Vec<String>,
    pub summary: String,
}

impl NewMatchResult {
    /// Types the output of `score_match`. `match_score` must be an integer
    /// in `0..=100`.
    pub fn from_structured(
        candidate_id: i64,
        job_id: i64,
        output: &Map<String, Value>,
    ) -> Result<Self, AppError> {
        let score: i64 = typed_field(output, "match_score")?;
        if !(0..=MAX_MATCH_SCORE).contains(&score) {
            return Err(AppError::InvalidRecord(format!(
                "match_score: {score} is outside 0..={MAX_MATCH_SCORE}"
            )));
        }

        Ok(Self {
            candidate_id,
            job_id,
            match_score: score as i32,
            missing_skills: typed_field(output, "missing_skills")?,
            summary: typed_field(output, "summary")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: i64,
    pub candidate_id: i64,
    pub job_id: i64,
    pub match_score: i32,
    pub missing_skills: Vec<String>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

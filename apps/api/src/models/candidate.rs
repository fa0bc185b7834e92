use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::{lenient_string, typed_field};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default, deserialize_with = "lenient_string")]
    pub degree: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub institution: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

/// A profile parsed from a resume, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCandidateProfile {
    pub name: String,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub work_experience: Vec<WorkExperience>,
}

impl NewCandidateProfile {
    /// Types the output of `extract_profile`. Extra keys are ignored.
    pub fn from_structured(output: &Map<String, Value>) -> Result<Self, AppError> {
        Ok(Self {
            name: typed_field(output, "name")?,
            skills: typed_field(output, "skills")?,
            education: typed_field(output, "education")?,
            work_experience: typed_field(output, "work_experience")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: i64,
    pub name: String,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub work_experience: Vec<WorkExperience>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_from_structured_full_profile() {
        let profile = NewCandidateProfile::from_structured(&output(json!({
            "name": "Jane Doe",
            "skills": ["Python", "AWS"],
            "education": [{"degree": "BSc CS", "institution": "MIT", "year": "2020"}],
            "work_experience": [{
                "company": "Acme",
                "position": "Engineer",
                "duration": "2 years",
                "description": "Built things"
            }],
            "summary": "extra keys are ignored"
        })))
        .unwrap();

        assert_eq!(profile.name, "Jane Doe");
        assert_eq!(profile.skills, vec!["Python", "AWS"]);
        assert_eq!(profile.education[0].institution, "MIT");
        assert_eq!(profile.work_experience[0].position, "Engineer");
    }

    #[test]
    fn test_numeric_year_and_missing_subfields_accepted() {
        let profile = NewCandidateProfile::from_structured(&output(json!({
            "name": "Sam",
            "skills": [],
            "education": [{"degree": "PhD", "year": 2018}],
            "work_experience": [{"company": "Initech", "duration": null}]
        })))
        .unwrap();

        assert_eq!(profile.education[0].year, "2018");
        assert_eq!(profile.education[0].institution, "");
        assert_eq!(profile.work_experience[0].duration, "");
    }

    #[test]
    fn test_skills_as_string_is_invalid_record() {
        let err = NewCandidateProfile::from_structured(&output(json!({
            "name": "Sam",
            "skills": "Python, AWS",
            "education": [],
            "work_experience": []
        })))
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRecord(ref msg) if msg.starts_with("skills:")));
    }

    #[test]
    fn test_nested_object_in_text_field_rejected() {
        let err = NewCandidateProfile::from_structured(&output(json!({
            "name": "Sam",
            "skills": [],
            "education": [{"degree": {"level": "BSc"}}],
            "work_experience": []
        })))
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRecord(ref msg) if msg.starts_with("education:")));
    }

    #[test]
    fn test_boolean_in_text_field_rejected() {
        let err = NewCandidateProfile::from_structured(&output(json!({
            "name": "Sam",
            "skills": [],
            "education": [],
            "work_experience": [{"company": "Initech", "description": true}]
        })))
        .unwrap_err();
        assert!(
            matches!(err, AppError::InvalidRecord(ref msg) if msg.starts_with("work_experience:"))
        );
    }
}

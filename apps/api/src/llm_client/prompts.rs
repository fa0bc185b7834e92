// Prompt templates for the three structured operations.
// Placeholders are `{name}` tokens filled by `structured::render_template`;
// literal JSON braces in the example shapes are left untouched.

pub const RESUME_PARSE_PROMPT: &str = r#"Parse this resume text into structured JSON with the following format:
{
  "name": "string",
  "skills": ["string"],
  "education": [
    {
      "degree": "string",
      "institution": "string",
      "year": "string"
    }
  ],
  "work_experience": [
    {
      "company": "string",
      "position": "string",
      "duration": "string",
      "description": "string"
    }
  ]
}

Resume text:
{resume_text}

Return only the JSON object, no additional text or explanation."#;

pub const MATCH_PROMPT: &str = r#"Analyze this candidate profile against the job requirements and return a JSON object with:
{
  "match_score": integer (0-100),
  "missing_skills": ["string"],
  "summary": "string"
}

Candidate Profile:
{candidate}

Job Posting:
{job}

Return only the JSON object, no additional text or explanation."#;

pub const COVER_LETTER_PROMPT: &str = r#"Generate a professional cover letter based on this candidate profile and job posting.
Return a JSON object with:
{
  "cover_letter": "string"
}

Candidate Profile:
{candidate}

Job Posting:
{job}

Return only the JSON object, no additional text or explanation."#;

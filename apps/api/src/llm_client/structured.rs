//! Structured completion pipeline: render → complete → sanitize → decode → validate.
//!
//! All three call sites (resume parsing, match scoring, cover letters) share
//! this one pipeline and differ only by their [`Operation`] descriptor.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::llm_client::prompts::{COVER_LETTER_PROMPT, MATCH_PROMPT, RESUME_PARSE_PROMPT};
use crate::llm_client::{Completion, LlmError};

/// Decoded model output. Always a JSON object holding at least the
/// operation's required keys; extra keys are kept.
pub type StructuredOutput = Map<String, Value>;

/// Describes one structured operation: its prompt and its output contract.
#[derive(Debug)]
pub struct Operation {
    pub name: &'static str,
    pub template: &'static str,
    pub required_keys: &'static [&'static str],
}

pub const EXTRACT_PROFILE: Operation = Operation {
    name: "extract_profile",
    template: RESUME_PARSE_PROMPT,
    required_keys: &["name", "skills", "education", "work_experience"],
};

pub const SCORE_MATCH: Operation = Operation {
    name: "score_match",
    template: MATCH_PROMPT,
    required_keys: &["match_score", "missing_skills", "summary"],
};

pub const DRAFT_COVER_LETTER: Operation = Operation {
    name: "draft_cover_letter",
    template: COVER_LETTER_PROMPT,
    required_keys: &["cover_letter"],
};

/// Turns unstructured requests into schema-conformant objects using exactly
/// one completion call each. Never retries.
#[derive(Clone)]
pub struct StructuredClient {
    completion: Arc<dyn Completion>,
}

impl StructuredClient {
    pub fn new(completion: Arc<dyn Completion>) -> Self {
        Self { completion }
    }

    pub async fn extract_profile(&self, resume_text: &str) -> Result<StructuredOutput, LlmError> {
        if resume_text.trim().is_empty() {
            return Err(LlmError::InvalidInput("resume text is empty".to_string()));
        }
        self.run(&EXTRACT_PROFILE, &[("resume_text", resume_text)])
            .await
    }

    pub async fn score_match(
        &self,
        candidate: &Value,
        job: &Value,
    ) -> Result<StructuredOutput, LlmError> {
        let candidate = record_payload("candidate", candidate)?;
        let job = record_payload("job", job)?;
        self.run(&SCORE_MATCH, &[("candidate", &candidate), ("job", &job)])
            .await
    }

    pub async fn draft_cover_letter(
        &self,
        candidate: &Value,
        job: &Value,
    ) -> Result<StructuredOutput, LlmError> {
        let candidate = record_payload("candidate", candidate)?;
        let job = record_payload("job", job)?;
        self.run(
            &DRAFT_COVER_LETTER,
            &[("candidate", &candidate), ("job", &job)],
        )
        .await
    }

    async fn run(
        &self,
        operation: &Operation,
        vars: &[(&str, &str)],
    ) -> Result<StructuredOutput, LlmError> {
        let prompt = render_template(operation.template, vars);
        info!("Requesting {} completion", operation.name);

        let raw = self.completion.complete(&prompt).await?;
        debug!("Raw response ({}): {raw}", operation.name);

        if raw.trim().is_empty() {
            return Err(LlmError::Upstream(format!(
                "empty response for {}",
                operation.name
            )));
        }

        parse_structured(operation, &raw)
    }
}

/// Sanitizes, decodes and validates a raw model response.
pub fn parse_structured(operation: &Operation, raw: &str) -> Result<StructuredOutput, LlmError> {
    let text = sanitize_response(raw);

    let value: Value = serde_json::from_str(text).map_err(|source| {
        warn!(
            "Malformed {} response ({source}); text: {text}",
            operation.name
        );
        LlmError::Malformed {
            source,
            raw: text.to_string(),
        }
    })?;

    validate_required_keys(operation, value)
}

/// Strips surrounding whitespace and at most one leading "```json" (or bare
/// "```") marker and one trailing "```" marker. Interior content is untouched.
pub fn sanitize_response(raw: &str) -> &str {
    let text = raw.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

fn validate_required_keys(
    operation: &Operation,
    value: Value,
) -> Result<StructuredOutput, LlmError> {
    let missing = |key: &'static str| LlmError::SchemaViolation {
        operation: operation.name,
        key,
    };

    let object = match value {
        Value::Object(object) => object,
        // A scalar or array carries none of the keys.
        _ => {
            return match operation.required_keys.first() {
                Some(key) => Err(missing(*key)),
                None => Ok(Map::new()),
            }
        }
    };

    if let Some(key) = operation
        .required_keys
        .iter()
        .find(|key| !object.contains_key(**key))
    {
        return Err(missing(*key));
    }
    Ok(object)
}

fn record_payload(label: &str, record: &Value) -> Result<String, LlmError> {
    match record {
        Value::Object(fields) if !fields.is_empty() => serde_json::to_string_pretty(record)
            .map_err(|e| LlmError::InvalidInput(format!("{label} record: {e}"))),
        _ => Err(LlmError::InvalidInput(format!("{label} record is empty"))),
    }
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned,
/// so placeholder-like text inside a resume stays literal.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    'scan: while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        for (name, value) in vars {
            let token_len = name.len() + 2;
            if tail.len() >= token_len
                && tail[1..].starts_with(name)
                && tail[1 + name.len()..].starts_with('}')
            {
                out.push_str(value);
                rest = &tail[token_len..];
                continue 'scan;
            }
        }

        out.push('{');
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::stub::StubCompletion;
    use serde_json::json;

    fn client(stub: &Arc<StubCompletion>) -> StructuredClient {
        StructuredClient::new(stub.clone())
    }

    // ── sanitize ─────────────────────────────────────────────────────────────

    #[test]
    fn test_sanitize_strips_json_fence() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(sanitize_response(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_sanitize_strips_bare_fence() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(sanitize_response(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_sanitize_leaves_plain_json() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(sanitize_response(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_sanitize_removes_exactly_one_marker_each_side() {
        let interiors = [
            "{\"a\": \"```json inside```\"}",
            "```json\n{}\n```",
            "{\"code\": \"```\"}",
        ];
        for interior in interiors {
            let fenced = format!("```json{interior}```");
            assert_eq!(sanitize_response(&fenced), interior.trim());
        }
    }

    #[test]
    fn test_sanitize_trailing_fence_only() {
        assert_eq!(sanitize_response("{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    // ── template rendering ───────────────────────────────────────────────────

    #[test]
    fn test_render_substitutes_named_placeholders() {
        let out = render_template("A {x} B {y} {z}", &[("x", "1"), ("y", "2")]);
        assert_eq!(out, "A 1 B 2 {z}");
    }

    #[test]
    fn test_render_does_not_expand_inside_values() {
        let out = render_template(
            "{candidate} | {job}",
            &[("candidate", "has {job} literally"), ("job", "J")],
        );
        assert_eq!(out, "has {job} literally | J");
    }

    #[test]
    fn test_render_keeps_json_example_braces() {
        let out = render_template(RESUME_PARSE_PROMPT, &[("resume_text", "Jane")]);
        assert!(out.contains("\"name\": \"string\""));
        assert!(out.contains("Resume text:\nJane\n"));
        assert!(!out.contains("{resume_text}"));
    }

    // ── parse / validate ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_preserves_extra_keys() {
        let raw = r#"{"match_score": 80, "missing_skills": [], "summary": "ok", "confidence": "high"}"#;
        let out = parse_structured(&SCORE_MATCH, raw).unwrap();
        for key in SCORE_MATCH.required_keys {
            assert!(out.contains_key(*key));
        }
        assert_eq!(out["confidence"], json!("high"));
    }

    #[test]
    fn test_parse_reports_first_missing_key() {
        for op in [&EXTRACT_PROFILE, &SCORE_MATCH, &DRAFT_COVER_LETTER] {
            for skipped in op.required_keys {
                let object: Map<String, Value> = op
                    .required_keys
                    .iter()
                    .filter(|k| *k != skipped)
                    .map(|k| (k.to_string(), json!("x")))
                    .collect();
                let raw = Value::Object(object).to_string();
                match parse_structured(op, &raw) {
                    Err(LlmError::SchemaViolation { operation, key }) => {
                        assert_eq!(operation, op.name);
                        assert_eq!(key, *skipped);
                    }
                    other => panic!("expected schema violation, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_parse_does_not_type_check() {
        let raw = r#"{"match_score": "ninety", "missing_skills": "none", "summary": 3}"#;
        let out = parse_structured(&SCORE_MATCH, raw).unwrap();
        assert_eq!(out["match_score"], json!("ninety"));
    }

    #[test]
    fn test_parse_non_object_is_schema_violation() {
        let err = parse_structured(&DRAFT_COVER_LETTER, "[\"cover_letter\"]").unwrap_err();
        assert!(matches!(
            err,
            LlmError::SchemaViolation {
                key: "cover_letter",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_prose_is_malformed_with_text() {
        let err = parse_structured(&EXTRACT_PROFILE, "I'm sorry, I can't help.").unwrap_err();
        match err {
            LlmError::Malformed { raw, .. } => assert_eq!(raw, "I'm sorry, I can't help."),
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    // ── full pipeline with stub ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_extract_profile_fenced_response() {
        let stub = Arc::new(StubCompletion::replying(
            "```json\n{\"name\": \"Jane\", \"skills\": [], \"education\": [], \"work_experience\": []}\n```",
        ));
        let out = client(&stub).extract_profile("Jane Doe").await.unwrap();
        assert_eq!(out["name"], json!("Jane"));
        assert_eq!(stub.calls(), 1);
        assert!(stub.prompts()[0].contains("Jane Doe"));
    }

    #[tokio::test]
    async fn test_extract_profile_blank_input_skips_call() {
        let stub = Arc::new(StubCompletion::replying("{}"));
        let err = client(&stub).extract_profile("  \n ").await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidInput(_)));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_records_are_invalid_input() {
        let stub = Arc::new(StubCompletion::replying("{}"));
        let err = client(&stub)
            .score_match(&json!({}), &json!({"title": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidInput(_)));

        let err = client(&stub)
            .draft_cover_letter(&json!({"name": "x"}), &Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidInput(_)));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_response_is_upstream_error() {
        let stub = Arc::new(StubCompletion::replying("   "));
        let err = client(&stub).extract_profile("resume").await.unwrap_err();
        assert!(matches!(err, LlmError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let stub = Arc::new(StubCompletion::failing("connection refused"));
        let err = client(&stub)
            .score_match(&json!({"name": "a"}), &json!({"title": "b"}))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Upstream(ref msg) if msg.contains("refused")));
    }

    #[tokio::test]
    async fn test_score_match_prompt_embeds_pretty_records() {
        let stub = Arc::new(StubCompletion::replying(
            r#"{"match_score": 70, "missing_skills": ["Go"], "summary": "fine"}"#,
        ));
        client(&stub)
            .score_match(&json!({"name": "Jane"}), &json!({"title": "Engineer"}))
            .await
            .unwrap();
        let prompts = stub.prompts();
        let prompt = &prompts[0];
        assert!(prompt.contains("Candidate Profile:\n{\n  \"name\": \"Jane\"\n}"));
        assert!(prompt.contains("Job Posting:\n{\n  \"title\": \"Engineer\"\n}"));
    }

    #[tokio::test]
    async fn test_cover_letter_missing_key() {
        let stub = Arc::new(StubCompletion::replying(r#"{"letter": "Dear..."}"#));
        let err = client(&stub)
            .draft_cover_letter(&json!({"name": "a"}), &json!({"title": "b"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::SchemaViolation {
                operation: "draft_cover_letter",
                key: "cover_letter"
            }
        ));
    }
}

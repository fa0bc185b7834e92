// Candidate/job matching and cover letters.
// Both go through the structured LLM client; only matches are persisted.

pub mod handlers;
pub mod service;

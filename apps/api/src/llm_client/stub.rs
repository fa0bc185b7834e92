//! Deterministic [`Completion`] used by tests in place of the remote model.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::{Completion, LlmError};

enum Reply {
    Text(String),
    Fail(String),
}

pub struct StubCompletion {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl StubCompletion {
    /// Answers every prompt with the same text.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Reply::Text(text.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call as an unreachable upstream.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Reply::Fail(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completion for StubCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(LlmError::Upstream(message.clone())),
        }
    }
}

use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::StructuredClient;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// PgStore when DATABASE_URL is set, MemoryStore otherwise.
    pub store: Arc<dyn Store>,
    pub llm: StructuredClient,
    pub config: Config,
}

#[cfg(test)]
impl AppState {
    /// State backed by an in-memory store and a canned completion.
    pub fn for_tests(completion: Arc<crate::llm_client::stub::StubCompletion>) -> Self {
        let config = Config::from_lookup(|key: &str| {
            (key == "GEMINI_API_KEY").then(|| "test-key".to_string())
        })
        .expect("test config");
        AppState {
            store: Arc::new(crate::store::MemoryStore::new()),
            llm: StructuredClient::new(completion),
            config,
        }
    }
}

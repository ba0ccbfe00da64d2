use std::sync::Arc;

use crate::llm_client::ChatCompletion;
use crate::meeting::sessions::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Chat-completion backend used by the note formatter. `LlmClient` in production.
    pub llm: Arc<dyn ChatCompletion>,
}

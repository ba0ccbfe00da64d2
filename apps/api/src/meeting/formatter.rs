//! Note formatter: one chat-completion call that rewrites raw notes into clean prose.
//!
//! Failures never escape as errors. They come back as `FormatOutcome::Failed`,
//! keeping the failure class for callers and a ready-to-show message.

use serde::Serialize;
use tracing::{info, warn};

use crate::llm_client::{ChatCompletion, ChatMessage, FailureKind, LlmError};
use crate::meeting::prompts::{FORMAT_NOTES_PROMPT, FORMAT_NOTES_SYSTEM};

/// Prepended to the failure description shown to the user.
pub const ERROR_PREFIX: &str = "An error occurred: ";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FormatOutcome {
    Formatted { text: String },
    Failed { kind: FailureKind, message: String },
}

impl FormatOutcome {
    /// The single string to display inline, whichever way the call went.
    pub fn display(&self) -> &str {
        match self {
            FormatOutcome::Formatted { text } => text,
            FormatOutcome::Failed { message, .. } => message,
        }
    }
}

impl From<Result<String, LlmError>> for FormatOutcome {
    fn from(result: Result<String, LlmError>) -> Self {
        match result {
            Ok(text) => FormatOutcome::Formatted { text },
            Err(e) => FormatOutcome::Failed {
                kind: e.kind(),
                message: format!("{ERROR_PREFIX}{e}"),
            },
        }
    }
}

/// System instruction first, then the notes embedded in the request template.
pub fn build_messages(notes: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(FORMAT_NOTES_SYSTEM),
        ChatMessage::user(FORMAT_NOTES_PROMPT.replace("{notes}", notes)),
    ]
}

/// Sends the notes for reformatting and returns the trimmed reply.
/// A reply that is empty once trimmed counts as a malformed response.
pub async fn format_notes(llm: &dyn ChatCompletion, notes: &str) -> Result<String, LlmError> {
    let reply = llm.complete(&build_messages(notes)).await?;
    let text = reply.trim();
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(text.to_string())
}

/// Runs `format_notes` and folds the result into a displayable outcome.
pub async fn format_notes_outcome(llm: &dyn ChatCompletion, notes: &str) -> FormatOutcome {
    info!("Formatting {} characters of notes", notes.chars().count());
    let result = format_notes(llm, notes).await;
    if let Err(e) = &result {
        warn!(kind = ?e.kind(), "Note formatting failed: {e}");
    }
    FormatOutcome::from(result)
}

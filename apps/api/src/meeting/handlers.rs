//! Axum route handlers for the meeting notes form.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::meeting::formatter::{format_notes_outcome, FormatOutcome};
use crate::meeting::models::{
    MeetingInfo, MeetingInfoUpdate, MeetingNotes, MeetingSession, NextMeetingPlan,
    NextMeetingUpdate,
};
use crate::meeting::summary::{build_summary, Summary, SAVED_MESSAGE};
use crate::meeting::tabs::{guide, section_view, Guide, SectionView, Tab};
use crate::state::AppState;

const EMPTY_NOTES_WARNING: &str = "Please enter notes first.";
const FORMATTED_NOTICE: &str = "Notes reformatted successfully!";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub session: MeetingSession,
    pub section: SectionView,
}

#[derive(Debug, Deserialize)]
pub struct SelectTabRequest {
    pub tab: Tab,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct FormatResponse {
    #[serde(flatten)]
    pub outcome: FormatOutcome,
    /// What to show inline: the formatted notes or the error message.
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub documents: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub message: &'static str,
    pub summary: Summary,
    pub markdown: String,
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn documents_of(session: &MeetingSession) -> DocumentsResponse {
    DocumentsResponse {
        documents: session
            .document_names()
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/guide
pub async fn handle_guide() -> Json<Guide> {
    Json(guide())
}

/// POST /api/v1/sessions
///
/// Opens a session with the Information tab selected and rendered.
pub async fn handle_open_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionResponse>) {
    let (session_id, session) = state.sessions.open(today()).await;
    info!(
        "Opened session {session_id} ({} open)",
        state.sessions.open_count().await
    );
    let section = section_view(&session, session.active_tab);
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            session,
            section,
        }),
    )
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.sessions.snapshot(id).await?;
    let section = section_view(&session, session.active_tab);
    Ok(Json(SessionResponse {
        session_id: id,
        session,
        section,
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.close(id).await {
        return Err(AppError::NotFound(format!("Session {id} not found")));
    }
    info!("Closed session {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/:id/tab
pub async fn handle_select_tab(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectTabRequest>,
) -> Result<Json<SectionView>, AppError> {
    let view = state
        .sessions
        .with_session(id, |s| {
            s.select_tab(request.tab);
            section_view(s, request.tab)
        })
        .await?;
    Ok(Json(view))
}

/// GET /api/v1/sessions/:id/section
///
/// Renders the active tab.
pub async fn handle_get_section(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SectionView>, AppError> {
    let view = state
        .sessions
        .with_session(id, |s| {
            let tab = s.active_tab;
            s.render(tab);
            section_view(s, tab)
        })
        .await?;
    Ok(Json(view))
}

/// PATCH /api/v1/sessions/:id/info
pub async fn handle_update_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<MeetingInfoUpdate>,
) -> Result<Json<MeetingInfo>, AppError> {
    let info = state
        .sessions
        .with_session(id, |s| s.update_info(update).map(|_| s.info.clone()))
        .await??;
    Ok(Json(info))
}

/// PUT /api/v1/sessions/:id/notes
pub async fn handle_set_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<NotesRequest>,
) -> Result<Json<MeetingNotes>, AppError> {
    let notes = state
        .sessions
        .with_session(id, |s| {
            s.set_notes(request.notes);
            s.notes.clone()
        })
        .await?;
    Ok(Json(notes))
}

/// POST /api/v1/sessions/:id/notes/format
///
/// Sends the session's notes to the LLM. Blank notes are rejected without a
/// remote call. Remote failures are reported in the body with status 200.
pub async fn handle_format_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormatResponse>, AppError> {
    let notes = state
        .sessions
        .with_session(id, |s| s.notes.for_formatting().map(String::from))
        .await?
        .ok_or_else(|| AppError::Validation(EMPTY_NOTES_WARNING.to_string()))?;

    // The session lock is released while the remote call is in flight.
    let outcome = format_notes_outcome(state.llm.as_ref(), &notes).await;

    let notice = match &outcome {
        FormatOutcome::Formatted { text } => {
            let text = text.clone();
            // Notes edited during the call make this result stale; it is
            // returned for display but not kept on the session.
            let stored = state
                .sessions
                .with_session(id, |s| {
                    if s.notes.raw.as_deref() == Some(notes.as_str()) {
                        s.set_formatted_notes(text);
                        true
                    } else {
                        false
                    }
                })
                .await?;
            if stored {
                Some(FORMATTED_NOTICE)
            } else {
                warn!("Notes changed while formatting session {id}; result not stored");
                None
            }
        }
        FormatOutcome::Failed { .. } => None,
    };

    Ok(Json(FormatResponse {
        display: outcome.display().to_string(),
        outcome,
        notice,
    }))
}

/// POST /api/v1/sessions/:id/documents
///
/// Accepts any number of file parts; they are appended in upload order.
pub async fn handle_upload_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<DocumentsResponse>, AppError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let Some(name) = field.file_name().map(String::from) else {
            continue;
        };
        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload '{name}': {e}")))?;
        uploads.push((name, content));
    }

    let received = uploads.len();
    let (response, held_bytes) = state
        .sessions
        .with_session(id, |s| {
            for (name, content) in uploads {
                s.add_document(name, content);
            }
            (documents_of(s), s.document_bytes())
        })
        .await?;

    info!("Session {id}: received {received} file(s), {held_bytes} bytes held");
    Ok(Json(response))
}

/// GET /api/v1/sessions/:id/documents
pub async fn handle_list_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let response = state.sessions.with_session(id, |s| documents_of(s)).await?;
    Ok(Json(response))
}

/// DELETE /api/v1/sessions/:id/documents
pub async fn handle_clear_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.with_session(id, |s| s.clear_documents()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/sessions/:id/next-meeting
pub async fn handle_update_next_meeting(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<NextMeetingUpdate>,
) -> Result<Json<NextMeetingPlan>, AppError> {
    let plan = state
        .sessions
        .with_session(id, |s| {
            s.update_next_meeting(update)
                .map(|_| s.next_meeting.clone())
        })
        .await??;
    Ok(Json(plan))
}

/// POST /api/v1/sessions/:id/save
///
/// Builds the recap of everything entered so far.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveResponse>, AppError> {
    let summary = state.sessions.with_session(id, |s| build_summary(s)).await?;
    info!("Session {id}: meeting saved");
    Ok(Json(SaveResponse {
        message: SAVED_MESSAGE,
        markdown: summary.to_markdown(),
        summary,
    }))
}

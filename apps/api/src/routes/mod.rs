pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::meeting::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/guide", get(handlers::handle_guide))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_close_session),
        )
        .route("/api/v1/sessions/:id/tab", put(handlers::handle_select_tab))
        .route(
            "/api/v1/sessions/:id/section",
            get(handlers::handle_get_section),
        )
        // Form sections
        .route(
            "/api/v1/sessions/:id/info",
            patch(handlers::handle_update_info),
        )
        .route("/api/v1/sessions/:id/notes", put(handlers::handle_set_notes))
        .route(
            "/api/v1/sessions/:id/notes/format",
            post(handlers::handle_format_notes),
        )
        .route(
            "/api/v1/sessions/:id/documents",
            post(handlers::handle_upload_documents)
                .get(handlers::handle_list_documents)
                .delete(handlers::handle_clear_documents),
        )
        .route(
            "/api/v1/sessions/:id/next-meeting",
            patch(handlers::handle_update_next_meeting),
        )
        .route("/api/v1/sessions/:id/save", post(handlers::handle_save))
        .with_state(state)
}

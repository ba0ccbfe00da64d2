//! Navigation tabs and section rendering.
//!
//! A section view describes the widgets of one tab together with their
//! current values, so a thin client can draw the form without knowing
//! the defaults or bounds itself.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::meeting::models::{
    MeetingSession, DURATION_STEP_HOURS, MAX_DURATION_HOURS, MIN_DURATION_HOURS,
    TIME_STEP_MINUTES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Info,
    Notes,
    Documents,
    NextMeeting,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Info, Tab::Notes, Tab::Documents, Tab::NextMeeting];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Info => "📌 Information",
            Tab::Notes => "📝 Notes",
            Tab::Documents => "📂 Documents",
            Tab::NextMeeting => "📅 Next meeting",
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            Tab::Info => "📌 Information",
            Tab::Notes => "📝 Note taking",
            Tab::Documents => "📂 Documents",
            Tab::NextMeeting => "📅 Next meeting",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sidebar guide
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TabEntry {
    pub id: Tab,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Guide {
    pub title: &'static str,
    pub prompt: &'static str,
    pub tabs: Vec<TabEntry>,
    pub instructions_heading: &'static str,
    pub instructions: Vec<&'static str>,
}

pub fn guide() -> Guide {
    Guide {
        title: "Navigation",
        prompt: "Choose a tab",
        tabs: Tab::ALL
            .iter()
            .map(|&id| TabEntry {
                id,
                label: id.label(),
            })
            .collect(),
        instructions_heading: "📝 How to use the app",
        instructions: vec![
            "Enter the general information in the Information tab.",
            "Add your notes in the Notes tab.",
            "Add files in Documents.",
            "Plan the next meeting in Next meeting.",
            "Save everything with the button at the bottom.",
        ],
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section views
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Date,
    Time,
    Number,
    Files,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl FieldView {
    fn new(key: &'static str, label: &'static str, kind: FieldKind, value: Value) -> Self {
        Self {
            key,
            label,
            kind,
            value,
            placeholder: None,
            min: None,
            max: None,
            step: None,
        }
    }

    fn placeholder(mut self, text: &'static str) -> Self {
        self.placeholder = Some(text);
        self
    }

    fn bounds(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }

    /// Time pickers step in seconds, like the browser widget expects.
    fn time_step(self) -> Self {
        let step = f64::from(TIME_STEP_MINUTES * 60);
        Self {
            step: Some(step),
            ..self
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActionView {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SectionView {
    pub tab: Tab,
    pub header: &'static str,
    pub fields: Vec<FieldView>,
    pub actions: Vec<ActionView>,
    /// Read-only lines shown under the widgets.
    pub lines: Vec<String>,
}

pub const SAVE_ACTION: ActionView = ActionView {
    id: "save",
    label: "✅ Save meeting",
};

pub fn section_view(session: &MeetingSession, tab: Tab) -> SectionView {
    let mut actions = Vec::new();
    let mut lines = Vec::new();

    let fields = match tab {
        Tab::Info => {
            let info = &session.info;
            vec![
                FieldView::new("title", "Meeting title", FieldKind::Text, json!(info.title))
                    .placeholder("Example: Marketing strategy meeting"),
                FieldView::new("date", "Meeting date:", FieldKind::Date, json!(info.date)),
                FieldView::new("time", "Meeting time:", FieldKind::Time, json!(info.time))
                    .time_step(),
                FieldView::new(
                    "participants",
                    "Participants",
                    FieldKind::TextArea,
                    json!(info.participants),
                )
                .placeholder("Example: Alexis, Claire, Marc..."),
            ]
        }
        Tab::Notes => {
            actions.push(ActionView {
                id: "format_notes",
                label: "📄 Format notes",
            });
            if let Some(formatted) = &session.notes.formatted {
                lines.push("### Formatted notes".to_string());
                lines.push(formatted.clone());
            }
            vec![FieldView::new(
                "notes",
                "Meeting notes",
                FieldKind::TextArea,
                json!(session.notes.raw),
            )
            .placeholder("Example: Discussion of objectives, decisions taken, etc.")]
        }
        Tab::Documents => {
            let names = session.document_names();
            if !names.is_empty() {
                lines.push("📄 Uploaded files:".to_string());
                lines.extend(names.iter().map(|n| format!("✅ {n}")));
            }
            vec![FieldView::new(
                "documents",
                "Drop your files here",
                FieldKind::Files,
                json!(names),
            )]
        }
        Tab::NextMeeting => {
            let next = &session.next_meeting;
            vec![
                FieldView::new(
                    "date",
                    "Next meeting date:",
                    FieldKind::Date,
                    json!(next.date),
                ),
                FieldView::new(
                    "time",
                    "Next meeting time:",
                    FieldKind::Time,
                    json!(next.time),
                )
                .time_step(),
                FieldView::new(
                    "duration",
                    "Next meeting duration (hours)",
                    FieldKind::Number,
                    json!(next.duration),
                )
                .bounds(MIN_DURATION_HOURS, MAX_DURATION_HOURS, DURATION_STEP_HOURS),
                FieldView::new(
                    "preparation",
                    "Preparation",
                    FieldKind::TextArea,
                    json!(next.preparation),
                )
                .placeholder("Example: Topics to cover, documents to prepare..."),
            ]
        }
    };

    actions.push(SAVE_ACTION);

    SectionView {
        tab,
        header: tab.header(),
        fields,
        actions,
        lines,
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use chrono::NaiveDate;

    use super::*;

    fn session() -> MeetingSession {
        MeetingSession::new(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap())
    }

    #[test]
    fn test_tab_ids_are_snake_case() {
        assert_eq!(json!(Tab::NextMeeting), json!("next_meeting"));
        let tab: Tab = serde_json::from_value(json!("documents")).unwrap();
        assert_eq!(tab, Tab::Documents);
    }

    #[test]
    fn test_guide_lists_all_tabs_in_order() {
        let g = guide();
        let ids: Vec<Tab> = g.tabs.iter().map(|t| t.id).collect();
        assert_eq!(ids, Tab::ALL.to_vec());
        assert_eq!(g.instructions.len(), 5);
    }

    #[test]
    fn test_info_section_shows_defaults() {
        let view = section_view(&session(), Tab::Info);
        assert_eq!(view.header, "📌 Information");
        let time = view.fields.iter().find(|f| f.key == "time").unwrap();
        assert_eq!(time.value, json!("10:00:00"));
        assert_eq!(time.step, Some(1800.0));
        let date = view.fields.iter().find(|f| f.key == "date").unwrap();
        assert_eq!(date.value, json!("2024-03-14"));
    }

    #[test]
    fn test_next_meeting_duration_has_bounds() {
        let mut s = session();
        s.select_tab(Tab::NextMeeting);
        let view = section_view(&s, Tab::NextMeeting);
        let duration = view.fields.iter().find(|f| f.key == "duration").unwrap();
        assert_eq!(duration.value, json!(1.0));
        assert_eq!(
            (duration.min, duration.max, duration.step),
            (Some(0.5), Some(8.0), Some(0.5))
        );
    }

    #[test]
    fn test_documents_section_lists_names_in_upload_order() {
        let mut s = session();
        s.add_document("agenda.pdf".into(), Bytes::from_static(b"1"));
        s.add_document("notes.txt".into(), Bytes::from_static(b"2"));
        let view = section_view(&s, Tab::Documents);
        assert_eq!(
            view.lines,
            vec!["📄 Uploaded files:", "✅ agenda.pdf", "✅ notes.txt"]
        );
    }

    #[test]
    fn test_notes_section_offers_format_action_and_result() {
        let mut s = session();
        s.select_tab(Tab::Notes);
        let view = section_view(&s, Tab::Notes);
        assert_eq!(view.actions[0].id, "format_notes");
        assert!(view.lines.is_empty());

        s.set_formatted_notes("Clean notes.".into());
        let view = section_view(&s, Tab::Notes);
        assert_eq!(view.lines, vec!["### Formatted notes", "Clean notes."]);
    }
}
